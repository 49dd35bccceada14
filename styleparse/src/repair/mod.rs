//! Schema repair: turns any JSON mapping into a valid [`AnalysisResult`].
//!
//! Repair never fails. Each field is coerced independently; a field that
//! cannot be coerced gets its configured default and a [`FieldRepair`] record,
//! and the remaining fields are unaffected.

pub mod matcher;

use serde_json::{Map, Value};

use crate::{
    config::{FieldDefaults, FALLBACK_CONFIDENCE},
    schema::{
        is_valid_confidence, round_confidence, AnalysisResult, ListField, CONFIDENCE_KEY,
        MEMO_ALIASES, MEMO_KEY,
    },
    value::{json_type_name, FieldRepair, RepairReason},
};
use matcher::FieldMatcher;

/// Output of a repair: the valid result and what had to change.
#[derive(Debug, Clone, PartialEq)]
pub struct Repaired {
    /// The schema-valid result.
    pub result: AnalysisResult,
    /// Field-level repairs, in schema order.
    pub repairs: Vec<FieldRepair>,
}

/// Field-level defaulting and clamping.
///
/// # Examples
///
/// ```
/// use styleparse::{config::FieldDefaults, repair::Repairer};
/// use serde_json::json;
///
/// let repairer = Repairer::new(FieldDefaults::default());
/// let mapping = json!({"core_style": ["cozy"], "confidence_score": 1.5});
/// let repaired = repairer.repair(mapping.as_object().unwrap());
///
/// assert_eq!(repaired.result.core_style, vec!["cozy"]);
/// assert_eq!(repaired.result.key_elements, vec!["Default element"]);
/// assert_eq!(repaired.result.confidence_score, 0.1);
/// ```
#[derive(Debug, Clone)]
pub struct Repairer {
    defaults: FieldDefaults,
    list_matchers: Vec<(ListField, FieldMatcher)>,
    confidence_matcher: FieldMatcher,
    memo_matcher: FieldMatcher,
}

impl Default for Repairer {
    fn default() -> Self {
        Self::new(FieldDefaults::default())
    }
}

impl Repairer {
    /// Creates a repairer with the given defaults.
    pub fn new(defaults: FieldDefaults) -> Self {
        let list_matchers = ListField::ALL
            .iter()
            .map(|field| (*field, FieldMatcher::new(field.key())))
            .collect();
        Self {
            defaults,
            list_matchers,
            confidence_matcher: FieldMatcher::new(CONFIDENCE_KEY),
            memo_matcher: FieldMatcher::new(MEMO_KEY).with_aliases(MEMO_ALIASES),
        }
    }

    /// Repairs a mapping into a schema-valid result.
    pub fn repair(&self, fields: &Map<String, Value>) -> Repaired {
        let mut repairs = Vec::new();

        let mut lists: Vec<Vec<String>> = Vec::with_capacity(ListField::ALL.len());
        for (field, matcher) in &self.list_matchers {
            let found = lookup(matcher, fields, &mut repairs);
            lists.push(self.repair_list(*field, found, &mut repairs));
        }

        let found = lookup(&self.confidence_matcher, fields, &mut repairs);
        let confidence_score = repair_confidence(found, &mut repairs);

        let found = lookup(&self.memo_matcher, fields, &mut repairs);
        let memo = self.repair_memo(found, &mut repairs);

        let mut lists = lists.into_iter();
        let mut next = || lists.next().unwrap_or_default();
        let result = AnalysisResult {
            core_style: next(),
            key_elements: next(),
            target_persona: next(),
            recommended_activities: next(),
            unsuitable_persona: next(),
            confidence_score,
            memo,
        };

        if !repairs.is_empty() {
            tracing::debug!(repairs = repairs.len(), "Repaired candidate fields");
        }

        Repaired { result, repairs }
    }

    fn repair_list(
        &self,
        field: ListField,
        value: Option<&Value>,
        repairs: &mut Vec<FieldRepair>,
    ) -> Vec<String> {
        let key = field.key();
        let default = || vec![self.defaults.list_default(field).to_string()];

        let items = match value {
            None => {
                repairs.push(FieldRepair::new(key, RepairReason::Missing));
                return default();
            }
            Some(Value::Array(items)) => items,
            Some(other) => {
                repairs.push(FieldRepair::new(
                    key,
                    RepairReason::WrongType {
                        found: json_type_name(other),
                    },
                ));
                return default();
            }
        };

        let kept: Vec<String> = items.iter().filter_map(list_item).collect();
        let dropped = items.len() - kept.len();

        if kept.is_empty() {
            repairs.push(FieldRepair::new(key, RepairReason::EmptyList));
            return default();
        }
        if dropped > 0 {
            repairs.push(FieldRepair::new(key, RepairReason::DroppedItems { count: dropped }));
        }
        kept
    }

    fn repair_memo(&self, value: Option<&Value>, repairs: &mut Vec<FieldRepair>) -> String {
        match value {
            Some(Value::String(memo)) => memo.clone(),
            Some(other) => {
                repairs.push(FieldRepair::new(
                    MEMO_KEY,
                    RepairReason::WrongType {
                        found: json_type_name(other),
                    },
                ));
                self.defaults.memo.clone()
            }
            None => {
                repairs.push(FieldRepair::new(MEMO_KEY, RepairReason::Missing));
                self.defaults.memo.clone()
            }
        }
    }
}

/// Finds a field and records a rename when the model used another key.
fn lookup<'a>(
    matcher: &FieldMatcher,
    fields: &'a Map<String, Value>,
    repairs: &mut Vec<FieldRepair>,
) -> Option<&'a Value> {
    let (key, value) = matcher.find_in_object(fields)?;
    if key != matcher.expected {
        repairs.push(FieldRepair::new(
            matcher.expected,
            RepairReason::KeyRenamed { from: key.clone() },
        ));
    }
    Some(value)
}

/// Keeps non-blank strings (trimmed) and stringifies scalars.
fn list_item(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn repair_confidence(value: Option<&Value>, repairs: &mut Vec<FieldRepair>) -> f64 {
    let not_numeric = |v: &Value, repairs: &mut Vec<FieldRepair>| {
        repairs.push(FieldRepair::new(
            CONFIDENCE_KEY,
            RepairReason::NotNumeric {
                original: v.to_string(),
            },
        ));
        FALLBACK_CONFIDENCE
    };

    let score = match value {
        None => {
            repairs.push(FieldRepair::new(CONFIDENCE_KEY, RepairReason::Missing));
            return FALLBACK_CONFIDENCE;
        }
        Some(Value::Number(n)) => match n.as_f64() {
            Some(score) => score,
            None => return not_numeric(&Value::Number(n.clone()), repairs),
        },
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(score) => {
                repairs.push(FieldRepair::new(
                    CONFIDENCE_KEY,
                    RepairReason::StringToNumber { original: s.clone() },
                ));
                score
            }
            Err(_) => return not_numeric(&Value::String(s.clone()), repairs),
        },
        Some(other) => return not_numeric(other, repairs),
    };

    if !is_valid_confidence(score) {
        repairs.push(FieldRepair::new(
            CONFIDENCE_KEY,
            RepairReason::OutOfRange { original: score },
        ));
        return FALLBACK_CONFIDENCE;
    }
    round_confidence(score)
}
