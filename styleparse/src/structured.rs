//! Schema-aware parser used by structured attempts.
//!
//! Unlike the repair path, this parser is strict: anything short of a complete,
//! well-typed, in-range object is an error and costs the controller a retry.

use serde_json::Value;

use crate::{
    error::StructuredParseError,
    schema::{round_confidence, AnalysisResult, ListField, CONFIDENCE_KEY, MEMO_ALIASES, MEMO_KEY},
    value::json_type_name,
};

/// Strict parser for structured responses.
///
/// # Examples
///
/// ```
/// use styleparse::structured::StructuredParser;
///
/// let text = r#"{
///     "core_style": ["Nordic"],
///     "key_elements": ["Wood"],
///     "target_persona": ["Couples"],
///     "recommended_activities": ["Sauna"],
///     "unsuitable_persona": ["Large groups"],
///     "confidence_score": 0.904,
///     "memo": "Calm and bright."
/// }"#;
/// let result = StructuredParser.parse(text).unwrap();
/// assert_eq!(result.confidence_score, 0.9);
///
/// assert!(StructuredParser.parse(r#"{"core_style": ["Nordic"]}"#).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredParser;

impl StructuredParser {
    /// Parses a complete analysis, optionally wrapped in one code fence.
    pub fn parse(&self, text: &str) -> Result<AnalysisResult, StructuredParseError> {
        let mut value: Value = serde_json::from_str(strip_fence(text))?;

        let fields = match &mut value {
            Value::Object(fields) => fields,
            other => {
                return Err(StructuredParseError::invalid(
                    "response",
                    format!("expected an object, found {}", json_type_name(other)),
                ))
            }
        };

        for field in ListField::ALL {
            if !fields.contains_key(field.key()) {
                return Err(StructuredParseError::MissingField { field: field.key() });
            }
        }
        if !fields.contains_key(CONFIDENCE_KEY) {
            return Err(StructuredParseError::MissingField {
                field: CONFIDENCE_KEY,
            });
        }
        let has_memo = std::iter::once(MEMO_KEY)
            .chain(MEMO_ALIASES.iter().copied())
            .any(|key| fields.contains_key(key));
        if !has_memo {
            return Err(StructuredParseError::MissingField { field: MEMO_KEY });
        }
        // `memo` wins over legacy keys
        if fields.contains_key(MEMO_KEY) {
            for alias in MEMO_ALIASES {
                fields.remove(*alias);
            }
        }

        let mut result: AnalysisResult = serde_json::from_value(value)?;

        result.check().map_err(|violation| {
            StructuredParseError::invalid(violation.field(), violation.to_string())
        })?;
        result.confidence_score = round_confidence(result.confidence_score);

        Ok(result)
    }
}

/// Removes one surrounding code fence, if the whole text is fenced.
fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = inner.strip_suffix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim()
}
