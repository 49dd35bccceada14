//! Intermediate candidate values and repair records.

use serde::Serialize;
use serde_json::{Map, Value};

/// An untyped mapping recovered from model text, with its provenance.
///
/// Keys may be missing, extra or mistyped. A candidate lives only for the
/// pipeline run that produced it and is consumed by the repairer.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCandidate {
    /// The recovered JSON object.
    pub fields: Map<String, Value>,
    /// How the object was obtained.
    pub source: CandidateSource,
}

impl RawCandidate {
    /// Creates a new candidate.
    #[inline]
    pub fn new(fields: Map<String, Value>, source: CandidateSource) -> Self {
        Self { fields, source }
    }

    /// Creates a candidate found by a JSON extraction strategy.
    #[inline]
    pub fn extracted(fields: Map<String, Value>, strategy: &'static str) -> Self {
        Self::new(fields, CandidateSource::Extracted { strategy })
    }

    /// Creates a candidate built by the keyword scanner.
    #[inline]
    pub fn scanned(fields: Map<String, Value>) -> Self {
        Self::new(fields, CandidateSource::FreeText)
    }

    /// Returns true if the candidate has no keys at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Describes how a candidate was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CandidateSource {
    /// Parsed from an embedded JSON object.
    Extracted {
        /// Name of the winning extraction strategy.
        strategy: &'static str,
    },

    /// Assembled by the keyword scanner from free text.
    FreeText,
}

/// Why a field had to be repaired.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RepairReason {
    /// Key absent; the default was inserted.
    Missing,

    /// Value had the wrong JSON type; the default was inserted.
    WrongType {
        /// JSON type that was found.
        found: &'static str,
    },

    /// List had no usable entries; the default was inserted.
    EmptyList,

    /// Some list items were not strings and could not be kept.
    DroppedItems {
        /// Number of dropped items.
        count: usize,
    },

    /// Confidence was not a number; replaced by the fallback score.
    NotNumeric {
        /// The offending value, rendered as JSON.
        original: String,
    },

    /// Confidence was outside `[0.0, 1.0]`; replaced by the fallback score.
    OutOfRange {
        /// The offending score.
        original: f64,
    },

    /// Confidence was given as a numeric string and converted.
    StringToNumber {
        /// The original string.
        original: String,
    },

    /// Value was found under a different key.
    KeyRenamed {
        /// The key the model used.
        from: String,
    },
}

/// One field-level repair applied to a candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRepair {
    /// Canonical field name.
    pub field: &'static str,
    /// What was wrong.
    #[serde(flatten)]
    pub reason: RepairReason,
}

impl FieldRepair {
    /// Creates a new repair record.
    #[inline]
    pub fn new(field: &'static str, reason: RepairReason) -> Self {
        Self { field, reason }
    }

    /// Returns true if the field's value was replaced by its default.
    #[inline]
    pub fn is_defaulted(&self) -> bool {
        matches!(
            self.reason,
            RepairReason::Missing
                | RepairReason::WrongType { .. }
                | RepairReason::EmptyList
                | RepairReason::NotNumeric { .. }
                | RepairReason::OutOfRange { .. }
        )
    }
}

/// Returns the JSON type name of a value.
#[inline]
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
