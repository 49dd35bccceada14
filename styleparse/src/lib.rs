//! # styleparse
//!
//! Recovers a schema-valid style analysis from unreliable LLM output.
//!
//! A model asked for JSON does not always return it. This crate turns whatever
//! came back into an [`AnalysisResult`](schema::AnalysisResult) whose list
//! fields are non-empty and whose confidence is in `[0.0, 1.0]`:
//! - Structured attempts with a bounded retry budget
//! - A raw-text call when the budget is spent
//! - A ladder of JSON extraction strategies (code fences, brace scans, spans)
//! - Field-level repair with per-field defaults
//! - A keyword scan when no JSON can be found
//! - A deterministic low-confidence fallback
//!
//! ## Quick Start
//!
//! ```rust
//! use styleparse::{extract, repair};
//!
//! let response = "Here you go:\n```json\n{\"core_style\": [\"cozy\"], \"confidence_score\": 1.5}\n```";
//!
//! let candidate = extract(response).unwrap();
//! let result = repair(&candidate.fields);
//!
//! assert_eq!(result.core_style, vec!["cozy"]);
//! assert_eq!(result.key_elements, vec!["Default element"]);
//! assert_eq!(result.confidence_score, 0.1);
//! ```
//!
//! ## Full Pipeline
//!
//! Implement [`Generator`](recovery::Generator) for your model client and hand
//! it to a [`RecoveryController`](recovery::RecoveryController). The
//! controller never fails except when the fallback itself breaks the schema,
//! which only a misconfigured set of defaults can cause.

pub mod config;
pub mod error;
pub mod fallback;
pub mod parser;
pub mod recovery;
pub mod repair;
pub mod response;
pub mod schema;
pub mod structured;
pub mod tracing_init;
pub mod value;

use serde_json::{Map, Value};

use parser::JsonExtractor;
use repair::Repairer;
use schema::AnalysisResult;
use value::RawCandidate;

/// Finds the first embedded JSON object in `text` using the default ladder.
///
/// Returns `None` if no strategy decodes an object, and for inputs above
/// [`MAX_INPUT_SIZE`](parser::MAX_INPUT_SIZE) bytes, which are not scanned.
///
/// # Examples
///
/// ```
/// use styleparse::extract;
///
/// assert!(extract(r#"Sure! {"core_style": ["Loft"]}"#).is_some());
/// assert!(extract("A calm, bright cabin.").is_none());
/// ```
pub fn extract(text: &str) -> Option<RawCandidate> {
    JsonExtractor::new().extract(text)
}

/// Repairs a mapping into a valid result using the default field values.
///
/// # Examples
///
/// ```
/// use styleparse::repair;
///
/// let result = repair(&serde_json::Map::new());
/// assert!(result.check().is_ok());
/// ```
pub fn repair(fields: &Map<String, Value>) -> AnalysisResult {
    Repairer::default().repair(fields).result
}
