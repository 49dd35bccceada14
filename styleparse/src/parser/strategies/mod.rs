//! Extraction strategies for locating a JSON object in model text.
//!
//! Each strategy is a pure function of the input text. The
//! [`JsonExtractor`](super::JsonExtractor) runs them in priority order and
//! takes the first object that strictly decodes.

mod code_fence;
mod direct_json;
mod greedy_span;
mod nested_braces;
mod normalized_span;
mod outer_span;

pub use code_fence::CodeFenceStrategy;
pub use direct_json::DirectJsonStrategy;
pub use greedy_span::GreedySpanStrategy;
pub use nested_braces::NestedBracesStrategy;
pub use normalized_span::NormalizedSpanStrategy;
pub use outer_span::OuterSpanStrategy;

use serde_json::{Map, Value};

use crate::value::json_type_name;

/// Object produced by a successful strategy.
pub type JsonObject = Map<String, Value>;

/// Why a strategy did not produce an object.
#[derive(Debug, thiserror::Error)]
pub enum StrategyMiss {
    /// The strategy found nothing to parse.
    #[error("no candidate span")]
    NoCandidate,

    /// A candidate span did not decode as JSON.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// A candidate decoded, but not to an object.
    #[error("decoded a JSON {0}, expected an object")]
    NotObject(&'static str),
}

/// Trait for strategies that pull a JSON object out of text.
pub trait ExtractionStrategy: Send + Sync + std::fmt::Debug {
    /// Returns the name of this strategy for diagnostics.
    fn name(&self) -> &'static str;

    /// Attempts to extract an object from the input.
    ///
    /// For strategies with several candidate spans, the first span that
    /// decodes wins and the error reported is that of the last span tried.
    fn extract(&self, input: &str) -> Result<JsonObject, StrategyMiss>;

    /// Returns the priority of this strategy. Lower values are tried first.
    fn priority(&self) -> u8;
}

/// Strictly decodes `slice` and requires a JSON object.
pub(crate) fn parse_object(slice: &str) -> Result<JsonObject, StrategyMiss> {
    match serde_json::from_str::<Value>(slice)? {
        Value::Object(map) => Ok(map),
        other => Err(StrategyMiss::NotObject(json_type_name(&other))),
    }
}

/// Returns the slice from the first `{` to the last `}`, inclusive.
pub(crate) fn outer_brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Tries each span in order and returns the first that decodes to an object.
pub(crate) fn first_object<'a>(
    spans: impl Iterator<Item = &'a str>,
) -> Result<JsonObject, StrategyMiss> {
    let mut last = StrategyMiss::NoCandidate;
    for span in spans {
        match parse_object(span) {
            Ok(map) => return Ok(map),
            Err(miss) => last = miss,
        }
    }
    Err(last)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_object_rejects_arrays() {
        let err = parse_object("[1, 2]").unwrap_err();
        assert!(matches!(err, StrategyMiss::NotObject("array")));
    }

    #[test]
    fn test_parse_object_accepts_object() {
        let map = parse_object(r#"{"a": 1}"#).unwrap();
        assert_eq!(Value::Object(map), json!({"a": 1}));
    }

    #[test]
    fn test_outer_brace_span() {
        assert_eq!(outer_brace_span("x {a} y {b} z"), Some("{a} y {b}"));
        assert_eq!(outer_brace_span("} backwards {"), None);
        assert_eq!(outer_brace_span("no braces"), None);
    }

    #[test]
    fn test_first_object_keeps_last_error() {
        let err = first_object(["{bad", "[1]"].into_iter()).unwrap_err();
        assert!(matches!(err, StrategyMiss::NotObject(_)));

        let err = first_object(std::iter::empty()).unwrap_err();
        assert!(matches!(err, StrategyMiss::NoCandidate));
    }

    #[test]
    fn test_priorities_are_distinct_and_ordered() {
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(DirectJsonStrategy),
            Box::new(CodeFenceStrategy),
            Box::new(NestedBracesStrategy),
            Box::new(GreedySpanStrategy),
            Box::new(OuterSpanStrategy),
            Box::new(NormalizedSpanStrategy),
        ];
        let priorities: Vec<u8> = strategies.iter().map(|s| s.priority()).collect();
        assert_eq!(priorities, vec![0, 1, 2, 3, 4, 5]);
    }
}
