//! Normalization retry strategy.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{outer_brace_span, parse_object, ExtractionStrategy, JsonObject, StrategyMiss};

static FENCE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?").expect("Invalid fence marker regex pattern"));

/// Strategy that strips fence markers and collapses whitespace before taking
/// the outer brace span.
///
/// Collapsing turns raw line breaks inside string values into spaces, which
/// makes otherwise rejected control characters decodable.
///
/// # Examples
///
/// ```
/// use styleparse::parser::strategies::{ExtractionStrategy, NormalizedSpanStrategy};
///
/// let input = "{\"memo\": \"line one\nline two\"}";
/// let map = NormalizedSpanStrategy.extract(input).unwrap();
/// assert_eq!(map["memo"], "line one line two");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedSpanStrategy;

impl NormalizedSpanStrategy {
    /// Removes fence markers and collapses whitespace runs to one space.
    pub fn normalize(input: &str) -> String {
        let without_fences = FENCE_MARKER.replace_all(input, " ");
        without_fences.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

impl ExtractionStrategy for NormalizedSpanStrategy {
    #[inline]
    fn name(&self) -> &'static str {
        "normalized_span"
    }

    fn extract(&self, input: &str) -> Result<JsonObject, StrategyMiss> {
        let normalized = Self::normalize(input);
        let span = outer_brace_span(&normalized).ok_or(StrategyMiss::NoCandidate)?;
        parse_object(span)
    }

    #[inline]
    fn priority(&self) -> u8 {
        5
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(
            NormalizedSpanStrategy::normalize("```json\n{ \"a\":\t1 }\n```"),
            "{ \"a\": 1 }"
        );
    }

    #[test]
    fn test_raw_newline_inside_string() {
        let input = "```json\n{\"core_style\": [\"Warm\nminimal\"]}";
        let map = NormalizedSpanStrategy.extract(input).unwrap();
        assert_eq!(Value::Object(map), json!({"core_style": ["Warm minimal"]}));
    }

    #[test]
    fn test_still_broken_json() {
        assert!(matches!(
            NormalizedSpanStrategy.extract("{core_style: cozy}").unwrap_err(),
            StrategyMiss::Json(_)
        ));
    }
}
