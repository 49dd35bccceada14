//! First-brace to last-brace slice strategy.

use super::{outer_brace_span, parse_object, ExtractionStrategy, JsonObject, StrategyMiss};

/// Strategy that slices from the first `{` to the last `}` by index search,
/// ignoring any fence markers around it.
#[derive(Debug, Clone, Copy, Default)]
pub struct OuterSpanStrategy;

impl ExtractionStrategy for OuterSpanStrategy {
    #[inline]
    fn name(&self) -> &'static str {
        "outer_span"
    }

    fn extract(&self, input: &str) -> Result<JsonObject, StrategyMiss> {
        let span = outer_brace_span(input).ok_or(StrategyMiss::NoCandidate)?;
        parse_object(span)
    }

    #[inline]
    fn priority(&self) -> u8 {
        4
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    #[test]
    fn test_unclosed_fence_around_object() {
        let input = "```json\n{\"core_style\": [\"Boho\"], \"x\": {\"y\": {\"z\": 1}}}";
        let map = OuterSpanStrategy.extract(input).unwrap();
        assert_eq!(
            Value::Object(map),
            json!({"core_style": ["Boho"], "x": {"y": {"z": 1}}})
        );
    }

    #[test]
    fn test_reversed_braces() {
        assert!(matches!(
            OuterSpanStrategy.extract("} nothing {").unwrap_err(),
            StrategyMiss::NoCandidate
        ));
    }
}
