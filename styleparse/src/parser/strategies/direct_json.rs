//! Direct JSON parsing strategy.

use super::{parse_object, ExtractionStrategy, JsonObject, StrategyMiss};

/// Strategy that decodes the whole (trimmed) input as one JSON object.
///
/// Runs before the span-based ladder so that well-formed responses come back
/// exactly as sent, however deeply they nest.
///
/// # Examples
///
/// ```
/// use styleparse::parser::strategies::{DirectJsonStrategy, ExtractionStrategy};
///
/// let map = DirectJsonStrategy.extract(r#" {"a": {"b": {"c": 1}}} "#).unwrap();
/// assert!(map.contains_key("a"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectJsonStrategy;

impl ExtractionStrategy for DirectJsonStrategy {
    #[inline]
    fn name(&self) -> &'static str {
        "direct_json"
    }

    fn extract(&self, input: &str) -> Result<JsonObject, StrategyMiss> {
        let trimmed = input.trim();
        // Fast path: anything else cannot be a bare object
        if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
            return Err(StrategyMiss::NoCandidate);
        }
        parse_object(trimmed)
    }

    #[inline]
    fn priority(&self) -> u8 {
        0
    }
}
