//! Brace-balanced scan allowing one level of nesting.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{first_object, ExtractionStrategy, JsonObject, StrategyMiss};

// Outer object whose members may contain flat `{...}` objects, no deeper.
static ONE_LEVEL_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}").expect("Invalid nested brace regex pattern")
});

/// Strategy that scans for `{...}` objects nested at most one level deep.
///
/// Every match is tried left to right; the first that decodes wins. Deeper
/// objects are not matched whole, so their innermost pieces are tried instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct NestedBracesStrategy;

impl ExtractionStrategy for NestedBracesStrategy {
    #[inline]
    fn name(&self) -> &'static str {
        "nested_braces"
    }

    fn extract(&self, input: &str) -> Result<JsonObject, StrategyMiss> {
        first_object(ONE_LEVEL_OBJECT.find_iter(input).map(|m| m.as_str()))
    }

    #[inline]
    fn priority(&self) -> u8 {
        2
    }
}
