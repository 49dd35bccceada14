//! Markdown code fence strategy.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{first_object, ExtractionStrategy, JsonObject, StrategyMiss};

static FENCED_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("Invalid code fence regex pattern")
});

/// Strategy that extracts an object wrapped in a code fence.
///
/// Matches ` ```json {...} ``` ` and untagged ` ``` {...} ``` ` blocks. Blocks
/// are tried left to right.
///
/// # Examples
///
/// ```
/// use styleparse::parser::strategies::{CodeFenceStrategy, ExtractionStrategy};
///
/// let input = "Here you go:\n```json\n{\"core_style\": [\"cozy\"]}\n```";
/// let map = CodeFenceStrategy.extract(input).unwrap();
/// assert!(map.contains_key("core_style"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeFenceStrategy;

impl ExtractionStrategy for CodeFenceStrategy {
    #[inline]
    fn name(&self) -> &'static str {
        "code_fence"
    }

    fn extract(&self, input: &str) -> Result<JsonObject, StrategyMiss> {
        let spans = FENCED_OBJECT
            .captures_iter(input)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str());
        first_object(spans)
    }

    #[inline]
    fn priority(&self) -> u8 {
        1
    }
}
