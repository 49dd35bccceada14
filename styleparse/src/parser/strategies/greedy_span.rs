//! Greedy regex span strategy.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{parse_object, ExtractionStrategy, JsonObject, StrategyMiss};

static GREEDY_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("Invalid greedy span regex pattern"));

/// Strategy that takes the greedy `{.*}` match across the whole text.
///
/// Catches objects nested deeper than [`NestedBracesStrategy`] can balance.
///
/// [`NestedBracesStrategy`]: super::NestedBracesStrategy
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedySpanStrategy;

impl ExtractionStrategy for GreedySpanStrategy {
    #[inline]
    fn name(&self) -> &'static str {
        "greedy_span"
    }

    fn extract(&self, input: &str) -> Result<JsonObject, StrategyMiss> {
        let span = GREEDY_OBJECT.find(input).ok_or(StrategyMiss::NoCandidate)?;
        parse_object(span.as_str())
    }

    #[inline]
    fn priority(&self) -> u8 {
        3
    }
}
