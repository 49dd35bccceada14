//! Extraction of candidate mappings from model text.
//!
//! [`JsonExtractor`] runs the strategy ladder; [`FreeTextExtractor`] is the
//! keyword scanner used when no JSON object can be found.

pub mod free_text;
pub mod strategies;

pub use free_text::FreeTextExtractor;
use strategies::{
    CodeFenceStrategy, DirectJsonStrategy, ExtractionStrategy, GreedySpanStrategy, NestedBracesStrategy,
    NormalizedSpanStrategy, OuterSpanStrategy,
};

use crate::{
    error::{ExtractionError, StrategyError},
    value::RawCandidate,
};

/// Maximum size of input to scan (1MB).
pub const MAX_INPUT_SIZE: usize = 1024 * 1024;

/// Locates and parses an embedded JSON object using an ordered strategy ladder.
///
/// Strategies run in priority order and the first object that strictly
/// decodes wins. Candidates are never scored against each other.
///
/// # Examples
///
/// ```
/// use styleparse::parser::JsonExtractor;
///
/// let extractor = JsonExtractor::default();
/// let candidate = extractor
///     .extract("Sure! {\"core_style\": [\"Nordic\"]} Enjoy.")
///     .unwrap();
/// assert!(candidate.fields.contains_key("core_style"));
///
/// assert!(extractor.extract("no json here").is_none());
/// ```
#[derive(Debug)]
pub struct JsonExtractor {
    /// Strategies in priority order.
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl Default for JsonExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonExtractor {
    /// Creates an extractor with the default ladder, after a whole-input
    /// `direct_json` pass:
    /// 1. `code_fence` - fenced block, optionally tagged `json`
    /// 2. `nested_braces` - objects with one level of nesting
    /// 3. `greedy_span` - greedy `{.*}` match
    /// 4. `outer_span` - first `{` to last `}`
    /// 5. `normalized_span` - fences stripped and whitespace collapsed
    pub fn new() -> Self {
        Self::with_strategies(vec![
            Box::new(DirectJsonStrategy),
            Box::new(CodeFenceStrategy),
            Box::new(NestedBracesStrategy),
            Box::new(GreedySpanStrategy),
            Box::new(OuterSpanStrategy),
            Box::new(NormalizedSpanStrategy),
        ])
    }

    /// Creates an extractor with custom strategies, sorted by priority.
    pub fn with_strategies(mut strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        strategies.sort_by_key(|s| s.priority());
        Self { strategies }
    }

    /// Names of the strategies in the order they run.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Returns the first object any strategy finds, or `None`.
    ///
    /// Inputs longer than [`MAX_INPUT_SIZE`] bytes are not scanned and return
    /// `None` even when they are valid JSON; the pipeline then hands them to
    /// the keyword scanner.
    #[inline]
    pub fn extract(&self, input: &str) -> Option<RawCandidate> {
        self.try_extract(input).ok()
    }

    /// Like [`extract`](Self::extract), but reports why every strategy failed.
    pub fn try_extract(&self, input: &str) -> Result<RawCandidate, ExtractionError> {
        if input.len() > MAX_INPUT_SIZE {
            return Err(ExtractionError::InputTooLarge {
                len: input.len(),
                limit: MAX_INPUT_SIZE,
            });
        }

        let mut attempts = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            match strategy.extract(input) {
                Ok(fields) => {
                    tracing::debug!(
                        strategy = strategy.name(),
                        keys = fields.len(),
                        "Extracted JSON object"
                    );
                    return Ok(RawCandidate::extracted(fields, strategy.name()));
                }
                Err(miss) => {
                    tracing::debug!(strategy = strategy.name(), error = %miss, "Strategy missed");
                    attempts.push(StrategyError::new(strategy.name(), miss.to_string()));
                }
            }
        }

        Err(ExtractionError::AllStrategiesFailed { attempts })
    }
}
