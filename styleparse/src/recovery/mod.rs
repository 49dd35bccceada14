//! The recovery controller.
//!
//! [`RecoveryController`] drives the [`Stage`] machine for one request at a
//! time per call: structured attempts with a retry budget, then a raw call
//! whose text is escalated through extraction, repair, keyword scanning and
//! the fallback. It never panics and never surfaces an intermediate error.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use styleparse::{
//!     config::RecoveryConfig,
//!     recovery::{GenerationRequest, RecoveryController, ReplayGenerator, Tier},
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let response = "Here you go:\n```json\n{\"core_style\": [\"cozy\"], \"confidence_score\": 1.5}\n```";
//! let controller = RecoveryController::new(
//!     Arc::new(ReplayGenerator::new(response)),
//!     RecoveryConfig::default(),
//! );
//!
//! let resolution = controller
//!     .analyze(&GenerationRequest::new("Analyze these images"))
//!     .await
//!     .unwrap();
//! assert_eq!(resolution.result.core_style, vec!["cozy"]);
//! assert_eq!(resolution.result.confidence_score, 0.1);
//! assert_eq!(resolution.tier, Tier::JsonExtraction { strategy: "code_fence" });
//! # }
//! ```

mod generator;
mod machine;
pub mod observer;

use std::sync::Arc;

pub use generator::{CallShape, GenerationRequest, Generator, ReplayGenerator};
pub use machine::{Outcome, Resolution, Stage, Tier, Tiers, RAW_FAILURE_MARKER};
use observer::{preview, PipelineEvent, PipelineObserver, TracingObserver};
use uuid::Uuid;

use crate::{
    config::RecoveryConfig,
    error::{AttemptError, GenerationError},
    schema::AnalysisResult,
    structured::StructuredParser,
};

/// Orchestrates structured attempts and the escalation tiers.
///
/// Holds only immutable state, so one controller can serve concurrent runs
/// behind an `Arc`.
pub struct RecoveryController {
    generator: Arc<dyn Generator>,
    observer: Arc<dyn PipelineObserver>,
    parser: StructuredParser,
    tiers: Tiers,
    config: RecoveryConfig,
}

impl RecoveryController {
    /// Creates a controller that reports to `tracing`.
    pub fn new(generator: Arc<dyn Generator>, config: RecoveryConfig) -> Self {
        Self {
            generator,
            observer: Arc::new(TracingObserver),
            parser: StructuredParser,
            tiers: Tiers::new(&config),
            config,
        }
    }

    /// Replaces the diagnostic observer.
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the offline tiers.
    #[inline]
    pub fn tiers(&self) -> &Tiers {
        &self.tiers
    }

    /// Runs the pipeline with the configured retry budget.
    pub async fn analyze(&self, request: &GenerationRequest) -> Outcome {
        self.resolve(request, self.config.max_retries).await
    }

    /// Runs the pipeline with `max_retries` structured retries
    /// (`max_retries + 1` attempts in total).
    pub async fn resolve(&self, request: &GenerationRequest, max_retries: u32) -> Outcome {
        let run = RecoveryRun::new(self.observer.as_ref(), self.config.preview_chars);
        let mut stage = Stage::start();
        let mut attempt = 1;
        run.record(&stage, attempt, None);

        loop {
            let mut error = None;
            stage = match stage {
                Stage::Structured { attempt: n } => {
                    let outcome = self.structured_attempt(request).await;
                    error = describe(&outcome);
                    self.tiers.after_structured(n, max_retries, outcome)
                }
                Stage::RawRecovery => {
                    let outcome = self.call(request, CallShape::Raw).await;
                    error = describe(&outcome);
                    self.tiers.after_raw(outcome)
                }
                Stage::JsonExtraction { raw_text } => self.tiers.json_extraction(raw_text),
                Stage::Repair {
                    candidate,
                    raw_text,
                } => self.tiers.repair(candidate, raw_text),
                Stage::HeuristicExtraction { raw_text } => self.tiers.heuristic_extraction(raw_text),
                Stage::Fallback { raw_text } => self.tiers.fallback(raw_text),
                Stage::Done(outcome) => return outcome,
            };
            if let Stage::Structured { attempt: n } = stage {
                attempt = n;
            }
            run.record(&stage, attempt, error);
        }
    }

    /// One structured attempt: generation followed by the strict parser.
    async fn structured_attempt(
        &self,
        request: &GenerationRequest,
    ) -> Result<AnalysisResult, AttemptError> {
        let text = self.call(request, CallShape::Structured).await?;
        Ok(self.parser.parse(&text)?)
    }

    /// One generation call bounded by the per-call timeout.
    async fn call(
        &self,
        request: &GenerationRequest,
        shape: CallShape,
    ) -> Result<String, GenerationError> {
        let limit = self.config.call_timeout();
        match tokio::time::timeout(limit, self.generator.generate(request, shape)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(GenerationError::Timeout(limit)),
        }
    }
}

/// Per-run diagnostic state.
struct RecoveryRun<'a> {
    id: Uuid,
    observer: &'a dyn PipelineObserver,
    preview_chars: usize,
}

impl<'a> RecoveryRun<'a> {
    fn new(observer: &'a dyn PipelineObserver, preview_chars: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            observer,
            preview_chars,
        }
    }

    fn record(&self, stage: &Stage, attempt: u32, error: Option<String>) {
        self.observer.on_event(&PipelineEvent {
            request_id: self.id,
            timestamp: chrono::Utc::now(),
            attempt,
            stage: stage.kind(),
            preview: stage.text().map(|text| preview(text, self.preview_chars)),
            error,
        });
    }
}

fn describe<T, E: std::fmt::Display>(outcome: &Result<T, E>) -> Option<String> {
    outcome.as_ref().err().map(ToString::to_string)
}
