//! The escalation state machine.
//!
//! Each [`Stage`] has one transition function on [`Tiers`]. The two network
//! stages take the outcome of their generation call as input, so every
//! transition is a plain function that can be tested without a generator. The
//! async driver lives in [`RecoveryController`](super::RecoveryController).
//!
//! ```text
//! Structured(n) --ok--> Done
//!      |  fail, n <= max_retries --> Structured(n + 1)
//!      v  fail, budget spent
//! RawRecovery --network error--> Fallback(marker)
//!      v text
//! JsonExtraction --no object or {}--> HeuristicExtraction --> Repair
//!      v object
//! Repair --valid--> Done
//!      |  invalid, from JSON --> HeuristicExtraction
//!      |  invalid, from free text --> Fallback(text)
//! Fallback --> Done (or TerminalFailure)
//! ```

use serde::Serialize;

use super::observer::StageKind;
use crate::{
    config::RecoveryConfig,
    error::{AttemptError, GenerationError, TerminalFailure},
    fallback::FallbackGenerator,
    parser::{FreeTextExtractor, JsonExtractor},
    repair::{Repaired, Repairer},
    schema::AnalysisResult,
    value::{CandidateSource, FieldRepair, RawCandidate},
};

/// Prefix of the synthetic raw text recorded when the raw call fails.
pub const RAW_FAILURE_MARKER: &str = "Error generating content";

/// Result of a pipeline run.
pub type Outcome = Result<Resolution, TerminalFailure>;

/// A successful pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    /// The schema-valid result.
    pub result: AnalysisResult,
    /// Raw model text the result was recovered from, or the synthetic failure
    /// marker. `None` when a structured attempt succeeded.
    pub raw_text: Option<String>,
    /// Tier that produced the result.
    pub tier: Tier,
    /// Field repairs applied on the way.
    pub repairs: Vec<FieldRepair>,
}

/// Which tier produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tier {
    /// A structured attempt parsed cleanly.
    Structured {
        /// 1-based attempt number.
        attempt: u32,
    },
    /// JSON was extracted from raw text and repaired.
    JsonExtraction {
        /// Winning extraction strategy.
        strategy: &'static str,
    },
    /// The keyword scanner's candidate was repaired.
    Heuristic,
    /// The deterministic fallback.
    Fallback,
}

impl From<CandidateSource> for Tier {
    fn from(source: CandidateSource) -> Self {
        match source {
            CandidateSource::Extracted { strategy } => Tier::JsonExtraction { strategy },
            CandidateSource::FreeText => Tier::Heuristic,
        }
    }
}

/// Pipeline state. Each run owns its stage exclusively.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// About to run structured attempt `attempt` (1-based).
    Structured { attempt: u32 },
    /// Structured budget spent; about to fetch raw text.
    RawRecovery,
    /// Raw text obtained; about to run the JSON ladder.
    JsonExtraction { raw_text: String },
    /// Candidate found; about to repair it.
    Repair {
        candidate: RawCandidate,
        raw_text: String,
    },
    /// No JSON in the raw text; about to scan it for keywords.
    HeuristicExtraction { raw_text: String },
    /// Everything else failed; about to build the fallback.
    Fallback { raw_text: Option<String> },
    /// Terminal.
    Done(Outcome),
}

impl Stage {
    /// Initial stage of every run.
    pub const fn start() -> Self {
        Stage::Structured { attempt: 1 }
    }

    /// The stage without its payload.
    pub fn kind(&self) -> StageKind {
        match self {
            Stage::Structured { .. } => StageKind::Structured,
            Stage::RawRecovery => StageKind::RawRecovery,
            Stage::JsonExtraction { .. } => StageKind::JsonExtraction,
            Stage::Repair { .. } => StageKind::Repair,
            Stage::HeuristicExtraction { .. } => StageKind::HeuristicExtraction,
            Stage::Fallback { .. } => StageKind::Fallback,
            Stage::Done(_) => StageKind::Done,
        }
    }

    /// Text the stage is working on, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Stage::JsonExtraction { raw_text }
            | Stage::Repair { raw_text, .. }
            | Stage::HeuristicExtraction { raw_text } => Some(raw_text),
            Stage::Fallback { raw_text } => raw_text.as_deref(),
            Stage::Done(Ok(resolution)) => resolution.raw_text.as_deref(),
            Stage::Done(Err(failure)) => failure.raw_text.as_deref(),
            Stage::Structured { .. } | Stage::RawRecovery => None,
        }
    }
}

/// The offline tiers plus the transition functions over them.
#[derive(Debug)]
pub struct Tiers {
    extractor: JsonExtractor,
    free_text: FreeTextExtractor,
    repairer: Repairer,
    fallback: FallbackGenerator,
}

impl Default for Tiers {
    fn default() -> Self {
        Self::new(&RecoveryConfig::default())
    }
}

impl Tiers {
    /// Builds the tiers from configuration.
    pub fn new(config: &RecoveryConfig) -> Self {
        Self {
            extractor: JsonExtractor::new(),
            free_text: FreeTextExtractor::new(config.heuristic.clone()),
            repairer: Repairer::new(config.defaults.clone()),
            fallback: FallbackGenerator::new(config.defaults.clone()),
        }
    }

    /// `Structured`: success finishes the run; failure retries while the
    /// budget lasts, then moves to raw recovery.
    pub fn after_structured(
        &self,
        attempt: u32,
        max_retries: u32,
        outcome: Result<AnalysisResult, AttemptError>,
    ) -> Stage {
        match outcome {
            Ok(result) => Stage::Done(Ok(Resolution {
                result,
                raw_text: None,
                tier: Tier::Structured { attempt },
                repairs: Vec::new(),
            })),
            Err(_) if attempt <= max_retries => Stage::Structured {
                attempt: attempt + 1,
            },
            Err(_) => Stage::RawRecovery,
        }
    }

    /// `RawRecovery`: text goes to extraction; a failed call goes straight
    /// to the fallback with a synthetic marker in place of the text.
    pub fn after_raw(&self, outcome: Result<String, GenerationError>) -> Stage {
        match outcome {
            Ok(raw_text) => Stage::JsonExtraction { raw_text },
            Err(e) => Stage::Fallback {
                raw_text: Some(format!("{RAW_FAILURE_MARKER}: {e}")),
            },
        }
    }

    /// `JsonExtraction`: run the strategy ladder. An empty object counts as
    /// a miss, so the keyword scanner still sees the text.
    pub fn json_extraction(&self, raw_text: String) -> Stage {
        match self.extractor.try_extract(&raw_text) {
            Ok(candidate) if candidate.is_empty() => {
                tracing::debug!("Extracted JSON object is empty");
                Stage::HeuristicExtraction { raw_text }
            }
            Ok(candidate) => Stage::Repair {
                candidate,
                raw_text,
            },
            Err(e) => {
                tracing::debug!(error = %e, "No JSON object in raw text");
                Stage::HeuristicExtraction { raw_text }
            }
        }
    }

    /// `Repair`: coerce the candidate and verify the result.
    pub fn repair(&self, candidate: RawCandidate, raw_text: String) -> Stage {
        let Repaired { result, repairs } = self.repairer.repair(&candidate.fields);

        match result.check() {
            Ok(()) => Stage::Done(Ok(Resolution {
                result,
                raw_text: Some(raw_text),
                tier: candidate.source.into(),
                repairs,
            })),
            Err(violation) => {
                tracing::warn!(%violation, "Repaired candidate is still invalid");
                match candidate.source {
                    CandidateSource::Extracted { .. } => Stage::HeuristicExtraction { raw_text },
                    CandidateSource::FreeText => Stage::Fallback {
                        raw_text: Some(raw_text),
                    },
                }
            }
        }
    }

    /// `HeuristicExtraction`: the scanner always yields a candidate.
    pub fn heuristic_extraction(&self, raw_text: String) -> Stage {
        let candidate = self.free_text.extract(&raw_text);
        Stage::Repair {
            candidate,
            raw_text,
        }
    }

    /// `Fallback`: the deterministic result, checked like any other.
    pub fn fallback(&self, raw_text: Option<String>) -> Stage {
        let result = self.fallback.fallback();
        match result.check() {
            Ok(()) => Stage::Done(Ok(Resolution {
                result,
                raw_text,
                tier: Tier::Fallback,
                repairs: Vec::new(),
            })),
            Err(violation) => {
                tracing::error!(%violation, "Fallback result violates the schema");
                Stage::Done(Err(TerminalFailure {
                    raw_text,
                    violation,
                }))
            }
        }
    }

    /// The fallback result on its own.
    pub fn fallback_result(&self) -> AnalysisResult {
        self.fallback.fallback()
    }
}
