//! Error types for the recovery pipeline.
//!
//! Only [`TerminalFailure`] ever leaves the pipeline. Every other error here is
//! absorbed by the controller and turned into an escalation to the next tier.

use std::{fmt, time::Duration};

use crate::schema::Violation;

/// Errors raised by a single generation call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    /// The model call itself failed (transport, API or quota error).
    #[error("network error: {0}")]
    Network(String),

    /// The call did not finish within the per-call timeout.
    #[error("generation timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),
}

impl GenerationError {
    /// Creates a network error.
    #[inline]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }
}

/// Errors raised by the schema-aware parse of a structured attempt.
#[derive(Debug, thiserror::Error)]
pub enum StructuredParseError {
    /// The response is not a JSON object.
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is absent.
    #[error("missing required field: {field}")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A field is present but violates the schema.
    #[error("invalid field {field}: {message}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}

impl StructuredParseError {
    /// Creates an invalid field error.
    #[inline]
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }
}

/// Why one structured attempt failed. Either cause consumes one retry.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    /// The generation call failed or timed out.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// The response did not pass the structured parser.
    #[error(transparent)]
    Parse(#[from] StructuredParseError),
}

/// Details of a failed JSON extraction strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyError {
    /// Name of the strategy that failed.
    pub strategy: &'static str,
    /// Why it failed.
    pub error: String,
}

impl StrategyError {
    /// Creates a new strategy error.
    #[inline]
    pub fn new(strategy: &'static str, error: impl Into<String>) -> Self {
        Self {
            strategy,
            error: error.into(),
        }
    }
}

impl fmt::Display for StrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.error)
    }
}

/// No extraction strategy produced a JSON object.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExtractionError {
    /// Input exceeded the scan limit and was not inspected.
    #[error("input of {len} bytes exceeds the {limit} byte scan limit")]
    InputTooLarge {
        /// Input length in bytes.
        len: usize,
        /// Scan limit in bytes.
        limit: usize,
    },

    /// Every strategy was tried and none parsed.
    #[error("no extraction strategy produced a JSON object ({} tried)", .attempts.len())]
    AllStrategiesFailed {
        /// One entry per strategy, in ladder order.
        attempts: Vec<StrategyError>,
    },
}

/// The fallback result failed its own invariant check.
///
/// This is the only way the pipeline returns without a result. The recovered
/// raw text, if any, travels with it so the caller can report a preview.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("fallback result violates the schema: {violation}")]
pub struct TerminalFailure {
    /// Raw model text (or synthetic error marker) seen before giving up.
    pub raw_text: Option<String>,
    /// The invariant the fallback broke.
    pub violation: Violation,
}

/// Errors loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value is syntactically fine but unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}
