//! Pipeline configuration.
//!
//! Every section is optional in the TOML file; missing keys take the defaults
//! below. [`RecoveryConfig::load`] validates after parsing.
//!
//! ```toml
//! max_retries = 1
//! call_timeout_secs = 60
//!
//! [defaults]
//! core_style = "Default style"
//!
//! [heuristic]
//! keywords = ["style", "design", "스타일", "디자인"]
//! ```

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, schema::ListField};

/// Default number of structured retries (two attempts in total).
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// Default per-call generation timeout.
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 60;

/// Default length of content previews in diagnostic events.
pub const DEFAULT_PREVIEW_CHARS: usize = 100;

/// Confidence assigned to defaulted and fallback results.
pub const FALLBACK_CONFIDENCE: f64 = 0.1;

/// Top-level configuration for a recovery controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Structured retries after the first attempt.
    pub max_retries: u32,
    /// Upper bound for a single generation call, in seconds.
    pub call_timeout_secs: u64,
    /// Characters of content shown in diagnostic previews.
    pub preview_chars: usize,
    /// Per-field defaults used by repair and fallback.
    pub defaults: FieldDefaults,
    /// Keyword scanner settings.
    pub heuristic: HeuristicConfig,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
            preview_chars: DEFAULT_PREVIEW_CHARS,
            defaults: FieldDefaults::default(),
            heuristic: HeuristicConfig::default(),
        }
    }
}

impl RecoveryConfig {
    /// Loads and validates a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "Loaded recovery config");
        Ok(config)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.call_timeout_secs == 0 {
            return Err(ConfigError::Invalid("call_timeout_secs must be positive".into()));
        }
        for field in ListField::ALL {
            if self.defaults.list_default(field).trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "defaults.{} must not be blank",
                    field.key()
                )));
            }
        }
        if self.heuristic.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "heuristic.keywords needs at least one keyword".into(),
            ));
        }
        if self.heuristic.max_tokens_per_line == 0 {
            return Err(ConfigError::Invalid(
                "heuristic.max_tokens_per_line must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Per-call timeout as a [`Duration`].
    #[inline]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

/// Default values substituted for missing or unusable fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDefaults {
    pub core_style: String,
    pub key_elements: String,
    pub target_persona: String,
    pub recommended_activities: String,
    pub unsuitable_persona: String,
    /// Memo used when a repaired mapping has none.
    pub memo: String,
    /// Memo of the deterministic fallback result.
    pub fallback_memo: String,
}

impl Default for FieldDefaults {
    fn default() -> Self {
        Self {
            core_style: "Default style".into(),
            key_elements: "Default element".into(),
            target_persona: "General guest".into(),
            recommended_activities: "Default activity".into(),
            unsuitable_persona: "Unsuitable guest".into(),
            memo: "Analysis recovered from the model response.".into(),
            fallback_memo: "Image analysis failed. Please try again or upload different images."
                .into(),
        }
    }
}

impl FieldDefaults {
    /// Returns the default entry for a list field.
    #[inline]
    pub fn list_default(&self, field: ListField) -> &str {
        match field {
            ListField::CoreStyle => &self.core_style,
            ListField::KeyElements => &self.key_elements,
            ListField::TargetPersona => &self.target_persona,
            ListField::RecommendedActivities => &self.recommended_activities,
            ListField::UnsuitablePersona => &self.unsuitable_persona,
        }
    }
}

/// Settings for the free-text keyword scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    /// Lines mentioning any of these (case-insensitive) feed `core_style`.
    pub keywords: Vec<String>,
    /// Tokens taken from one matching line.
    pub max_tokens_per_line: usize,
    /// Texts longer than this (in characters) become the memo.
    pub memo_min_chars: usize,
    /// Memo length cap in characters, before the ellipsis.
    pub memo_max_chars: usize,
    /// Memo used when the text is too short to quote.
    pub completion_memo: String,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            keywords: vec![
                "style".into(),
                "design".into(),
                "스타일".into(),
                "디자인".into(),
            ],
            max_tokens_per_line: 3,
            memo_min_chars: 50,
            memo_max_chars: 200,
            completion_memo: "Image analysis complete.".into(),
        }
    }
}
