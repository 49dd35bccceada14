//! The analysis result schema and its invariants.
//!
//! [`AnalysisResult`] is the only type the pipeline hands out as a success.
//! Its invariants (non-empty lists, confidence in `[0.0, 1.0]`) are checked by
//! [`AnalysisResult::check`] and established by the repairer; raw model output
//! is never assumed to satisfy them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// JSON key of the confidence score.
pub const CONFIDENCE_KEY: &str = "confidence_score";

/// JSON key of the narrative memo.
pub const MEMO_KEY: &str = "memo";

/// Legacy keys accepted for the memo.
pub const MEMO_ALIASES: &[&str] = &["pablo_memo"];

/// Lowest valid confidence score.
pub const MIN_CONFIDENCE: f64 = 0.0;

/// Highest valid confidence score.
pub const MAX_CONFIDENCE: f64 = 1.0;

/// The five string-list fields of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListField {
    /// Core interior/exterior style.
    CoreStyle,
    /// Distinctive visual elements.
    KeyElements,
    /// Guests the place suits.
    TargetPersona,
    /// Activities to suggest.
    RecommendedActivities,
    /// Guests the place does not suit.
    UnsuitablePersona,
}

impl ListField {
    /// All list fields in schema order.
    pub const ALL: [ListField; 5] = [
        ListField::CoreStyle,
        ListField::KeyElements,
        ListField::TargetPersona,
        ListField::RecommendedActivities,
        ListField::UnsuitablePersona,
    ];

    /// Returns the JSON key of this field.
    #[inline]
    pub const fn key(&self) -> &'static str {
        match self {
            ListField::CoreStyle => "core_style",
            ListField::KeyElements => "key_elements",
            ListField::TargetPersona => "target_persona",
            ListField::RecommendedActivities => "recommended_activities",
            ListField::UnsuitablePersona => "unsuitable_persona",
        }
    }
}

impl fmt::Display for ListField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A broken invariant on an [`AnalysisResult`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Violation {
    /// A list field has no entries.
    #[error("{0} is empty")]
    EmptyList(ListField),

    /// A list field has an entry that is blank after trimming.
    #[error("{0} has a blank entry")]
    BlankEntry(ListField),

    /// The confidence score is outside `[0.0, 1.0]` or not finite.
    #[error("confidence_score {0} is outside [0.0, 1.0]")]
    ConfidenceOutOfRange(f64),
}

impl Violation {
    /// JSON key of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Violation::EmptyList(field) | Violation::BlankEntry(field) => field.key(),
            Violation::ConfidenceOutOfRange(_) => CONFIDENCE_KEY,
        }
    }
}

/// Structured style analysis produced from a model response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub core_style: Vec<String>,
    pub key_elements: Vec<String>,
    pub target_persona: Vec<String>,
    pub recommended_activities: Vec<String>,
    pub unsuitable_persona: Vec<String>,
    /// Model confidence, `0.0..=1.0`, two decimals.
    pub confidence_score: f64,
    /// Free narrative written by the model.
    #[serde(alias = "pablo_memo")]
    pub memo: String,
}

impl AnalysisResult {
    /// Returns the entries of a list field.
    #[inline]
    pub fn list(&self, field: ListField) -> &[String] {
        match field {
            ListField::CoreStyle => &self.core_style,
            ListField::KeyElements => &self.key_elements,
            ListField::TargetPersona => &self.target_persona,
            ListField::RecommendedActivities => &self.recommended_activities,
            ListField::UnsuitablePersona => &self.unsuitable_persona,
        }
    }

    /// Returns a mutable handle to a list field.
    #[inline]
    pub fn list_mut(&mut self, field: ListField) -> &mut Vec<String> {
        match field {
            ListField::CoreStyle => &mut self.core_style,
            ListField::KeyElements => &mut self.key_elements,
            ListField::TargetPersona => &mut self.target_persona,
            ListField::RecommendedActivities => &mut self.recommended_activities,
            ListField::UnsuitablePersona => &mut self.unsuitable_persona,
        }
    }

    /// Verifies the success invariants.
    ///
    /// Reports the first violation in schema order.
    pub fn check(&self) -> Result<(), Violation> {
        for field in ListField::ALL {
            let items = self.list(field);
            if items.is_empty() {
                return Err(Violation::EmptyList(field));
            }
            if items.iter().any(|item| item.trim().is_empty()) {
                return Err(Violation::BlankEntry(field));
            }
        }
        if !is_valid_confidence(self.confidence_score) {
            return Err(Violation::ConfidenceOutOfRange(self.confidence_score));
        }
        Ok(())
    }
}

/// Returns true if `score` is finite and within `[0.0, 1.0]`.
#[inline]
pub fn is_valid_confidence(score: f64) -> bool {
    score.is_finite() && (MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&score)
}

/// Rounds a confidence score to two decimals.
#[inline]
pub fn round_confidence(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}
