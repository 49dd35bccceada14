//! Deterministic last-resort result.

use crate::{
    config::{FieldDefaults, FALLBACK_CONFIDENCE},
    schema::{AnalysisResult, ListField},
};

/// Builds the low-confidence default result.
///
/// Takes no input and cannot fail; the controller still checks the result's
/// invariants because the defaults come from configuration.
#[derive(Debug, Clone, Default)]
pub struct FallbackGenerator {
    defaults: FieldDefaults,
}

impl FallbackGenerator {
    /// Creates a generator over the given defaults.
    pub fn new(defaults: FieldDefaults) -> Self {
        Self { defaults }
    }

    /// Every list holds its default, confidence is 0.1, memo asks for a retry.
    pub fn fallback(&self) -> AnalysisResult {
        let list = |field: ListField| vec![self.defaults.list_default(field).to_string()];
        AnalysisResult {
            core_style: list(ListField::CoreStyle),
            key_elements: list(ListField::KeyElements),
            target_persona: list(ListField::TargetPersona),
            recommended_activities: list(ListField::RecommendedActivities),
            unsuitable_persona: list(ListField::UnsuitablePersona),
            confidence_score: FALLBACK_CONFIDENCE,
            memo: self.defaults.fallback_memo.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::schema::Violation;

    #[test]
    fn test_fallback_is_valid_and_deterministic() {
        let generator = FallbackGenerator::default();
        let first = generator.fallback();
        assert_eq!(first.check(), Ok(()));
        assert_eq!(first, generator.fallback());
        assert_eq!(first.confidence_score, 0.1);
        assert_eq!(first.core_style, vec!["Default style"]);
        assert_eq!(first.unsuitable_persona, vec!["Unsuitable guest"]);
        assert!(first.memo.contains("try again"));
    }

    #[test]
    fn test_blank_default_breaks_invariant_check() {
        // RecoveryConfig::validate rejects this; the generator itself does not
        let defaults = FieldDefaults {
            key_elements: String::new(),
            ..FieldDefaults::default()
        };
        let result = FallbackGenerator::new(defaults).fallback();
        assert_eq!(
            result.check(),
            Err(Violation::BlankEntry(ListField::KeyElements))
        );
    }
}
