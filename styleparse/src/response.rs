//! Mapping of pipeline outcomes onto HTTP-style responses.

use serde::Serialize;

use crate::{error::TerminalFailure, recovery::Outcome, schema::AnalysisResult};

/// Characters of raw text included in an error payload.
pub const ERROR_PREVIEW_CHARS: usize = 200;

/// Status code and body for one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: ResponseBody,
}

/// Body of an [`AnalysisResponse`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    /// The schema fields of a successful analysis.
    Analysis(AnalysisResult),
    /// Structured error payload.
    Error(ErrorBody),
}

/// Payload of a failed analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    /// Length of the raw text in characters, 0 when there was none.
    pub raw_text_length: usize,
    /// At most [`ERROR_PREVIEW_CHARS`] characters of the raw text.
    pub raw_text_preview: Option<String>,
}

impl AnalysisResponse {
    /// Maps a pipeline outcome: a result becomes 200, a terminal failure 500.
    ///
    /// # Examples
    ///
    /// ```
    /// use styleparse::{recovery::Tiers, response::AnalysisResponse};
    ///
    /// let tiers = Tiers::default();
    /// let outcome = match tiers.fallback(None) {
    ///     styleparse::recovery::Stage::Done(outcome) => outcome,
    ///     _ => unreachable!(),
    /// };
    /// assert_eq!(AnalysisResponse::from_outcome(&outcome).status, 200);
    /// ```
    pub fn from_outcome(outcome: &Outcome) -> Self {
        match outcome {
            Ok(resolution) => Self {
                status: 200,
                body: ResponseBody::Analysis(resolution.result.clone()),
            },
            Err(failure) => Self::from_failure(failure),
        }
    }

    fn from_failure(failure: &TerminalFailure) -> Self {
        let raw_text = failure.raw_text.as_deref();
        tracing::error!(
            error = %failure,
            raw_text_length = raw_text.map_or(0, |t| t.chars().count()),
            "Analysis failed"
        );
        Self {
            status: 500,
            body: ResponseBody::Error(ErrorBody {
                error: "Failed to parse analysis result".into(),
                message: "The model response could not be parsed. Please try again.".into(),
                raw_text_length: raw_text.map_or(0, |t| t.chars().count()),
                raw_text_preview: raw_text.map(|t| t.chars().take(ERROR_PREVIEW_CHARS).collect()),
            }),
        }
    }

    /// Returns true for a 2xx status.
    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
