//! The model invocation seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// How a generation call's output will be consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallShape {
    /// Output goes through the strict structured parser. Clients may add
    /// format instructions for this shape.
    Structured,
    /// Output is taken as free text.
    Raw,
}

/// Input to one analysis: an opaque prompt plus image references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Prompt text, passed through untouched.
    pub prompt: String,
    /// Image URLs to analyze.
    #[serde(default)]
    pub images: Vec<String>,
}

impl GenerationRequest {
    /// Creates a request without images.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            images: Vec::new(),
        }
    }

    /// Attaches image references.
    pub fn with_images<I, S>(mut self, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.images = images.into_iter().map(Into::into).collect();
        self
    }

    /// Renders the images as one `- <url>` line each, for prompt templates.
    ///
    /// # Examples
    ///
    /// ```
    /// use styleparse::recovery::GenerationRequest;
    ///
    /// let request = GenerationRequest::new("Analyze").with_images(["a.jpg", "b.jpg"]);
    /// assert_eq!(request.image_list(), "- a.jpg\n- b.jpg");
    /// ```
    pub fn image_list(&self) -> String {
        self.images
            .iter()
            .map(|url| format!("- {url}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A model client: request in, free-form text out.
///
/// Implementations must be safe to share across concurrent runs. Timeouts are
/// applied by the controller, not by the generator.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Performs one generation call.
    async fn generate(
        &self,
        request: &GenerationRequest,
        shape: CallShape,
    ) -> Result<String, GenerationError>;
}

/// Generator that answers every call with a saved response.
///
/// Used to re-run the pipeline over a response captured earlier.
#[derive(Debug, Clone)]
pub struct ReplayGenerator {
    response: String,
}

impl ReplayGenerator {
    /// Creates a generator replaying `response`.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl Generator for ReplayGenerator {
    async fn generate(
        &self,
        _request: &GenerationRequest,
        _shape: CallShape,
    ) -> Result<String, GenerationError> {
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_image_list() {
        assert_eq!(GenerationRequest::new("p").image_list(), "");
    }

    #[test]
    fn test_request_deserializes_without_images() {
        let request: GenerationRequest = serde_json::from_str(r#"{"prompt": "p"}"#).unwrap();
        assert_eq!(request, GenerationRequest::new("p"));
    }

    #[tokio::test]
    async fn test_replay_generator_repeats_response() {
        let generator = ReplayGenerator::new("same");
        let request = GenerationRequest::new("p");
        for shape in [CallShape::Structured, CallShape::Raw] {
            assert_eq!(generator.generate(&request, shape).await.unwrap(), "same");
        }
    }
}
