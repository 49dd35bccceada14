//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use styleparse::{
    config::RecoveryConfig,
    error::GenerationError,
    recovery::{
        observer::MemoryObserver, CallShape, GenerationRequest, Generator, RecoveryController,
    },
};

/// One scripted reply to a generation call.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(String),
    /// Never completes; only the controller's timeout ends the call.
    Hang,
}

pub fn text(s: &str) -> Reply {
    Reply::Text(s.to_string())
}

pub fn fail(s: &str) -> Reply {
    Reply::Fail(s.to_string())
}

/// Answers calls from a fixed script and records the call shapes.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<CallShape>>,
}

impl ScriptedGenerator {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<CallShape> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(
        &self,
        _request: &GenerationRequest,
        shape: CallShape,
    ) -> Result<String, GenerationError> {
        self.calls.lock().unwrap().push(shape);
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail(message)) => Err(GenerationError::network(message)),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(GenerationError::network("script exhausted")),
        }
    }
}

/// Fails structured calls and echoes the prompt for raw calls.
#[derive(Debug, Default)]
pub struct EchoGenerator;

#[async_trait]
impl Generator for EchoGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
        shape: CallShape,
    ) -> Result<String, GenerationError> {
        tokio::task::yield_now().await;
        match shape {
            CallShape::Structured => Ok("I cannot produce JSON right now.".to_string()),
            CallShape::Raw => Ok(request.prompt.clone()),
        }
    }
}

/// A complete, valid structured response.
pub const VALID_RESPONSE: &str = r#"{
    "core_style": ["Nordic", "Minimal"],
    "key_elements": ["Pine wood", "Large windows"],
    "target_persona": ["Couples"],
    "recommended_activities": ["Stargazing"],
    "unsuitable_persona": ["Large groups"],
    "confidence_score": 0.87,
    "memo": "A calm cabin with lots of daylight."
}"#;

pub fn controller(
    generator: Arc<dyn Generator>,
    config: RecoveryConfig,
) -> (RecoveryController, Arc<MemoryObserver>) {
    let observer = Arc::new(MemoryObserver::new());
    let controller = RecoveryController::new(generator, config).with_observer(observer.clone());
    (controller, observer)
}

pub fn request() -> GenerationRequest {
    GenerationRequest::new("Analyze the pension images").with_images(["https://example.com/1.jpg"])
}
