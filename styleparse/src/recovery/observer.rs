//! Diagnostic side channel for pipeline runs.
//!
//! The controller reports every stage it enters to an injected
//! [`PipelineObserver`]. Events are not part of the data contract.

use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// The pipeline stages, without their payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Structured,
    RawRecovery,
    JsonExtraction,
    Repair,
    HeuristicExtraction,
    Fallback,
    Done,
}

impl StageKind {
    /// Returns the snake_case name of the stage.
    pub const fn as_str(&self) -> &'static str {
        match self {
            StageKind::Structured => "structured",
            StageKind::RawRecovery => "raw_recovery",
            StageKind::JsonExtraction => "json_extraction",
            StageKind::Repair => "repair",
            StageKind::HeuristicExtraction => "heuristic_extraction",
            StageKind::Fallback => "fallback",
            StageKind::Done => "done",
        }
    }
}

/// One stage transition within a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineEvent {
    /// Identifies the run; shared by all of its events.
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Latest structured attempt number (1-based).
    pub attempt: u32,
    /// Stage being entered.
    pub stage: StageKind,
    /// Truncated content the stage works on, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    /// Failure that caused this transition, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Receives pipeline events.
pub trait PipelineObserver: Send + Sync {
    /// Called once per stage transition. Must not block for long.
    fn on_event(&self, event: &PipelineEvent);
}

/// Forwards events to every observer in order.
impl PipelineObserver for Vec<Arc<dyn PipelineObserver>> {
    fn on_event(&self, event: &PipelineEvent) {
        for observer in self {
            observer.on_event(event);
        }
    }
}

/// Emits events as `tracing` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        let stage = event.stage.as_str();
        let preview = event.preview.as_deref().unwrap_or("");
        match &event.error {
            Some(error) => tracing::warn!(
                request_id = %event.request_id,
                attempt = event.attempt,
                stage,
                error = %error,
                preview,
                "Pipeline escalated"
            ),
            None if event.stage == StageKind::Done => tracing::info!(
                request_id = %event.request_id,
                attempt = event.attempt,
                "Pipeline finished"
            ),
            None => tracing::debug!(
                request_id = %event.request_id,
                attempt = event.attempt,
                stage,
                preview,
                "Pipeline stage"
            ),
        }
    }
}

/// Appends one JSON record per event to a file.
///
/// Appends from concurrent runs are serialized, so records never interleave.
#[derive(Debug)]
pub struct JsonLinesObserver {
    file: Mutex<File>,
}

impl JsonLinesObserver {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Ok(Self::new(file))
    }

    /// Wraps an already open file.
    pub fn new(file: File) -> Self {
        Self {
            file: Mutex::new(file),
        }
    }
}

impl PipelineObserver for JsonLinesObserver {
    fn on_event(&self, event: &PipelineEvent) {
        let mut line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize pipeline event");
                return;
            }
        };
        line.push('\n');

        let mut file = lock(&self.file);
        if let Err(e) = file.write_all(line.as_bytes()) {
            tracing::warn!(error = %e, "Failed to append pipeline event");
        }
    }
}

/// Keeps events in memory, for tests and callers that inspect a run.
#[derive(Debug, Default)]
pub struct MemoryObserver {
    events: Mutex<Vec<PipelineEvent>>,
}

impl MemoryObserver {
    /// Creates an empty observer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all recorded events.
    pub fn events(&self) -> Vec<PipelineEvent> {
        lock(&self.events).clone()
    }

    /// Returns the stages recorded for one run, in order.
    pub fn stages(&self, request_id: Uuid) -> Vec<StageKind> {
        lock(&self.events)
            .iter()
            .filter(|e| e.request_id == request_id)
            .map(|e| e.stage)
            .collect()
    }
}

impl PipelineObserver for MemoryObserver {
    fn on_event(&self, event: &PipelineEvent) {
        lock(&self.events).push(event.clone());
    }
}

// A panic while holding the lock leaves the data usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cuts `text` to at most `max_chars` characters.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    fn event(stage: StageKind) -> PipelineEvent {
        PipelineEvent {
            request_id: Uuid::nil(),
            timestamp: Utc::now(),
            attempt: 1,
            stage,
            preview: None,
            error: None,
        }
    }

    #[test]
    fn test_preview_counts_characters() {
        assert_eq!(preview("스타일 분석", 3), "스타일...");
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("exact", 5), "exact");
    }

    #[test]
    fn test_memory_observer_filters_by_run() {
        let observer = MemoryObserver::new();
        observer.on_event(&event(StageKind::Structured));
        let mut other = event(StageKind::Fallback);
        other.request_id = Uuid::new_v4();
        observer.on_event(&other);

        assert_eq!(observer.events().len(), 2);
        assert_eq!(observer.stages(Uuid::nil()), vec![StageKind::Structured]);
    }

    #[test]
    fn test_fanout_reaches_every_observer() {
        let first = Arc::new(MemoryObserver::new());
        let second = Arc::new(MemoryObserver::new());
        let fanout: Vec<Arc<dyn PipelineObserver>> = vec![first.clone(), second.clone()];
        fanout.on_event(&event(StageKind::Done));
        assert_eq!(first.events().len(), 1);
        assert_eq!(second.events().len(), 1);
    }

    #[test]
    fn test_json_lines_observer_writes_records() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let observer = JsonLinesObserver::open(file.path()).unwrap();
        observer.on_event(&event(StageKind::RawRecovery));
        let mut failed = event(StageKind::Fallback);
        failed.error = Some("network error: reset".into());
        observer.on_event(&failed);

        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["stage"], "raw_recovery");
        assert!(lines[0].get("error").is_none());
        assert_eq!(lines[1]["error"], "network error: reset");
    }

    #[test]
    fn test_stage_kind_serializes_like_as_str() {
        for kind in [
            StageKind::Structured,
            StageKind::RawRecovery,
            StageKind::JsonExtraction,
            StageKind::Repair,
            StageKind::HeuristicExtraction,
            StageKind::Fallback,
            StageKind::Done,
        ] {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
        }
    }
}
