use async_trait::async_trait;
use pl_core::{SpanHandle, Tracker, TrackingError};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSpan {
    pub span_id: String,
    pub name: String,
    pub task_id: String,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedReward {
    pub attribution_id: String,
    pub reward: f64,
    pub metadata: serde_json::Value,
}

/// Test tracker that keeps every span and reward in memory. Span ids are
/// sequential (`span-1`, `span-2`, ...) so tests can assert on them. Only
/// built with the `test-util` feature; no config backend selects it.
#[derive(Debug, Default)]
pub struct RecordingTracker {
    spans: Mutex<Vec<RecordedSpan>>,
    rewards: Mutex<Vec<RecordedReward>>,
}

impl RecordingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spans(&self) -> Vec<RecordedSpan> {
        match self.spans.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => Vec::new(),
        }
    }

    pub fn rewards(&self) -> Vec<RecordedReward> {
        match self.rewards.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl Tracker for RecordingTracker {
    fn backend_name(&self) -> &str {
        "recording"
    }

    async fn record_span(
        &self,
        name: &str,
        metadata: serde_json::Value,
        task_id: &str,
    ) -> Result<SpanHandle, TrackingError> {
        let mut spans = self
            .spans
            .lock()
            .map_err(|_| TrackingError::Unavailable("span log poisoned".to_string()))?;
        let span_id = format!("span-{}", spans.len() + 1);
        spans.push(RecordedSpan {
            span_id: span_id.clone(),
            name: name.to_string(),
            task_id: task_id.to_string(),
            metadata,
        });
        Ok(SpanHandle(span_id))
    }

    async fn record_reward(
        &self,
        attribution_id: &str,
        reward: f64,
        metadata: serde_json::Value,
    ) -> Result<(), TrackingError> {
        let mut rewards = self
            .rewards
            .lock()
            .map_err(|_| TrackingError::Unavailable("reward log poisoned".to_string()))?;
        rewards.push(RecordedReward {
            attribution_id: attribution_id.to_string(),
            reward,
            metadata,
        });
        Ok(())
    }
}
