//! Task/span correlation.
//!
//! A task id is minted per optimization and handed back to the client. The
//! tracker may add a span id. Feedback later arrives carrying one or both and
//! is attributed through [`Correlator::correlate`].

use crate::error::TrackingError;
use crate::tracking::Tracker;
use crate::types::{Category, SpanHandle, Task};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const PROMPT_HASH_RANGE: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskIdStrategy {
    /// Unique per call.
    #[default]
    Random,
    /// Derived from the prompt text into a small numeric range. Identical
    /// prompts share an id and distinct prompts may collide.
    PromptHash,
}

#[derive(Clone)]
pub struct Correlator {
    tracker: Arc<dyn Tracker>,
    strategy: TaskIdStrategy,
    timeout: Duration,
}

impl Correlator {
    pub fn new(tracker: Arc<dyn Tracker>, strategy: TaskIdStrategy, timeout: Duration) -> Self {
        Self {
            tracker,
            strategy,
            timeout,
        }
    }

    pub fn backend_name(&self) -> &str {
        self.tracker.backend_name()
    }

    pub fn strategy(&self) -> TaskIdStrategy {
        self.strategy
    }

    /// Reuses a caller-supplied id verbatim, otherwise mints one.
    pub fn allocate(&self, supplied: Option<&str>, category: Category, prompt: &str) -> String {
        if let Some(task_id) = supplied.filter(|id| !id.trim().is_empty()) {
            return task_id.to_string();
        }
        match self.strategy {
            TaskIdStrategy::Random => format!("task_{category}_{}", Uuid::new_v4().simple()),
            TaskIdStrategy::PromptHash => {
                format!("task_{category}_{}", prompt_hash_bucket(prompt))
            }
        }
    }

    /// Records the optimization span. Tracker failure only drops the span id.
    pub async fn record(
        &self,
        task_id: String,
        category: Category,
        metadata: serde_json::Value,
    ) -> Task {
        let name = format!("prompt_optimization.{category}");
        let outcome = match tokio::time::timeout(
            self.timeout,
            self.tracker.record_span(&name, metadata, &task_id),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(TrackingError::Timeout(self.timeout.as_millis() as u64)),
        };

        let span_id = match outcome {
            Ok(SpanHandle(span_id)) => {
                tracing::debug!(%task_id, %span_id, "optimization span recorded");
                Some(span_id)
            }
            Err(TrackingError::Disabled) => None,
            Err(error) => {
                tracing::warn!(%task_id, %error, "span recording failed; continuing without span id");
                None
            }
        };

        Task { task_id, span_id }
    }

    pub async fn begin(
        &self,
        supplied: Option<&str>,
        category: Category,
        prompt: &str,
        metadata: serde_json::Value,
    ) -> Task {
        let task_id = self.allocate(supplied, category, prompt);
        self.record(task_id, category, metadata).await
    }

    /// Picks the identifier a reward is attributed to. The span id wins when
    /// supplied; the value is forwarded unchanged either way.
    pub fn correlate<'a>(&self, task_id: &'a str, span_id: Option<&'a str>) -> &'a str {
        span_id.filter(|id| !id.trim().is_empty()).unwrap_or(task_id)
    }

    /// Forwards a reward to the tracker. Returns whether the tracker accepted it.
    pub async fn deliver_reward(
        &self,
        attribution_id: &str,
        reward: f64,
        metadata: serde_json::Value,
    ) -> bool {
        let outcome = match tokio::time::timeout(
            self.timeout,
            self.tracker.record_reward(attribution_id, reward, metadata),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(TrackingError::Timeout(self.timeout.as_millis() as u64)),
        };

        match outcome {
            Ok(()) => {
                tracing::info!(%attribution_id, reward, "reward recorded");
                true
            }
            Err(TrackingError::Disabled) => {
                tracing::debug!(%attribution_id, reward, "tracking disabled; reward not forwarded");
                false
            }
            Err(error) => {
                tracing::warn!(%attribution_id, reward, %error, "reward delivery failed");
                false
            }
        }
    }
}

fn prompt_hash_bucket(prompt: &str) -> u64 {
    let digest = Sha256::digest(prompt.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head) % PROMPT_HASH_RANGE
}
