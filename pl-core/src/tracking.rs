use crate::error::TrackingError;
use crate::types::SpanHandle;
use async_trait::async_trait;

/// Observability collaborator that issues span ids and receives rewards.
#[async_trait]
pub trait Tracker: Send + Sync {
    /// Short backend identifier reported by health checks: "none", "log", "http".
    fn backend_name(&self) -> &str;

    /// Record one optimization span and return the tracker's handle for it.
    async fn record_span(
        &self,
        name: &str,
        metadata: serde_json::Value,
        task_id: &str,
    ) -> Result<SpanHandle, TrackingError>;

    /// Attribute a reward to a previously issued span or task id.
    async fn record_reward(
        &self,
        attribution_id: &str,
        reward: f64,
        metadata: serde_json::Value,
    ) -> Result<(), TrackingError>;
}

/// Tracker used when no backend is configured. Every call reports `Disabled`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracker;

#[async_trait]
impl Tracker for NoopTracker {
    fn backend_name(&self) -> &str {
        "none"
    }

    async fn record_span(
        &self,
        _name: &str,
        _metadata: serde_json::Value,
        _task_id: &str,
    ) -> Result<SpanHandle, TrackingError> {
        Err(TrackingError::Disabled)
    }

    async fn record_reward(
        &self,
        _attribution_id: &str,
        _reward: f64,
        _metadata: serde_json::Value,
    ) -> Result<(), TrackingError> {
        Err(TrackingError::Disabled)
    }
}
