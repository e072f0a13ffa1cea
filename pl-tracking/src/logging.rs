use async_trait::async_trait;
use pl_core::{SpanHandle, Tracker, TrackingError};
use ulid::Ulid;

/// Emits spans and rewards as structured `tracing` events and mints ULID span
/// ids locally. Useful when no collector is deployed but feedback should
/// still be correlatable in the logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracker;

#[async_trait]
impl Tracker for LogTracker {
    fn backend_name(&self) -> &str {
        "log"
    }

    async fn record_span(
        &self,
        name: &str,
        metadata: serde_json::Value,
        task_id: &str,
    ) -> Result<SpanHandle, TrackingError> {
        let span_id = Ulid::new().to_string();
        tracing::info!(
            target: "promptlight::tracking",
            span_name = %name,
            %task_id,
            %span_id,
            metadata = %metadata,
            "span recorded"
        );
        Ok(SpanHandle(span_id))
    }

    async fn record_reward(
        &self,
        attribution_id: &str,
        reward: f64,
        metadata: serde_json::Value,
    ) -> Result<(), TrackingError> {
        tracing::info!(
            target: "promptlight::tracking",
            %attribution_id,
            reward,
            metadata = %metadata,
            "reward recorded"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_tracker_mints_distinct_span_ids() {
        let tracker = LogTracker;
        let a = tracker
            .record_span("prompt_optimization.image", serde_json::json!({}), "t-1")
            .await
            .expect("span a");
        let b = tracker
            .record_span("prompt_optimization.image", serde_json::json!({}), "t-1")
            .await
            .expect("span b");
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 26);
        tracker
            .record_reward(a.as_str(), 0.5, serde_json::json!({}))
            .await
            .expect("reward accepted");
    }
}
