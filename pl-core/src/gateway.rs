//! Learned-optimization gateway.
//!
//! The rule engine consults this before rewriting. Lookups never fail: any
//! backend error or timeout degrades to an empty, zero-confidence result.

use crate::error::StoreError;
use crate::types::{Category, LearnedOptimization};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait LearnedStore: Send + Sync {
    /// Short backend identifier reported by health checks.
    fn backend_name(&self) -> &str;

    async fn lookup(
        &self,
        category: Category,
        model: Option<&str>,
    ) -> Result<LearnedOptimization, StoreError>;
}

/// Backend with nothing learned yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyStore;

#[async_trait]
impl LearnedStore for EmptyStore {
    fn backend_name(&self) -> &str {
        "none"
    }

    async fn lookup(
        &self,
        _category: Category,
        _model: Option<&str>,
    ) -> Result<LearnedOptimization, StoreError> {
        Ok(LearnedOptimization::empty())
    }
}

#[derive(Clone)]
pub struct Gateway {
    store: Arc<dyn LearnedStore>,
    timeout: Duration,
}

impl Gateway {
    pub fn new(store: Arc<dyn LearnedStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn backend_name(&self) -> &str {
        self.store.backend_name()
    }

    #[tracing::instrument(level = "debug", skip(self), fields(backend = %self.store.backend_name()))]
    pub async fn lookup(&self, category: Category, model: Option<&str>) -> LearnedOptimization {
        let outcome = match tokio::time::timeout(self.timeout, self.store.lookup(category, model))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.timeout.as_millis() as u64)),
        };

        match outcome {
            Ok(learned) => {
                let learned = sanitize(learned);
                tracing::debug!(
                    keywords = learned.learned_keywords.len(),
                    patterns = learned.learned_patterns.len(),
                    confidence = learned.confidence,
                    "learned optimization loaded"
                );
                learned
            }
            Err(error) => {
                tracing::warn!(%error, "learned optimization lookup failed; using empty hints");
                LearnedOptimization::empty()
            }
        }
    }
}

fn sanitize(mut learned: LearnedOptimization) -> LearnedOptimization {
    learned.confidence = if learned.confidence.is_finite() {
        learned.confidence.clamp(0.0, 1.0)
    } else {
        0.0
    };
    learned
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStore;

    #[async_trait]
    impl LearnedStore for FailingStore {
        fn backend_name(&self) -> &str {
            "failing"
        }

        async fn lookup(
            &self,
            _category: Category,
            _model: Option<&str>,
        ) -> Result<LearnedOptimization, StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }
    }

    struct SlowStore;

    #[async_trait]
    impl LearnedStore for SlowStore {
        fn backend_name(&self) -> &str {
            "slow"
        }

        async fn lookup(
            &self,
            _category: Category,
            _model: Option<&str>,
        ) -> Result<LearnedOptimization, StoreError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(LearnedOptimization {
                learned_keywords: vec!["late".to_string()],
                learned_patterns: Vec::new(),
                confidence: 1.0,
            })
        }
    }

    struct FixedStore(LearnedOptimization);

    #[async_trait]
    impl LearnedStore for FixedStore {
        fn backend_name(&self) -> &str {
            "fixed"
        }

        async fn lookup(
            &self,
            _category: Category,
            _model: Option<&str>,
        ) -> Result<LearnedOptimization, StoreError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn empty_store_yields_empty_hints() {
        let gateway = Gateway::new(Arc::new(EmptyStore), Duration::from_millis(100));
        let learned = gateway.lookup(Category::Image, Some("midjourney")).await;
        assert!(learned.is_empty());
        assert_eq!(learned.confidence, 0.0);
        assert_eq!(gateway.backend_name(), "none");
    }

    #[tokio::test]
    async fn store_failure_degrades_to_empty() {
        let gateway = Gateway::new(Arc::new(FailingStore), Duration::from_millis(100));
        let learned = gateway.lookup(Category::Image, None).await;
        assert_eq!(learned, LearnedOptimization::empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_store_times_out_to_empty() {
        let gateway = Gateway::new(Arc::new(SlowStore), Duration::from_millis(50));
        let learned = gateway.lookup(Category::Video, None).await;
        assert!(learned.is_empty());
    }

    #[tokio::test]
    async fn populated_hints_pass_through_with_clamped_confidence() {
        let gateway = Gateway::new(
            Arc::new(FixedStore(LearnedOptimization {
                learned_keywords: vec!["bokeh".to_string()],
                learned_patterns: vec![serde_json::json!({"suffix": "golden hour"})],
                confidence: 3.0,
            })),
            Duration::from_millis(100),
        );
        let learned = gateway.lookup(Category::Image, None).await;
        assert_eq!(learned.learned_keywords, vec!["bokeh"]);
        assert_eq!(learned.learned_patterns.len(), 1);
        assert_eq!(learned.confidence, 1.0);
    }
}
