use crate::config::{LearnedBackend, PromptLightConfig, TrackingBackend};
use pl_core::{
    Correlator, EmptyStore, Gateway, LearnedStore, NoopTracker, PromptService, Tracker,
};
use pl_store::{MemoryStore, SqliteStore};
use pl_tracking::{HttpTracker, LogTracker};
use std::sync::Arc;

pub fn build_tracker(cfg: &PromptLightConfig) -> anyhow::Result<Arc<dyn Tracker>> {
    let tracker: Arc<dyn Tracker> = match cfg.tracking.backend {
        TrackingBackend::None => Arc::new(NoopTracker),
        TrackingBackend::Log => Arc::new(LogTracker),
        TrackingBackend::Http => {
            let endpoint = cfg.tracking.endpoint.as_deref().unwrap_or_default();
            let tracker = HttpTracker::new(endpoint, cfg.tracking.timeout())
                .map_err(|e| anyhow::anyhow!("build http tracker: {e}"))?
                .with_auth_token(cfg.tracking.auth_token.clone());
            Arc::new(tracker)
        }
    };
    Ok(tracker)
}

pub async fn build_learned_store(cfg: &PromptLightConfig) -> anyhow::Result<Arc<dyn LearnedStore>> {
    let store: Arc<dyn LearnedStore> = match cfg.learned.backend {
        LearnedBackend::None => Arc::new(EmptyStore),
        LearnedBackend::Memory => {
            let store = MemoryStore::new();
            for entry in &cfg.learned.entries {
                store.put(entry.category, entry.model.as_deref(), entry.to_learned());
            }
            tracing::info!(entries = store.len(), "memory learned store seeded");
            Arc::new(store)
        }
        LearnedBackend::Sqlite => Arc::new(open_sqlite(cfg).await?),
    };
    Ok(store)
}

pub async fn open_sqlite(cfg: &PromptLightConfig) -> anyhow::Result<SqliteStore> {
    let path = cfg.sqlite_path()?;
    SqliteStore::open(&path)
        .await
        .map_err(|e| anyhow::anyhow!("open learned store {}: {e}", path.display()))
}

pub fn build_service_with(
    cfg: &PromptLightConfig,
    tracker: Arc<dyn Tracker>,
    store: Arc<dyn LearnedStore>,
) -> PromptService {
    let gateway = Gateway::new(store, cfg.learned.timeout());
    let correlator = Correlator::new(tracker, cfg.tasks.id_strategy, cfg.tracking.timeout());
    PromptService::new(gateway, correlator)
}

pub async fn build_service(cfg: &PromptLightConfig) -> anyhow::Result<PromptService> {
    let tracker = build_tracker(cfg)?;
    let store = build_learned_store(cfg).await?;
    let service = build_service_with(cfg, tracker, store);
    tracing::info!(
        tracking_backend = service.tracking_backend(),
        learned_backend = service.learned_backend(),
        task_id_strategy = ?cfg.tasks.id_strategy,
        "prompt service wired"
    );
    Ok(service)
}
