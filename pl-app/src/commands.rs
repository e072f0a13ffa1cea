//! One-shot CLI operations. Each loads config, wires the same service the
//! server uses, and returns JSON for `main` to print.

use crate::config::{LearnedBackend, PromptLightConfig};
use crate::wiring;
use anyhow::Result;
use pl_core::{Category, LearnedOptimization, OptimizationRequest};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct OptimizeArgs {
    pub category: String,
    pub prompt: String,
    pub model: Option<String>,
    pub task_id: Option<String>,
    pub language: Option<String>,
}

impl OptimizeArgs {
    fn into_request(self) -> OptimizationRequest {
        let mut request = OptimizationRequest::new(self.prompt, self.category);
        if let Some(model) = self.model {
            request = request.with_model(model);
        }
        if let Some(task_id) = self.task_id {
            request = request.with_task_id(task_id);
        }
        if let Some(language) = self.language {
            request = request.with_option("language", serde_json::Value::String(language));
        }
        request
    }
}

pub async fn optimize(
    config_path: Option<PathBuf>,
    args: OptimizeArgs,
) -> Result<serde_json::Value> {
    let cfg = PromptLightConfig::load(config_path).await?;
    let service = wiring::build_service(&cfg).await?;
    let request = args.into_request();
    request.validate()?;
    let outcome = service.optimize(request).await?;
    Ok(serde_json::to_value(outcome)?)
}

pub async fn recommend(
    config_path: Option<PathBuf>,
    category: &str,
    input: &str,
    model: Option<&str>,
) -> Result<serde_json::Value> {
    let cfg = PromptLightConfig::load(config_path).await?;
    let service = wiring::build_service(&cfg).await?;
    Ok(serde_json::to_value(service.recommend(input, category, model))?)
}

#[derive(Debug, Clone)]
pub struct LearnedPutArgs {
    pub category: String,
    pub model: Option<String>,
    pub keywords: Vec<String>,
    pub patterns: Option<String>,
    pub confidence: f64,
}

pub async fn learned_put(
    config_path: Option<PathBuf>,
    args: LearnedPutArgs,
) -> Result<serde_json::Value> {
    let cfg = PromptLightConfig::load(config_path).await?;
    let category = args.category.parse::<Category>()?;
    if !args.confidence.is_finite() || !(0.0..=1.0).contains(&args.confidence) {
        return Err(anyhow::anyhow!("confidence must be within [0, 1]"));
    }
    let learned_patterns = match args.patterns.as_deref() {
        Some(raw) => serde_json::from_str::<Vec<serde_json::Value>>(raw)
            .map_err(|e| anyhow::anyhow!("patterns must be a JSON array: {e}"))?,
        None => Vec::new(),
    };
    let learned = LearnedOptimization {
        learned_keywords: args
            .keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect(),
        learned_patterns,
        confidence: args.confidence,
    };

    let store = sqlite_store(&cfg).await?;
    store.put(category, args.model.as_deref(), &learned).await?;
    tracing::info!(
        %category,
        model = ?args.model,
        keywords = learned.learned_keywords.len(),
        path = %store.path().display(),
        "learned entry stored"
    );
    Ok(serde_json::json!({
        "status": "success",
        "category": category,
        "model": args.model,
        "learned": learned,
    }))
}

pub async fn learned_show(
    config_path: Option<PathBuf>,
    category: &str,
    model: Option<&str>,
) -> Result<serde_json::Value> {
    let cfg = PromptLightConfig::load(config_path).await?;
    let category = category.parse::<Category>()?;
    let store = sqlite_store(&cfg).await?;
    let entry = store.get(category, model).await?;
    Ok(serde_json::json!({
        "category": category,
        "model": model,
        "found": entry.is_some(),
        "learned": entry,
    }))
}

async fn sqlite_store(cfg: &PromptLightConfig) -> Result<pl_store::SqliteStore> {
    if cfg.learned.backend != LearnedBackend::Sqlite {
        return Err(anyhow::anyhow!(
            "learned commands require learned.backend = \"sqlite\" (or PROMPTLIGHT_LEARNED_DB)"
        ));
    }
    wiring::open_sqlite(cfg).await
}
