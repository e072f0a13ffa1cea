use crate::server::AppState;
use axum::routing::post;
use axum::{Extension, Json};
use pl_core::TemplateRecommendation;
use serde::Deserialize;
use std::sync::Arc;

pub fn router() -> axum::Router {
    axum::Router::new().route("/recommend-templates", post(recommend_templates))
}

#[derive(Debug, Deserialize)]
struct RecommendRequest {
    user_input: String,
    category: String,
    #[serde(default)]
    model: Option<String>,
    /// Accepted but not used for ranking.
    #[serde(default)]
    context: Option<serde_json::Value>,
}

#[tracing::instrument(level = "info", skip_all)]
async fn recommend_templates(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<RecommendRequest>,
) -> Json<TemplateRecommendation> {
    tracing::debug!(
        category = %request.category,
        has_context = request.context.is_some(),
        "template recommendation requested"
    );
    Json(state.service.recommend(
        &request.user_input,
        &request.category,
        request.model.as_deref(),
    ))
}
