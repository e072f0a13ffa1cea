use crate::routes::error_response;
use crate::server::AppState;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Extension, Json};
use pl_core::FeedbackRequest;
use std::sync::Arc;

pub fn router() -> axum::Router {
    axum::Router::new().route("/feedback", post(submit_feedback))
}

#[tracing::instrument(level = "info", skip_all)]
async fn submit_feedback(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<FeedbackRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    if let Err(e) = request.validate() {
        tracing::info!(error = %e, "feedback rejected");
        return error_response(StatusCode::BAD_REQUEST, e);
    }
    let receipt = state.service.submit_feedback(request).await;
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "success",
            "feedback_id": receipt.record.id.to_string(),
            "attribution_id": receipt.attribution_id,
            "recorded": receipt.recorded,
            "submitted_at": receipt.record.submitted_at,
        })),
    )
}
