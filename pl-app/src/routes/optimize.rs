use crate::routes::error_response;
use crate::server::AppState;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Extension, Json};
use pl_core::{OptimizationOutcome, OptimizationRequest};
use serde::Serialize;
use std::sync::Arc;

pub fn router() -> axum::Router {
    axum::Router::new().route("/optimize", post(optimize))
}

/// Wire shape of `POST /optimize`; negative suggestions travel as
/// `recommendations`.
#[derive(Debug, Serialize)]
struct OptimizeResponse {
    original_prompt: String,
    optimized_prompt: String,
    improvements: Vec<String>,
    quality_score: f64,
    confidence: f64,
    recommendations: Vec<String>,
    learned_count: usize,
    task_id: String,
    span_id: Option<String>,
    reward: Option<f64>,
}

impl From<OptimizationOutcome> for OptimizeResponse {
    fn from(outcome: OptimizationOutcome) -> Self {
        Self {
            original_prompt: outcome.original_prompt,
            optimized_prompt: outcome.result.optimized_prompt,
            improvements: outcome.result.improvements,
            quality_score: outcome.result.quality_score,
            confidence: outcome.result.confidence,
            recommendations: outcome.result.negative_suggestions,
            learned_count: outcome.result.learned_count,
            task_id: outcome.task.task_id,
            span_id: outcome.task.span_id,
            reward: outcome.reward,
        }
    }
}

#[tracing::instrument(level = "info", skip_all)]
async fn optimize(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<OptimizationRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    if let Err(e) = request.validate() {
        tracing::info!(error = %e, "optimize request rejected");
        return error_response(StatusCode::BAD_REQUEST, e);
    }
    match state.service.optimize(request).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(serde_json::json!(OptimizeResponse::from(outcome))),
        ),
        Err(e) => error_response(StatusCode::BAD_REQUEST, e),
    }
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{app, app_with_store, call};
    use axum::http::StatusCode;
    use pl_core::{Category, LearnedOptimization, NoopTracker};
    use pl_store::MemoryStore;
    use pl_tracking::RecordingTracker;
    use std::sync::Arc;

    #[tokio::test]
    async fn midjourney_cat_gets_full_rewrite_and_span() {
        let tracker = Arc::new(RecordingTracker::new());
        let (status, body) = call(
            app(tracker.clone()),
            "POST",
            "/optimize",
            Some(serde_json::json!({
                "prompt": "a cat",
                "category": "image",
                "model": "midjourney",
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["original_prompt"], "a cat");
        assert_eq!(
            body["optimized_prompt"],
            "a cat, 4k, ultra detailed --v 6 --style raw, professional composition, cinematic lighting"
        );
        assert_eq!(body["improvements"].as_array().map(Vec::len), Some(3));
        assert_eq!(body["quality_score"], 100.0);
        assert_eq!(body["span_id"], "span-1");
        assert!(body["reward"].is_null());
        assert!(!body["recommendations"].as_array().expect("array").is_empty());

        let spans = tracker.spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "prompt_optimization.image");
        assert_eq!(body["task_id"], spans[0].task_id.as_str());
    }

    #[tokio::test]
    async fn inline_feedback_delivers_a_reward() {
        let tracker = Arc::new(RecordingTracker::new());
        let (status, body) = call(
            app(tracker.clone()),
            "POST",
            "/optimize",
            Some(serde_json::json!({
                "prompt": "a cat",
                "category": "image",
                "model": "midjourney",
                "task_id": "task_client_7",
                "user_feedback": { "rating": 5, "satisfied": true },
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["task_id"], "task_client_7");
        assert_eq!(body["reward"], 1.0);
        let rewards = tracker.rewards();
        assert_eq!(rewards.len(), 1);
        assert_eq!(rewards[0].attribution_id, "span-1");
        assert_eq!(rewards[0].metadata["source"], "inline_feedback");
    }

    #[tokio::test]
    async fn learned_hints_flow_into_the_rewrite() {
        let store = MemoryStore::new().with_entry(
            Category::Image,
            None,
            LearnedOptimization {
                learned_keywords: vec!["film grain".to_string()],
                learned_patterns: Vec::new(),
                confidence: 0.9,
            },
        );
        let (status, body) = call(
            app_with_store(Arc::new(NoopTracker), Arc::new(store)),
            "POST",
            "/optimize",
            Some(serde_json::json!({ "prompt": "a cat", "category": "image" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["learned_count"], 1);
        assert!(body["span_id"].is_null());
        assert!(
            body["optimized_prompt"]
                .as_str()
                .expect("prompt")
                .ends_with(", film grain")
        );
    }

    #[tokio::test]
    async fn unsupported_category_is_bad_request() {
        let (status, body) = call(
            app(Arc::new(NoopTracker)),
            "POST",
            "/optimize",
            Some(serde_json::json!({ "prompt": "a song", "category": "audio" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["error"].as_str().expect("error").contains("audio"));
    }

    #[tokio::test]
    async fn blank_prompt_is_bad_request() {
        let tracker = Arc::new(RecordingTracker::new());
        let (status, _body) = call(
            app(tracker.clone()),
            "POST",
            "/optimize",
            Some(serde_json::json!({ "prompt": "   ", "category": "text" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(tracker.spans().is_empty());
    }
}
