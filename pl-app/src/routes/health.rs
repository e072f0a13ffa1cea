use crate::server::{AppState, SERVICE_NAME};
use axum::routing::get;
use axum::{Extension, Json};
use chrono::Utc;
use std::sync::Arc;

pub fn router() -> axum::Router {
    axum::Router::new()
        .route("/", get(get_health))
        .route("/health", get(get_health))
}

#[tracing::instrument(level = "debug", skip_all)]
async fn get_health(Extension(state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "tracking_backend": state.service.tracking_backend(),
        "learned_backend": state.service.learned_backend(),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "checked_at": Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{app, call};
    use axum::http::StatusCode;
    use pl_core::NoopTracker;
    use pl_tracking::LogTracker;
    use std::sync::Arc;

    #[tokio::test]
    async fn health_reports_wired_backends() {
        let (status, body) = call(app(Arc::new(LogTracker)), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "promptlight");
        assert_eq!(body["tracking_backend"], "log");
        assert_eq!(body["learned_backend"], "none");
        assert!(body["checked_at"].is_string());
    }

    #[tokio::test]
    async fn root_serves_the_same_payload() {
        let (status, body) = call(app(Arc::new(NoopTracker)), "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tracking_backend"], "none");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
