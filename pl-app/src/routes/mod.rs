pub mod feedback;
pub mod health;
pub mod optimize;
pub mod templates;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;

pub fn router() -> Router {
    Router::new()
        .merge(health::router())
        .merge(optimize::router())
        .merge(templates::router())
        .merge(feedback::router())
}

pub(crate) fn error_response(
    status: StatusCode,
    error: impl std::fmt::Display,
) -> (StatusCode, Json<serde_json::Value>) {
    (
        status,
        Json(serde_json::json!({
            "status": "error",
            "error": error.to_string(),
        })),
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::server::AppState;
    use axum::Extension;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pl_core::{
        Correlator, EmptyStore, Gateway, LearnedStore, PromptService, TaskIdStrategy, Tracker,
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    pub fn app(tracker: Arc<dyn Tracker>) -> axum::Router {
        app_with_store(tracker, Arc::new(EmptyStore))
    }

    pub fn app_with_store(tracker: Arc<dyn Tracker>, store: Arc<dyn LearnedStore>) -> axum::Router {
        let service = PromptService::new(
            Gateway::new(store, Duration::from_millis(200)),
            Correlator::new(tracker, TaskIdStrategy::Random, Duration::from_millis(200)),
        );
        super::router().layer(Extension(Arc::new(AppState::new(service))))
    }

    pub async fn call(
        app: axum::Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = app.oneshot(request).await.expect("route response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }
}
