use crate::error::{Result, SetupError};
use async_trait::async_trait;
use pl_core::{SpanHandle, Tracker, TrackingError};
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

/// Client for an external collector exposing `POST {base}/spans` and
/// `POST {base}/rewards`.
#[derive(Clone)]
pub struct HttpTracker {
    http: reqwest::Client,
    spans_url: Url,
    rewards_url: Url,
    auth_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpanResponse {
    #[serde(default)]
    span_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

impl HttpTracker {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = normalize_base_url(base_url)?;
        let spans_url = join(&base, "spans")?;
        let rewards_url = join(&base, "rewards")?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            spans_url,
            rewards_url,
            auth_token: None,
        })
    }

    pub fn with_auth_token(mut self, auth_token: Option<String>) -> Self {
        self.auth_token = auth_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(ToOwned::to_owned);
        self
    }

    fn authorized_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn post(
        &self,
        url: &Url,
        payload: &serde_json::Value,
    ) -> std::result::Result<String, TrackingError> {
        let response = self
            .authorized_request(self.http.post(url.clone()))
            .json(payload)
            .send()
            .await
            .map_err(|e| TrackingError::Unavailable(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TrackingError::Unavailable(e.to_string()))?;
        if !status.is_success() {
            return Err(TrackingError::Rejected(format!(
                "status={status} body={body}"
            )));
        }
        Ok(body)
    }
}

#[async_trait]
impl Tracker for HttpTracker {
    fn backend_name(&self) -> &str {
        "http"
    }

    async fn record_span(
        &self,
        name: &str,
        metadata: serde_json::Value,
        task_id: &str,
    ) -> std::result::Result<SpanHandle, TrackingError> {
        let payload = serde_json::json!({
            "name": name,
            "task_id": task_id,
            "metadata": metadata,
        });
        let body = self.post(&self.spans_url, &payload).await?;
        parse_span_id(&body).map(SpanHandle)
    }

    async fn record_reward(
        &self,
        attribution_id: &str,
        reward: f64,
        metadata: serde_json::Value,
    ) -> std::result::Result<(), TrackingError> {
        let payload = serde_json::json!({
            "id": attribution_id,
            "reward": reward,
            "metadata": metadata,
        });
        self.post(&self.rewards_url, &payload).await?;
        Ok(())
    }
}

fn normalize_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SetupError::InvalidConfig("tracking endpoint is required".to_string()));
    }
    // Ensure a trailing slash so joins append rather than replace the last segment.
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let parsed = Url::parse(&with_slash)
        .map_err(|e| SetupError::InvalidConfig(format!("invalid tracking endpoint: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(SetupError::InvalidConfig(format!(
            "invalid tracking endpoint scheme: {other}"
        ))),
    }
}

fn join(base: &Url, segment: &str) -> Result<Url> {
    base.join(segment)
        .map_err(|e| SetupError::InvalidConfig(format!("invalid tracking path {segment}: {e}")))
}

fn parse_span_id(body: &str) -> std::result::Result<String, TrackingError> {
    let parsed: SpanResponse = serde_json::from_str(body)
        .map_err(|e| TrackingError::Rejected(format!("unexpected span response: {e}")))?;
    parsed
        .span_id
        .or(parsed.id)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| TrackingError::Rejected("span response carried no id".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Json;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use std::sync::{Arc, Mutex};

    #[test]
    fn base_url_requires_http_scheme() {
        assert!(normalize_base_url("https://collector.example.com/v1").is_ok());
        assert!(normalize_base_url("ftp://collector.example.com").is_err());
        assert!(normalize_base_url("  ").is_err());
    }

    #[test]
    fn joins_keep_base_path() {
        let tracker = HttpTracker::new("https://collector.example.com/v1", Duration::from_secs(1))
            .expect("tracker builds");
        assert_eq!(
            tracker.spans_url.as_str(),
            "https://collector.example.com/v1/spans"
        );
        assert_eq!(
            tracker.rewards_url.as_str(),
            "https://collector.example.com/v1/rewards"
        );
    }

    #[test]
    fn span_id_accepts_either_field() {
        assert_eq!(parse_span_id(r#"{"span_id":"s-1"}"#).expect("span_id"), "s-1");
        assert_eq!(parse_span_id(r#"{"id":"s-2"}"#).expect("id"), "s-2");
        assert!(parse_span_id(r#"{"id":""}"#).is_err());
        assert!(parse_span_id("not json").is_err());
    }

    #[derive(Default)]
    struct Collected {
        spans: Vec<serde_json::Value>,
        rewards: Vec<serde_json::Value>,
        auth: Vec<Option<String>>,
    }

    async fn spawn_collector() -> (String, Arc<Mutex<Collected>>) {
        let collected = Arc::new(Mutex::new(Collected::default()));
        let spans_state = collected.clone();
        let rewards_state = collected.clone();
        let app = axum::Router::new()
            .route(
                "/v1/spans",
                post(move |headers: HeaderMap, Json(body): Json<serde_json::Value>| {
                    let state = spans_state.clone();
                    async move {
                        let mut guard = state.lock().expect("lock collected");
                        guard.auth.push(
                            headers
                                .get("authorization")
                                .and_then(|v| v.to_str().ok())
                                .map(ToOwned::to_owned),
                        );
                        guard.spans.push(body);
                        Json(serde_json::json!({ "span_id": format!("span-{}", guard.spans.len()) }))
                    }
                }),
            )
            .route(
                "/v1/rewards",
                post(move |Json(body): Json<serde_json::Value>| {
                    let state = rewards_state.clone();
                    async move {
                        state.lock().expect("lock collected").rewards.push(body);
                        StatusCode::NO_CONTENT
                    }
                }),
            )
            .route(
                "/down/spans",
                post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind collector");
        let addr = listener.local_addr().expect("collector addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{addr}"), collected)
    }

    #[tokio::test]
    async fn span_and_reward_round_trip_through_collector() {
        let (base, collected) = spawn_collector().await;
        let tracker = HttpTracker::new(&format!("{base}/v1"), Duration::from_secs(5))
            .expect("tracker builds")
            .with_auth_token(Some(" secret ".to_string()));

        let span = tracker
            .record_span(
                "prompt_optimization.image",
                serde_json::json!({"score": 100}),
                "task_image_1",
            )
            .await
            .expect("span recorded");
        assert_eq!(span.as_str(), "span-1");

        tracker
            .record_reward(span.as_str(), 0.75, serde_json::json!({"source": "test"}))
            .await
            .expect("reward recorded");

        let guard = collected.lock().expect("lock collected");
        assert_eq!(guard.spans[0]["task_id"], "task_image_1");
        assert_eq!(guard.spans[0]["name"], "prompt_optimization.image");
        assert_eq!(guard.auth[0].as_deref(), Some("Bearer secret"));
        assert_eq!(guard.rewards[0]["id"], "span-1");
        assert_eq!(guard.rewards[0]["reward"], 0.75);
    }

    #[tokio::test]
    async fn collector_error_status_is_rejected() {
        let (base, _collected) = spawn_collector().await;
        let tracker =
            HttpTracker::new(&format!("{base}/down"), Duration::from_secs(5)).expect("tracker builds");
        let err = tracker
            .record_span("prompt_optimization.text", serde_json::json!({}), "t")
            .await
            .expect_err("503 must fail");
        assert!(matches!(err, TrackingError::Rejected(ref msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn unreachable_collector_is_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let tracker = HttpTracker::new(&format!("http://{addr}"), Duration::from_secs(2))
            .expect("tracker builds");
        let err = tracker
            .record_reward("t", 0.0, serde_json::json!({}))
            .await
            .expect_err("connection refused");
        assert!(matches!(err, TrackingError::Unavailable(_)));
    }
}
