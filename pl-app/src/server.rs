//! PromptLight HTTP server.
//!
//! Wires collaborators from config into a `PromptService` and mounts the
//! routes behind the request-id, tracing, timeout, and concurrency layers.

use crate::config::{PromptLightConfig, ServerConfig};
use crate::routes;
use crate::wiring;
use anyhow::Result;
use axum::Extension;
use axum::http::HeaderMap;
use axum::http::Request;
use axum::http::StatusCode;
use axum::response::Response;
use pl_core::{Category, PromptService};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub const SERVICE_NAME: &str = "promptlight";

pub struct AppState {
    pub service: PromptService,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(service: PromptService) -> Self {
        Self {
            service,
            started_at: Instant::now(),
        }
    }
}

pub async fn doctor(config_path: Option<PathBuf>) -> Result<()> {
    let (cfg, path) = PromptLightConfig::load_with_path(config_path).await?;
    let addr = cfg.bind_addr()?;
    let service = wiring::build_service(&cfg).await?;
    tracing::info!(
        config_path = %path.display(),
        bind_addr = %addr,
        task_id_strategy = ?cfg.tasks.id_strategy,
        tracking_backend = service.tracking_backend(),
        tracking_timeout_ms = cfg.tracking.timeout_ms,
        learned_backend = service.learned_backend(),
        learned_timeout_ms = cfg.learned.timeout_ms,
        learned_seed_entries = cfg.learned.entries.len(),
        "config ok"
    );
    for category in Category::ALL {
        tracing::info!(
            %category,
            catalog_templates = pl_core::catalog(category).len(),
            "template catalog"
        );
    }
    Ok(())
}

pub async fn serve(config_path: Option<PathBuf>) -> Result<()> {
    let (cfg, cfg_path) = PromptLightConfig::load_with_path(config_path).await?;
    let addr = cfg.bind_addr()?;
    tracing::info!(
        config_path = %cfg_path.display(),
        bind_addr = %addr,
        http_timeout_seconds = cfg.server.http_timeout_seconds,
        http_max_in_flight = cfg.server.http_max_in_flight,
        task_id_strategy = ?cfg.tasks.id_strategy,
        tracking_backend = ?cfg.tracking.backend,
        learned_backend = ?cfg.learned.backend,
        "server configuration loaded"
    );
    let listener = preflight_bind_listener(addr).await?;

    let service = wiring::build_service(&cfg).await?;
    let state = Arc::new(AppState::new(service));
    let app = build_router(state, &cfg.server);

    let shutdown = CancellationToken::new();
    tracing::info!(%addr, "promptlight serving");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;
    tracing::info!("http server shutdown completed");
    Ok(())
}

pub fn build_router(state: Arc<AppState>, server: &ServerConfig) -> axum::Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
                request_id = %request_id_from_headers(request.headers())
            )
        })
        .on_request(|request: &Request<_>, _span: &tracing::Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id_from_headers(request.headers()),
                "http request started"
            );
        })
        .on_response(
            |response: &Response, latency: Duration, _span: &tracing::Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis() as u64,
                    "http request completed"
                );
            },
        )
        .on_failure(
            |error: ServerErrorsFailureClass, latency: Duration, _span: &tracing::Span| {
                tracing::error!(
                    error_class = %error,
                    latency_ms = latency.as_millis() as u64,
                    "http request failed"
                );
            },
        );

    routes::router()
        .layer(Extension(state))
        .layer(GlobalConcurrencyLimitLayer::new(server.http_max_in_flight))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(server.http_timeout_seconds),
        ))
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

async fn preflight_bind_listener(addr: SocketAddr) -> Result<tokio::net::TcpListener> {
    tracing::info!(%addr, "preflight bind check starting");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("preflight bind failed for {addr}: {e}"))?;
    tracing::info!(%addr, "preflight bind check passed");
    Ok(listener)
}

fn request_id_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "missing".to_string())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(sig) => sig,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler; falling back to ctrl_c only");
                if let Err(ctrlc_err) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %ctrlc_err, "failed to await ctrl-c signal");
                }
                shutdown.cancel();
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("received ctrl-c; beginning graceful shutdown");
            }
            _ = terminate.recv() => {
                tracing::warn!("received SIGTERM; beginning graceful shutdown");
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to await ctrl-c signal");
        } else {
            tracing::warn!("received ctrl-c; beginning graceful shutdown");
        }
    }
    shutdown.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use pl_core::{Correlator, EmptyStore, Gateway, NoopTracker, TaskIdStrategy};
    use tower::ServiceExt;

    fn test_router() -> axum::Router {
        let service = PromptService::new(
            Gateway::new(Arc::new(EmptyStore), Duration::from_millis(100)),
            Correlator::new(
                Arc::new(NoopTracker),
                TaskIdStrategy::Random,
                Duration::from_millis(100),
            ),
        );
        build_router(Arc::new(AppState::new(service)), &ServerConfig::default())
    }

    #[test]
    fn request_id_defaults_to_missing() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_id_from_headers(&headers), "missing");
        headers.insert("x-request-id", "req-42".parse().expect("header value"));
        assert_eq!(request_id_from_headers(&headers), "req-42");
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("build request"),
            )
            .await
            .expect("health response");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn supplied_request_id_is_propagated() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("x-request-id", "caller-supplied")
                    .body(Body::empty())
                    .expect("build request"),
            )
            .await
            .expect("root response");
        assert_eq!(
            response
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok()),
            Some("caller-supplied")
        );
    }
}
