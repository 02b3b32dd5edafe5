//! Operator endpoints.

use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Creates the operator router: `/health`, `/live` and `/metrics`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/live", get(liveness_check))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Store health: 200 when healthy, 503 otherwise, with the report as JSON.
pub async fn health_check(State(app): State<AppState>) -> impl IntoResponse {
    let report = app.state.health().check_health().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

/// Process liveness; does not touch the store.
pub async fn liveness_check() -> impl IntoResponse {
    Json(LivenessResponse {
        status: "alive",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Prometheus exposition.
pub async fn metrics(State(app): State<AppState>) -> Response {
    match &app.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::Arc;
    use switchboard_cache::StateService;
    use switchboard_config::CacheConfig;
    use switchboard_store::MemoryStore;
    use tower::ServiceExt;

    fn app(store: Arc<MemoryStore>, with_metrics: bool) -> Router {
        let state = StateService::new(store, &CacheConfig::default());
        let metrics = with_metrics.then(|| PrometheusBuilder::new().build_recorder().handle());
        create_router(AppState::new(state, metrics))
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health_ok() {
        let (status, body) = get(app(Arc::new(MemoryStore::new()), false), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["backend"], "memory");
        assert!(body.get("responseTimeMs").is_some());
    }

    #[tokio::test]
    async fn test_health_unavailable() {
        let store = Arc::new(MemoryStore::new());
        store.set_available(false);
        let (status, body) = get(app(store, false), "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unhealthy");
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_live_ignores_store() {
        let store = Arc::new(MemoryStore::new());
        store.set_available(false);
        let (status, body) = get(app(store, false), "/live").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "alive");
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let (status, _) = get(app(Arc::new(MemoryStore::new()), true), "/metrics").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = get(app(Arc::new(MemoryStore::new()), false), "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
