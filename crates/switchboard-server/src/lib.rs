//! # Switchboard Server
//!
//! Operator surface for the state layer: store health, liveness, and
//! Prometheus metrics.

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ServerError, ServerResult};
pub use routes::create_router;
pub use state::AppState;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use switchboard_cache::StateService;
use switchboard_config::AppConfig;
use tokio::signal;
use tracing::info;

/// Installs the global Prometheus recorder and describes every metric.
pub fn install_metrics() -> ServerResult<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Metrics(e.to_string()))?;
    switchboard_cache::register_metrics();
    Ok(handle)
}

/// Wires the state layer and serves the operator endpoints until shutdown.
pub async fn serve(config: AppConfig) -> ServerResult<()> {
    let metrics = if config.observability.metrics_enabled {
        Some(install_metrics()?)
    } else {
        None
    };

    let state = StateService::from_config(&config)?;
    let router = create_router(AppState::new(state, metrics));

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!("Operator endpoints listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
