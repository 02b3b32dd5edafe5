//! # Switchboard Server
//!
//! Loads configuration, initialises logging and metrics, and serves the
//! operator endpoints of the state layer.

use switchboard_config::{load_from_env, DEFAULT_CONFIG_DIR};
use switchboard_core::telemetry::{init_tracing, LogFormat};
use switchboard_server::{serve, ServerResult};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Make sure the failure is visible even if config loading failed
        // before logging was configured.
        init_tracing(LogFormat::Pretty, None);
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> ServerResult<()> {
    let config = load_from_env(DEFAULT_CONFIG_DIR)?;

    init_tracing(
        config.observability.log_format,
        config.observability.log_filter.as_deref(),
    );

    info!("Starting Switchboard server...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.environment);

    serve(config).await
}
