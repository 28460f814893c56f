//! Session Broker
//!
//! Entry point for the Switchboard session broker: an HTTP facade over an
//! external media-room provider handling room lifecycle, capacity
//! admission, and join-credential issuance.

use anyhow::Context;
use sb_service::config::Config;
use sb_service::observability::metrics::init_metrics_recorder;
use sb_service::routes::{self, AppState};
use sb_service::services::{RegistryClient, SessionBroker, TokenIssuer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sb_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Session Broker");

    // Load configuration (degraded mode is a valid outcome, not an error)
    let config = Config::from_env();

    info!(
        sb_id = %config.sb_id,
        bind_address = %config.bind_address,
        live = config.mode.is_live(),
        "Configuration loaded successfully"
    );

    // Install Prometheus metrics recorder
    let metrics_handle = init_metrics_recorder()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to initialize metrics recorder")?;

    // Wire the broker from its collaborators
    let registry = RegistryClient::from_mode(&config.mode).map_err(|e| {
        error!("Failed to build registry client: {}", e);
        anyhow::anyhow!(e)
    })?;
    let issuer = TokenIssuer::from_mode(&config.mode);
    let broker = SessionBroker::new(registry, issuer);

    // Parse bind address before moving config
    let bind_address = config.bind_address.clone();

    // Create application state
    let state = Arc::new(AppState { broker, config });

    // Build application routes
    let app = routes::build_routes(state, metrics_handle);

    // Parse bind address
    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        anyhow::anyhow!("Invalid bind address '{bind_address}': {e}")
    })?;

    info!("Session Broker listening on {}", addr);

    // Start server with graceful shutdown support
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Session Broker shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
/// Returns when a shutdown signal is received and drain period is complete.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    // Graceful shutdown drain period
    let drain_secs: u64 = std::env::var("SB_DRAIN_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30);

    if drain_secs > 0 {
        warn!("Draining connections for {} seconds...", drain_secs);
        tokio::time::sleep(Duration::from_secs(drain_secs)).await;
        info!("Drain period complete");
    } else {
        info!("Skipping drain period (SB_DRAIN_SECONDS=0)");
    }
}
