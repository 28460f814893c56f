//! HTTP routes for the Session Broker.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers;
use crate::middleware::http_metrics_middleware;
use crate::services::SessionBroker;
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
///
/// The broker is the only shared handle; it is stateless aside from held
/// credentials and safe for concurrent use without locking.
#[derive(Clone)]
pub struct AppState {
    /// Session broker over the registry and credential issuer.
    pub broker: SessionBroker,

    /// Service configuration.
    pub config: Config,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness probe (simple "OK") - unversioned
/// - `/metrics` - Prometheus metrics endpoint - unversioned
/// - `/api/v1/health` - Detailed health (registry probe + service type)
/// - `/api/v1/rooms` - List (GET) and create (POST) rooms
/// - `/api/v1/rooms/{room_id}` - Delete a room (idempotent)
/// - `/api/v1/rooms/{room}/capacity` - Admission check
/// - `/api/v1/token` - Issue a join credential
/// - `/api/v1/sessions` - Start a fresh session (room + creator credential)
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let api_routes = Router::new()
        .route("/api/v1/health", get(handlers::detailed_health))
        .route(
            "/api/v1/rooms",
            get(handlers::list_rooms).post(handlers::create_room),
        )
        .route("/api/v1/rooms/:room", delete(handlers::delete_room))
        .route(
            "/api/v1/rooms/:room/capacity",
            get(handlers::check_capacity),
        )
        .route("/api/v1/token", post(handlers::issue_token))
        .route("/api/v1/sessions", post(handlers::start_session))
        .with_state(state);

    // Unversioned operational endpoints
    let operational_routes = Router::new().route("/health", get(handlers::health_check));

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Merge routes and apply global middleware layers
    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. http_metrics_middleware - Record ALL responses (outermost)
    api_routes
        .merge(operational_routes)
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        // HTTP metrics layer (outermost) - captures ALL responses including
        // framework-level errors like 415, 400, 404, 405
        .layer(middleware::from_fn(http_metrics_middleware))
}
