//! Health check handlers.
//!
//! Provides health endpoints for orchestration probes and operators:
//!
//! - `/health`: Liveness probe - returns OK if the process is running
//! - `/api/v1/health`: Detailed probe - exercises the registry and reports
//!   whether the service is running live or degraded

use crate::models::HealthResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// Liveness probe handler.
///
/// Returns a simple "OK" response to indicate the process is running.
/// Does NOT check any dependencies - failure means the process is hung.
///
/// Kubernetes will kill and restart the pod if this fails.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Detailed health handler.
///
/// Exercises the registry with a room listing and reports:
///
/// - `status`: "healthy" / "unhealthy"
/// - `service_type`: "live" when provider credentials were resolved at
///   startup, "dummy" when running degraded. Degraded mode is healthy -
///   missing configuration is surfaced here and nowhere else.
/// - `rooms_count`: rooms currently visible in the registry
/// - `timestamp`: Unix time of the probe
///
/// Returns 200 when healthy, 503 when the live registry is unreachable.
#[tracing::instrument(skip_all, name = "sb.health.detailed")]
pub async fn detailed_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = chrono::Utc::now().timestamp();

    match state.broker.list_rooms().await {
        Ok(rooms) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                service_type: Some(state.broker.service_type()),
                rooms_count: Some(rooms.len()),
                timestamp,
                error: None,
            }),
        ),
        Err(e) => {
            // Log actual error server-side for operators
            tracing::warn!(target: "sb.handlers.health", error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    service_type: Some(state.broker.service_type()),
                    rooms_count: None,
                    timestamp,
                    error: Some("Room registry unavailable".to_string()),
                }),
            )
        }
    }
}
