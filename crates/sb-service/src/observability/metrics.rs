//! Metrics definitions for the Session Broker.
//!
//! All metrics follow Prometheus naming conventions:
//! - `sb_` prefix for the Session Broker
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: 7 values max (GET, POST, PATCH, DELETE, PUT, HEAD, OPTIONS)
//! - `endpoint`: ~8 values (parameterized paths)
//! - `status`: 3 values (success, error, timeout)
//! - `operation`: bounded by code (create, list, delete, describe)

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded. Histogram buckets are
/// sized for an HTTP facade whose latency is dominated by one registry
/// round trip.
///
/// # Errors
///
/// Returns error if the Prometheus recorder fails to install (e.g.,
/// already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("sb_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("sb_registry_request".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.200, 0.500, 1.000, 2.000, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set registry request buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `sb_http_requests_total`, `sb_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
///
/// This captures ALL HTTP responses including framework-level errors like:
/// - 415 Unsupported Media Type (wrong Content-Type)
/// - 400 Bad Request (JSON parse errors)
/// - 404 Not Found
/// - 405 Method Not Allowed
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    // Normalize endpoint to prevent cardinality explosion
    let normalized_endpoint = normalize_endpoint(endpoint);

    // Determine status category for simplified querying
    let status = categorize_status_code(status_code);

    histogram!("sb_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("sb_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion
///
/// Replaces dynamic segments (room names) with placeholders.
fn normalize_endpoint(path: &str) -> String {
    // Known static paths
    match path {
        "/" => "/".to_string(),
        "/health" => "/health".to_string(),
        "/metrics" => "/metrics".to_string(),
        "/api/v1/health" => "/api/v1/health".to_string(),
        "/api/v1/rooms" => "/api/v1/rooms".to_string(),
        "/api/v1/token" => "/api/v1/token".to_string(),
        "/api/v1/sessions" => "/api/v1/sessions".to_string(),
        _ => normalize_dynamic_endpoint(path),
    }
}

/// Normalize paths with dynamic segments
///
/// Replaces room names with placeholders.
fn normalize_dynamic_endpoint(path: &str) -> String {
    // Room endpoints: /api/v1/rooms/{room}[/capacity]
    if path.starts_with("/api/v1/rooms/") {
        let parts: Vec<&str> = path.split('/').collect();

        // /api/v1/rooms/{room} → parts.len() == 5
        if parts.len() == 5 {
            return "/api/v1/rooms/{room}".to_string();
        }

        // /api/v1/rooms/{room}/capacity → parts.len() == 6
        if parts.len() == 6 {
            if let Some(action) = parts.get(5) {
                if *action == "capacity" {
                    return "/api/v1/rooms/{room}/capacity".to_string();
                }
            }
        }
    }

    // Unknown paths normalized to "/other" to bound cardinality
    "/other".to_string()
}

// ============================================================================
// Session Metrics
// ============================================================================

/// Record a session-start attempt.
///
/// Metric: `sb_sessions_started_total`, `sb_session_start_duration_seconds`
/// Labels: `status`, `error_type` (failure counter only)
pub fn record_session_start(status: &str, error_type: Option<&str>, duration: Duration) {
    histogram!("sb_session_start_duration_seconds",
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("sb_sessions_started_total",
        "status" => status.to_string()
    )
    .increment(1);

    if let Some(err_type) = error_type {
        counter!("sb_session_start_failures_total",
            "error_type" => err_type.to_string()
        )
        .increment(1);
    }
}

/// Record a join-credential issuance.
///
/// Metric: `sb_tokens_issued_total`
/// Labels: `status` ("success" or "error")
pub fn record_token_issuance(status: &str) {
    counter!("sb_tokens_issued_total",
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Registry Metrics
// ============================================================================

/// Record a room-registry operation as observed at the broker boundary.
///
/// Metric: `sb_registry_requests_total`, `sb_registry_request_duration_seconds`
/// Labels: `operation`, `status`
///
/// Operations: "create", "list", "delete", "describe"
pub fn record_registry_request(operation: &str, status: &str, duration: Duration) {
    histogram!("sb_registry_request_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("sb_registry_requests_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
