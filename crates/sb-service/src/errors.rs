//! Session Broker error types.
//!
//! All errors map to appropriate HTTP status codes via the `IntoResponse`
//! impl and render the `{error, status: "error"}` wire shape the API
//! promises. Backend details are logged server-side; transport and internal
//! failures return generic messages to avoid leaking infrastructure details.

use crate::services::registry::RegistryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Session Broker error type.
///
/// Maps to appropriate HTTP status codes:
/// - BadRequest: 400 Bad Request (client input rejected before any external call)
/// - NotFound: 404 Not Found
/// - RoomCreationFailed, Registry: 502 Bad Gateway (provider rejected the call)
/// - ServiceUnavailable: 503 Service Unavailable (provider unreachable)
/// - TokenGeneration, Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum SbError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Room creation failed: {0}")]
    RoomCreationFailed(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl SbError {
    /// Returns the HTTP status code for this error (for metrics recording).
    pub fn status_code(&self) -> u16 {
        match self {
            SbError::BadRequest(_) => 400,
            SbError::NotFound(_) => 404,
            SbError::RoomCreationFailed(_) | SbError::Registry(_) => 502,
            SbError::ServiceUnavailable(_) => 503,
            SbError::TokenGeneration(_) | SbError::Internal(_) => 500,
        }
    }
}

/// Error wire shape: `{"error": ..., "status": "error"}`.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    status: &'static str,
}

impl IntoResponse for SbError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            SbError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason.clone()),
            SbError::NotFound(resource) => (StatusCode::NOT_FOUND, resource.clone()),
            SbError::RoomCreationFailed(reason) => {
                tracing::warn!(target: "sb.registry", reason = %reason, "Room creation failed");
                (StatusCode::BAD_GATEWAY, format!("Room creation failed: {reason}"))
            }
            SbError::Registry(reason) => {
                tracing::warn!(target: "sb.registry", reason = %reason, "Registry operation failed");
                (StatusCode::BAD_GATEWAY, reason.clone())
            }
            SbError::ServiceUnavailable(reason) => {
                // Log actual reason server-side, return a generic message
                tracing::warn!(target: "sb.availability", reason = %reason, "Provider unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Room provider temporarily unavailable".to_string(),
                )
            }
            SbError::TokenGeneration(reason) => {
                tracing::error!(target: "sb.issuer", reason = %reason, "Token generation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to generate valid token. Please check provider configuration."
                        .to_string(),
                )
            }
            SbError::Internal(reason) => {
                tracing::error!(target: "sb.internal", reason = %reason, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error: message,
            status: "error",
        };

        (status, Json(body)).into_response()
    }
}

/// Convert registry errors to broker errors.
///
/// `NotFound` keeps its identity (the broker's delete path matches on it);
/// transport problems become 503s; provider rejections become 502s.
impl From<RegistryError> for SbError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(what) => SbError::NotFound(what),
            RegistryError::Transport(reason) => SbError::ServiceUnavailable(reason),
            RegistryError::Provider { code, message } => {
                SbError::Registry(format!("{message} ({code})"))
            }
            RegistryError::Decode(reason) | RegistryError::Credentials(reason) => {
                SbError::Internal(reason)
            }
        }
    }
}
