//! Token handler for the Session Broker.
//!
//! `POST /api/v1/token` issues a join credential for an existing room.
//! Missing `identity` or `room` is a client-input error rejected before any
//! backend work; a sentinel credential from the issuer is reported as a
//! backend failure, never as success.

use crate::errors::SbError;
use crate::models::{TokenRequest, TokenResponse};
use crate::observability::metrics;
use crate::routes::AppState;
use crate::services::TokenIssuer;
use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::{info, instrument};

/// Handler for POST /api/v1/token
///
/// Issues a credential bound to `identity` and scoped to `room`. Issuance is
/// unconditional once both fields are present; capacity is checked
/// out-of-band via `GET /api/v1/rooms/{room}/capacity`, not here.
///
/// # Response
///
/// - 200 OK: `{token, identity, room, name?, status: "success"}`
/// - 400 Bad Request: missing `identity` or `room` (no side effects)
/// - 500 Internal Server Error: issuer produced a placeholder credential
///   (missing or broken signing configuration)
#[instrument(
    skip_all,
    name = "sb.token.issue",
    fields(method = "POST", endpoint = "/api/v1/token")
)]
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    body: axum::body::Bytes,
) -> Result<Json<TokenResponse>, SbError> {
    // Deserialize request body manually to return 400 (not Axum's default 422)
    let request: TokenRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(target: "sb.handlers.tokens", error = %e, "Invalid request body");
        SbError::BadRequest("Invalid request body".to_string())
    })?;

    let (identity, room) = match (
        request.identity.as_deref().map(str::trim),
        request.room.as_deref().map(str::trim),
    ) {
        (Some(identity), Some(room)) if !identity.is_empty() && !room.is_empty() => {
            (identity.to_string(), room.to_string())
        }
        _ => {
            return Err(SbError::BadRequest(
                "identity and room are required".to_string(),
            ))
        }
    };

    let token = state
        .broker
        .join_session(&room, &identity, request.name.as_deref());

    if TokenIssuer::is_sentinel(&token) {
        metrics::record_token_issuance("error");
        return Err(SbError::TokenGeneration(
            "issuer returned a placeholder credential".to_string(),
        ));
    }

    metrics::record_token_issuance("success");
    info!(
        target: "sb.handlers.tokens",
        room = %room,
        "Token generated successfully"
    );

    Ok(Json(TokenResponse {
        token,
        identity,
        room,
        name: request.name,
        status: "success",
    }))
}
