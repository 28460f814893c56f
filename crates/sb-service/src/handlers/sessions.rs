//! Session handler for the Session Broker.
//!
//! `POST /api/v1/sessions` starts a fresh session: a generated room plus a
//! creator credential in one operation.

use crate::errors::SbError;
use crate::models::{StartSessionRequest, StartSessionResponse};
use crate::observability::metrics;
use crate::routes::AppState;
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Handler for POST /api/v1/sessions
///
/// Generates a random room name, creates the room (capacity defaults to 2,
/// empty timeout 300 s), and issues the creator's join credential. The
/// create/issue sequence is not atomic; see the broker documentation for
/// the orphaned-room caveat.
///
/// In degraded mode this still succeeds, returning the generated room name
/// and the placeholder credential, so the surrounding flow stays exercisable
/// without provider configuration.
///
/// # Response
///
/// - 201 Created: `{room, token, identity, status: "success"}`
/// - 400 Bad Request: missing `identity` (no side effects)
/// - 502 Bad Gateway: room creation rejected by the registry
/// - 500 Internal Server Error: room created but credential signing failed
#[instrument(
    skip_all,
    name = "sb.session.start",
    fields(method = "POST", endpoint = "/api/v1/sessions")
)]
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    body: axum::body::Bytes,
) -> Result<(StatusCode, Json<StartSessionResponse>), SbError> {
    let start = Instant::now();

    // Deserialize request body manually to return 400 (not Axum's default 422)
    let request: StartSessionRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(target: "sb.handlers.sessions", error = %e, "Invalid request body");
        metrics::record_session_start("error", Some("bad_request"), start.elapsed());
        SbError::BadRequest("Invalid request body".to_string())
    })?;

    let identity = match request.identity.as_deref().map(str::trim) {
        Some(identity) if !identity.is_empty() => identity.to_string(),
        _ => {
            metrics::record_session_start("error", Some("bad_request"), start.elapsed());
            return Err(SbError::BadRequest("identity is required".to_string()));
        }
    };

    let result = state
        .broker
        .start_session(&identity, request.name.as_deref(), request.max_participants)
        .await;

    let session = match result {
        Ok(session) => session,
        Err(e) => {
            let error_type = match &e {
                SbError::RoomCreationFailed(_) => "room_creation",
                SbError::TokenGeneration(_) => "token_generation",
                _ => "internal",
            };
            metrics::record_session_start("error", Some(error_type), start.elapsed());
            return Err(e);
        }
    };

    metrics::record_session_start("success", None, start.elapsed());
    info!(
        target: "sb.handlers.sessions",
        room = %session.room,
        "Session started successfully"
    );

    Ok((
        StatusCode::CREATED,
        Json(StartSessionResponse {
            room: session.room,
            token: session.token,
            identity,
            status: "success",
        }),
    ))
}
