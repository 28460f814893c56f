//! Room handlers for the Session Broker.
//!
//! Implements the room lifecycle endpoints:
//!
//! - `GET /api/v1/rooms` - List rooms
//! - `POST /api/v1/rooms` - Create a room with a caller-supplied name
//! - `DELETE /api/v1/rooms/{room_id}` - Delete a room (idempotent)
//! - `GET /api/v1/rooms/{room}/capacity` - Admission check
//!
//! Input validation happens before any registry call: a request missing its
//! room name is rejected with 400 and has no side effects.

use crate::errors::SbError;
use crate::models::{
    CapacityResponse, CreateRoomRequest, CreateRoomResponse, DeleteRoomResponse,
    ListRoomsResponse, RoomDetails,
};
use crate::observability::metrics;
use crate::routes::AppState;
use crate::services::DeleteOutcome;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

// ============================================================================
// Handler: GET /api/v1/rooms
// ============================================================================

/// Handler for GET /api/v1/rooms
///
/// Lists the names of all rooms currently known to the registry.
/// Degraded mode reports an empty list.
///
/// # Response
///
/// - 200 OK: `{rooms: [...], status: "success"}`
/// - 503 Service Unavailable: registry unreachable
#[instrument(
    skip_all,
    name = "sb.rooms.list",
    fields(method = "GET", endpoint = "/api/v1/rooms")
)]
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListRoomsResponse>, SbError> {
    let start = Instant::now();

    let result = state.broker.list_rooms().await;
    let status = if result.is_ok() { "success" } else { "error" };
    metrics::record_registry_request("list", status, start.elapsed());

    let rooms = result?;
    Ok(Json(ListRoomsResponse {
        rooms: rooms.into_iter().map(|room| room.name).collect(),
        status: "success",
    }))
}

// ============================================================================
// Handler: POST /api/v1/rooms
// ============================================================================

/// Handler for POST /api/v1/rooms
///
/// Creates a room with a caller-supplied name. Capacity defaults to 2 and
/// the empty-room timeout to 300 seconds when omitted.
///
/// # Response
///
/// - 201 Created: `{message, room, status: "success"}`
/// - 400 Bad Request: missing room name or invalid body (rejected before
///   any registry call)
/// - 502 Bad Gateway: registry rejected the creation (including
///   "already exists" - creation is not idempotent)
#[instrument(
    skip_all,
    name = "sb.rooms.create",
    fields(method = "POST", endpoint = "/api/v1/rooms")
)]
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    body: axum::body::Bytes,
) -> Result<(StatusCode, Json<CreateRoomResponse>), SbError> {
    // Deserialize request body manually to return 400 (not Axum's default 422)
    let request: CreateRoomRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(target: "sb.handlers.rooms", error = %e, "Invalid request body");
        SbError::BadRequest("Invalid request body".to_string())
    })?;

    let room_name = match request.room.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Err(SbError::BadRequest("room name is required".to_string())),
    };

    let start = Instant::now();
    let result = state
        .broker
        .create_room(
            &room_name,
            request.max_participants,
            request.empty_timeout,
            request.metadata.as_deref(),
        )
        .await;
    let status = if result.is_ok() { "success" } else { "error" };
    metrics::record_registry_request("create", status, start.elapsed());

    let created = result?;

    info!(
        target: "sb.handlers.rooms",
        room = %created.name,
        "Room created successfully"
    );

    let details = RoomDetails {
        name: created.name.clone(),
        status: created.status,
        max_participants: created.room.as_ref().map(|r| r.max_participants),
        empty_timeout: created.room.as_ref().map(|r| r.empty_timeout),
        metadata: created
            .room
            .as_ref()
            .filter(|r| !r.metadata.is_empty())
            .map(|r| r.metadata.clone()),
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateRoomResponse {
            message: format!("Room {room_name} created successfully"),
            room: details,
            status: "success",
        }),
    ))
}

// ============================================================================
// Handler: DELETE /api/v1/rooms/{room_id}
// ============================================================================

/// Handler for DELETE /api/v1/rooms/{room_id}
///
/// Deletes a room. Deleting an already-absent room is success, not an
/// error: `Delete; Delete` both return 200.
///
/// # Response
///
/// - 200 OK: deleted, or already gone
/// - 502 Bad Gateway: registry rejected the deletion for another reason
/// - 503 Service Unavailable: registry unreachable
#[instrument(
    skip_all,
    name = "sb.rooms.delete",
    fields(method = "DELETE", endpoint = "/api/v1/rooms/{room_id}", room = %room_id)
)]
pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<DeleteRoomResponse>, SbError> {
    let start = Instant::now();

    let result = state.broker.delete_room(&room_id).await;
    let status = if result.is_ok() { "success" } else { "error" };
    metrics::record_registry_request("delete", status, start.elapsed());

    let message = match result? {
        DeleteOutcome::Deleted => format!("Room {room_id} deleted successfully"),
        DeleteOutcome::AlreadyAbsent => {
            format!("Room {room_id} was already deleted or does not exist")
        }
    };

    Ok(Json(DeleteRoomResponse {
        message,
        status: "success",
    }))
}

// ============================================================================
// Handler: GET /api/v1/rooms/{room}/capacity
// ============================================================================

/// Handler for GET /api/v1/rooms/{room}/capacity
///
/// Computes the admission verdict for a room from live registry state.
/// A room the registry does not know is joinable with the default maximum;
/// a registry failure fails closed (`can_join: false`).
///
/// # Response
///
/// - 200 OK: `{can_join, current_participants, max_participants,
///   status: "success"}`
/// - 502 Bad Gateway: fail-closed verdict with `status: "error"`
#[instrument(
    skip_all,
    name = "sb.rooms.capacity",
    fields(method = "GET", endpoint = "/api/v1/rooms/{room}/capacity", room = %room)
)]
pub async fn check_capacity(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> impl IntoResponse {
    let start = Instant::now();

    let result = state.broker.check_capacity(&room).await;
    let status = if result.is_ok() { "success" } else { "error" };
    metrics::record_registry_request("describe", status, start.elapsed());

    match result {
        Ok(decision) => (StatusCode::OK, Json(CapacityResponse::from(decision))),
        Err(e) => {
            tracing::warn!(
                target: "sb.handlers.rooms",
                room = %room,
                error = %e,
                "Capacity check failed; failing closed"
            );
            (
                StatusCode::BAD_GATEWAY,
                Json(CapacityResponse {
                    can_join: false,
                    current_participants: 0,
                    max_participants: 0,
                    status: "error",
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
