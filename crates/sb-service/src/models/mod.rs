//! Session Broker models.
//!
//! Request/response types for the HTTP surface plus the capacity decision
//! shared between the resolver and its handlers.

use serde::{Deserialize, Serialize};

/// Default room capacity when neither the caller nor the registry declares one.
pub const DEFAULT_MAX_PARTICIPANTS: u32 = 2;

/// Seconds a room outlives its last participant before the registry
/// reclaims it.
pub const DEFAULT_EMPTY_TIMEOUT_SECS: u32 = 300;

/// Admission verdict for a room, computed fresh per request from live
/// registry state. Never cached; the staleness window is one registry
/// round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityDecision {
    /// Whether another participant may join.
    pub can_join: bool,

    /// Live participant count reported by the registry.
    pub current_participants: u32,

    /// Effective maximum (metadata override, else declared, else default).
    /// Zero means unlimited.
    pub max_participants: u32,
}

// ============================================================================
// Request Models
// ============================================================================

/// Request body for `POST /api/v1/rooms`.
///
/// All fields optional at the serde layer; `room` is validated in the
/// handler so a missing name yields a 400 with a precise message rather
/// than a deserialization error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRoomRequest {
    /// Room name (required).
    pub room: Option<String>,

    /// Declared capacity; defaults to [`DEFAULT_MAX_PARTICIPANTS`].
    pub max_participants: Option<u32>,

    /// Seconds to keep the empty room alive; defaults to
    /// [`DEFAULT_EMPTY_TIMEOUT_SECS`].
    pub empty_timeout: Option<u32>,

    /// Opaque metadata attached to the room.
    pub metadata: Option<String>,
}

/// Request body for `POST /api/v1/token`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    /// Participant identity (required).
    pub identity: Option<String>,

    /// Target room (required).
    pub room: Option<String>,

    /// Display name shown to other participants.
    pub name: Option<String>,
}

/// Request body for `POST /api/v1/sessions`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartSessionRequest {
    /// Creator identity (required).
    pub identity: Option<String>,

    /// Display name shown to other participants.
    pub name: Option<String>,

    /// Declared capacity for the fresh room; defaults to
    /// [`DEFAULT_MAX_PARTICIPANTS`].
    pub max_participants: Option<u32>,
}

// ============================================================================
// Response Models
// ============================================================================

/// Response for `GET /api/v1/rooms`.
#[derive(Debug, Clone, Serialize)]
pub struct ListRoomsResponse {
    /// Names of the rooms currently known to the registry.
    pub rooms: Vec<String>,

    /// Always "success".
    pub status: &'static str,
}

/// Room details echoed back from room creation.
#[derive(Debug, Clone, Serialize)]
pub struct RoomDetails {
    /// Room name.
    pub name: String,

    /// Creation outcome reported by the registry ("created" live,
    /// "dummy_created" degraded).
    pub status: String,

    /// Declared capacity, when the registry reported it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<u32>,

    /// Empty-room timeout, when the registry reported it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_timeout: Option<u32>,

    /// Metadata attached at creation, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

/// Response for `POST /api/v1/rooms`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRoomResponse {
    /// Human-readable confirmation.
    pub message: String,

    /// Details of the created room.
    pub room: RoomDetails,

    /// Always "success".
    pub status: &'static str,
}

/// Response for `DELETE /api/v1/rooms/{room_id}`.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteRoomResponse {
    /// Human-readable confirmation (also returned when the room was
    /// already absent).
    pub message: String,

    /// Always "success".
    pub status: &'static str,
}

/// Response for `POST /api/v1/token`.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    /// The issued join credential.
    pub token: String,

    /// Participant identity the credential is bound to.
    pub identity: String,

    /// Room the credential is scoped to.
    pub room: String,

    /// Display name, when provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Always "success".
    pub status: &'static str,
}

/// Response for `POST /api/v1/sessions`.
#[derive(Debug, Clone, Serialize)]
pub struct StartSessionResponse {
    /// Generated room name.
    pub room: String,

    /// Creator join credential.
    pub token: String,

    /// Creator identity.
    pub identity: String,

    /// Always "success".
    pub status: &'static str,
}

/// Response for `GET /api/v1/rooms/{name}/capacity`.
#[derive(Debug, Clone, Serialize)]
pub struct CapacityResponse {
    /// Whether another participant may join.
    pub can_join: bool,

    /// Live participant count (zero when the decision failed closed).
    pub current_participants: u32,

    /// Effective maximum (zero when the decision failed closed).
    pub max_participants: u32,

    /// "success", or "error" for a fail-closed decision.
    pub status: &'static str,

    /// Failure detail for a fail-closed decision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<CapacityDecision> for CapacityResponse {
    fn from(decision: CapacityDecision) -> Self {
        Self {
            can_join: decision.can_join,
            current_participants: decision.current_participants,
            max_participants: decision.max_participants,
            status: "success",
            error: None,
        }
    }
}

/// Response for `GET /api/v1/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy".
    pub status: &'static str,

    /// "live" or "dummy", depending on whether provider credentials were
    /// resolved at startup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<&'static str>,

    /// Rooms currently visible in the registry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rooms_count: Option<usize>,

    /// Unix timestamp of the probe.
    pub timestamp: i64,

    /// Failure detail when unhealthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
