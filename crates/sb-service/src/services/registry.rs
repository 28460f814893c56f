//! Room registry client for the external media provider.
//!
//! Wraps the provider's Twirp-style RoomService HTTP API (CreateRoom,
//! ListRooms, DeleteRoom) behind one async interface. The registry is the
//! system of record for room existence, occupancy, and metadata; this client
//! holds no room state of its own.
//!
//! The backend is a tagged variant: `Live` talks to the real provider with
//! per-call admin credentials, `Degraded` (no provider credentials resolved
//! at startup) returns fixed placeholder successes so callers cannot
//! distinguish the two by status code. The distinction is surfaced only via
//! [`RegistryClient::service_type`] for health reporting.
//!
//! # Security
//!
//! - Every live call authenticates with a short-lived admin JWT signed with
//!   the provider API secret
//! - Timeouts prevent hanging connections
//! - Errors are logged server-side with generic messages returned upstream

use crate::config::{Mode, ProviderCredentials};
use common::jwt::{sign_hs256, AccessClaims, VideoGrant, ADMIN_TOKEN_TTL};
use common::secret::ExposeSecret;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

/// Default timeout for registry requests in seconds.
const REGISTRY_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default connect timeout in seconds.
const REGISTRY_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Twirp route prefix for the provider's room service.
const ROOM_SERVICE_PATH: &str = "/twirp/livekit.RoomService";

/// Creation outcome reported for degraded-mode rooms.
pub const DUMMY_CREATED_STATUS: &str = "dummy_created";

/// Errors from the room registry.
///
/// `NotFound` is a first-class variant so callers can implement
/// idempotent-delete semantics by matching on it instead of scraping
/// error strings.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The named room does not exist in the registry.
    #[error("Room not found: {0}")]
    NotFound(String),

    /// The provider rejected the call with a structured error.
    #[error("Registry rejected request: {message} ({code})")]
    Provider {
        /// Provider error code (e.g. "already_exists").
        code: String,
        /// Provider error message.
        message: String,
    },

    /// The provider could not be reached or returned a server error.
    #[error("Registry transport error: {0}")]
    Transport(String),

    /// The provider's response could not be decoded.
    #[error("Registry response decode error: {0}")]
    Decode(String),

    /// Admin credentials could not be prepared for the call.
    #[error("Registry credential error: {0}")]
    Credentials(String),
}

/// Registry view of a room.
///
/// Field names follow the provider's proto3 JSON mapping (camelCase).
/// Numeric fields default to zero when omitted, matching proto3 semantics.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomInfo {
    /// Opaque unique room name.
    pub name: String,

    /// Seconds the room outlives its last participant.
    pub empty_timeout: u32,

    /// Declared capacity; zero means unlimited.
    pub max_participants: u32,

    /// Live participant count.
    pub num_participants: u32,

    /// Opaque metadata string, conventionally serialized JSON.
    pub metadata: String,
}

/// Outcome of a room creation.
#[derive(Debug, Clone)]
pub struct RoomCreated {
    /// Room name.
    pub name: String,

    /// "created" from the live provider, "dummy_created" in degraded mode.
    pub status: String,

    /// Registry view of the new room (absent in degraded mode).
    pub room: Option<RoomInfo>,
}

// ============================================================================
// Wire types (Twirp JSON)
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRoomWire<'a> {
    name: &'a str,
    empty_timeout: u32,
    max_participants: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ListRoomsWire<'a> {
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    names: &'a [&'a str],
}

#[derive(Debug, Serialize)]
struct DeleteRoomWire<'a> {
    room: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListRoomsReply {
    rooms: Vec<RoomInfo>,
}

/// Twirp error body: `{"code": "...", "msg": "..."}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TwirpError {
    code: String,
    msg: String,
}

// ============================================================================
// Client
// ============================================================================

/// Client for the external room registry.
#[derive(Clone)]
pub struct RegistryClient {
    backend: RegistryBackend,
}

/// Tagged backend: one type, two behaviors, dispatched internally.
#[derive(Clone)]
enum RegistryBackend {
    Live(LiveRegistry),
    Degraded,
}

#[derive(Clone)]
struct LiveRegistry {
    /// HTTP client with configured timeouts.
    client: Client,

    /// Provider credentials (URL, API key, signing secret).
    creds: ProviderCredentials,
}

impl RegistryClient {
    /// Build a client for the resolved operating mode.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Transport`] if the HTTP client cannot be
    /// built (live mode only).
    pub fn from_mode(mode: &Mode) -> Result<Self, RegistryError> {
        let backend = match mode {
            Mode::Live(creds) => {
                let client = Client::builder()
                    .timeout(Duration::from_secs(REGISTRY_REQUEST_TIMEOUT_SECS))
                    .connect_timeout(Duration::from_secs(REGISTRY_CONNECT_TIMEOUT_SECS))
                    .build()
                    .map_err(|e| {
                        error!(target: "sb.services.registry", error = %e, "Failed to build HTTP client");
                        RegistryError::Transport("Failed to build HTTP client".to_string())
                    })?;
                RegistryBackend::Live(LiveRegistry {
                    client,
                    creds: creds.clone(),
                })
            }
            Mode::Degraded => RegistryBackend::Degraded,
        };
        Ok(Self { backend })
    }

    /// Backend flavor for health reporting: "live" or "dummy".
    pub fn service_type(&self) -> &'static str {
        match self.backend {
            RegistryBackend::Live(_) => "live",
            RegistryBackend::Degraded => "dummy",
        }
    }

    /// List all rooms currently known to the registry.
    ///
    /// Degraded mode returns an empty list, never an error.
    #[instrument(skip_all, name = "sb.registry.list_rooms")]
    pub async fn list_rooms(&self) -> Result<Vec<RoomInfo>, RegistryError> {
        match &self.backend {
            RegistryBackend::Degraded => {
                debug!(target: "sb.services.registry", "Degraded list_rooms: returning empty list");
                Ok(Vec::new())
            }
            RegistryBackend::Live(live) => {
                let reply: ListRoomsReply = live.call("ListRooms", &ListRoomsWire { names: &[] }).await?;
                Ok(reply.rooms)
            }
        }
    }

    /// Look up a single room; `None` when the registry does not know it.
    #[instrument(skip_all, name = "sb.registry.describe_room", fields(room = %name))]
    pub async fn describe_room(&self, name: &str) -> Result<Option<RoomInfo>, RegistryError> {
        match &self.backend {
            RegistryBackend::Degraded => Ok(None),
            RegistryBackend::Live(live) => {
                let reply: ListRoomsReply = live
                    .call("ListRooms", &ListRoomsWire { names: &[name] })
                    .await?;
                Ok(reply.rooms.into_iter().find(|room| room.name == name))
            }
        }
    }

    /// Create a room.
    ///
    /// Not idempotent: an "already exists" rejection from the provider is
    /// surfaced as [`RegistryError::Provider`], not swallowed.
    #[instrument(
        skip_all,
        name = "sb.registry.create_room",
        fields(room = %name, max_participants = max_participants)
    )]
    pub async fn create_room(
        &self,
        name: &str,
        max_participants: u32,
        empty_timeout: u32,
        metadata: Option<&str>,
    ) -> Result<RoomCreated, RegistryError> {
        match &self.backend {
            RegistryBackend::Degraded => {
                debug!(target: "sb.services.registry", room = %name, "Degraded create_room");
                Ok(RoomCreated {
                    name: name.to_string(),
                    status: DUMMY_CREATED_STATUS.to_string(),
                    room: None,
                })
            }
            RegistryBackend::Live(live) => {
                let room: RoomInfo = live
                    .call(
                        "CreateRoom",
                        &CreateRoomWire {
                            name,
                            empty_timeout,
                            max_participants,
                            metadata,
                        },
                    )
                    .await?;
                Ok(RoomCreated {
                    name: room.name.clone(),
                    status: "created".to_string(),
                    room: Some(room),
                })
            }
        }
    }

    /// Delete a room.
    ///
    /// Raw registry semantics: deleting an absent room yields
    /// [`RegistryError::NotFound`]. The broker layer reinterprets that as
    /// idempotent success.
    #[instrument(skip_all, name = "sb.registry.delete_room", fields(room = %name))]
    pub async fn delete_room(&self, name: &str) -> Result<(), RegistryError> {
        match &self.backend {
            RegistryBackend::Degraded => {
                debug!(target: "sb.services.registry", room = %name, "Degraded delete_room: no-op");
                Ok(())
            }
            RegistryBackend::Live(live) => {
                let _: serde_json::Value = live.call("DeleteRoom", &DeleteRoomWire { room: name }).await?;
                Ok(())
            }
        }
    }
}

impl LiveRegistry {
    /// Issue one Twirp call with a fresh admin credential.
    ///
    /// Each call owns its request end to end; nothing is held across the
    /// await beyond the pooled transport inside `reqwest::Client`.
    async fn call<Req, Resp>(&self, method: &str, body: &Req) -> Result<Resp, RegistryError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let token = self.admin_token()?;
        let url = format!("{}{}/{}", self.creds.url, ROOM_SERVICE_PATH, method);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(target: "sb.services.registry", error = %e, method = %method, "Registry request failed");
                RegistryError::Transport("Room registry is unreachable".to_string())
            })?;

        Self::handle_response(method, response).await
    }

    /// Sign a short-lived admin token for one server-to-server call.
    fn admin_token(&self) -> Result<String, RegistryError> {
        let claims = AccessClaims::new(
            self.creds.api_key.clone(),
            self.creds.api_key.clone(),
            None,
            ADMIN_TOKEN_TTL,
            VideoGrant::for_admin(),
        );
        sign_hs256(&claims, self.creds.api_secret.expose_secret()).map_err(|e| {
            error!(target: "sb.services.registry", error = %e, "Failed to sign admin token");
            RegistryError::Credentials("Failed to sign registry credentials".to_string())
        })
    }

    /// Handle a registry response and map status codes to errors.
    async fn handle_response<Resp: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> Result<Resp, RegistryError> {
        let status = response.status();

        if status.is_success() {
            return response.json().await.map_err(|e| {
                error!(target: "sb.services.registry", error = %e, method = %method, "Failed to parse registry response");
                RegistryError::Decode("Failed to parse registry response".to_string())
            });
        }

        if status.is_server_error() {
            warn!(target: "sb.services.registry", status = %status, method = %method, "Registry returned server error");
            return Err(RegistryError::Transport(format!(
                "Room registry returned {status}"
            )));
        }

        // Twirp errors carry a JSON body with a structured code
        let body = response.text().await.unwrap_or_default();
        let twirp: TwirpError = serde_json::from_str(&body).unwrap_or_default();
        warn!(
            target: "sb.services.registry",
            status = %status,
            method = %method,
            code = %twirp.code,
            "Registry rejected request"
        );

        if is_not_found(&twirp.code, &twirp.msg) {
            return Err(RegistryError::NotFound(twirp.msg));
        }

        Err(RegistryError::Provider {
            code: if twirp.code.is_empty() {
                status.as_u16().to_string()
            } else {
                twirp.code
            },
            message: if twirp.msg.is_empty() { body } else { twirp.msg },
        })
    }
}

/// Classify a provider rejection as "room does not exist".
///
/// The structured Twirp code is authoritative; the message substrings are a
/// fallback for providers that only return free text.
fn is_not_found(code: &str, message: &str) -> bool {
    if code.eq_ignore_ascii_case("not_found") {
        return true;
    }
    let message = message.to_lowercase();
    message.contains("not found") || message.contains("does not exist")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::secret::SecretString;

    fn degraded_client() -> RegistryClient {
        RegistryClient::from_mode(&Mode::Degraded).unwrap()
    }

    fn live_mode() -> Mode {
        Mode::Live(ProviderCredentials {
            url: "http://localhost:7880".to_string(),
            api_key: "SWKEY".to_string(),
            api_secret: SecretString::from("secret"),
        })
    }

    #[test]
    fn test_service_type_live() {
        let client = RegistryClient::from_mode(&live_mode()).unwrap();
        assert_eq!(client.service_type(), "live");
    }

    #[test]
    fn test_service_type_degraded() {
        assert_eq!(degraded_client().service_type(), "dummy");
    }

    #[tokio::test]
    async fn test_degraded_list_rooms_is_empty_success() {
        let rooms = degraded_client().list_rooms().await.unwrap();
        assert!(rooms.is_empty());
    }

    #[tokio::test]
    async fn test_degraded_describe_room_is_none() {
        let room = degraded_client().describe_room("any").await.unwrap();
        assert!(room.is_none());
    }

    #[tokio::test]
    async fn test_degraded_create_room_reports_dummy_status() {
        let created = degraded_client()
            .create_room("quiet-room", 2, 300, None)
            .await
            .unwrap();

        assert_eq!(created.name, "quiet-room");
        assert_eq!(created.status, DUMMY_CREATED_STATUS);
        assert!(created.room.is_none());
    }

    #[tokio::test]
    async fn test_degraded_delete_room_is_noop_success() {
        assert!(degraded_client().delete_room("any").await.is_ok());
    }

    #[test]
    fn test_is_not_found_structured_code() {
        assert!(is_not_found("not_found", "anything"));
        assert!(is_not_found("NOT_FOUND", ""));
        assert!(!is_not_found("already_exists", "room already exists"));
    }

    #[test]
    fn test_is_not_found_message_fallback() {
        assert!(is_not_found("", "Room Not Found"));
        assert!(is_not_found("internal", "requested room does not exist"));
        assert!(!is_not_found("", "permission denied"));
    }

    #[test]
    fn test_create_room_wire_shape() {
        let wire = CreateRoomWire {
            name: "room-1",
            empty_timeout: 300,
            max_participants: 2,
            metadata: None,
        };

        let json = serde_json::to_string(&wire).unwrap();
        assert!(json.contains("\"name\":\"room-1\""));
        assert!(json.contains("\"emptyTimeout\":300"));
        assert!(json.contains("\"maxParticipants\":2"));
        assert!(!json.contains("metadata"));
    }

    #[test]
    fn test_list_rooms_wire_omits_empty_filter() {
        let json = serde_json::to_string(&ListRoomsWire { names: &[] }).unwrap();
        assert_eq!(json, "{}");

        let json = serde_json::to_string(&ListRoomsWire { names: &["a"] }).unwrap();
        assert!(json.contains("\"names\":[\"a\"]"));
    }

    #[test]
    fn test_room_info_deserializes_with_defaults() {
        let room: RoomInfo = serde_json::from_str(r#"{"name": "bare"}"#).unwrap();
        assert_eq!(room.name, "bare");
        assert_eq!(room.max_participants, 0);
        assert_eq!(room.num_participants, 0);
        assert_eq!(room.metadata, "");
    }

    #[test]
    fn test_room_info_deserializes_camel_case() {
        let json = r#"{
            "name": "busy",
            "emptyTimeout": 300,
            "maxParticipants": 20,
            "numParticipants": 7,
            "metadata": "{\"max_participants\": 5}"
        }"#;

        let room: RoomInfo = serde_json::from_str(json).unwrap();
        assert_eq!(room.empty_timeout, 300);
        assert_eq!(room.max_participants, 20);
        assert_eq!(room.num_participants, 7);
        assert!(room.metadata.contains("max_participants"));
    }

    #[test]
    fn test_twirp_error_tolerates_unknown_shape() {
        let err: TwirpError = serde_json::from_str("{}").unwrap();
        assert!(err.code.is_empty());
        assert!(err.msg.is_empty());
    }
}
