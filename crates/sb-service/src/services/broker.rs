//! Session broker: room lifecycle, admission, and credential issuance.
//!
//! Orchestrates the registry client, capacity resolver, and token issuer
//! into the composite operations the HTTP surface exposes. Each operation
//! is a one-shot transaction: no state is carried across calls, nothing is
//! retried, and every external failure propagates to the caller immediately.
//!
//! Collaborators are injected at construction and owned for the process
//! lifetime; the broker itself is stateless and safe for concurrent use
//! without locking.
//!
//! # Admission is advisory
//!
//! `join_session` issues a credential as soon as identity and room are
//! known; it does not consult the capacity resolver. Capacity checking is a
//! separate operation (`check_capacity`) that callers invoke out-of-band
//! before joining. No lock is held between a capacity check and the actual
//! media-layer join, so concurrent joins can both observe a free slot; the
//! media layer, not this broker, is the final arbiter of room membership.

use crate::errors::SbError;
use crate::models::{CapacityDecision, DEFAULT_EMPTY_TIMEOUT_SECS, DEFAULT_MAX_PARTICIPANTS};
use crate::services::capacity;
use crate::services::issuer::TokenIssuer;
use crate::services::registry::{RegistryClient, RegistryError, RoomCreated, RoomInfo};
use ring::rand::{SecureRandom, SystemRandom};
use tracing::{error, info, instrument};

/// Base62 alphabet for room name generation.
const BASE62_CHARS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Length of generated room names.
const ROOM_NAME_LENGTH: usize = 8;

/// Number of random bytes for room name generation (48 bits entropy).
const ROOM_NAME_RANDOM_BYTES: usize = 6;

/// Result of starting a fresh session.
#[derive(Debug, Clone)]
pub struct SessionStarted {
    /// Generated room name.
    pub room: String,

    /// Creator join credential (a sentinel in degraded mode).
    pub token: String,
}

/// Result of a broker-level room deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The registry deleted the room.
    Deleted,

    /// The registry did not know the room; treated as success
    /// ("already gone").
    AlreadyAbsent,
}

/// Broker over the room registry and credential issuer.
#[derive(Clone)]
pub struct SessionBroker {
    registry: RegistryClient,
    issuer: TokenIssuer,
}

impl SessionBroker {
    /// Create a broker from its collaborators.
    pub fn new(registry: RegistryClient, issuer: TokenIssuer) -> Self {
        Self { registry, issuer }
    }

    /// Backend flavor for health reporting: "live" or "dummy".
    pub fn service_type(&self) -> &'static str {
        self.registry.service_type()
    }

    /// List rooms currently known to the registry.
    pub async fn list_rooms(&self) -> Result<Vec<RoomInfo>, SbError> {
        Ok(self.registry.list_rooms().await?)
    }

    /// Create a room with an explicit, caller-supplied name.
    ///
    /// Defaults are applied here: capacity 2, empty timeout 300 seconds.
    /// Creation is not idempotent; a second create with the same name
    /// surfaces the provider's rejection.
    #[instrument(skip_all, name = "sb.broker.create_room", fields(room = %name))]
    pub async fn create_room(
        &self,
        name: &str,
        max_participants: Option<u32>,
        empty_timeout: Option<u32>,
        metadata: Option<&str>,
    ) -> Result<RoomCreated, SbError> {
        let created = self
            .registry
            .create_room(
                name,
                max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS),
                empty_timeout.unwrap_or(DEFAULT_EMPTY_TIMEOUT_SECS),
                metadata,
            )
            .await?;

        info!(
            target: "sb.services.broker",
            room = %created.name,
            status = %created.status,
            "Room created"
        );
        Ok(created)
    }

    /// Start a fresh session: generate a room, create it, credential the
    /// creator.
    ///
    /// The room name is 8 random base62 characters with no collision check
    /// against the registry; the name space (~2^48) makes a collision
    /// negligible, and if one ever occurs the provider's rejection surfaces
    /// as a creation failure.
    ///
    /// The create/issue sequence is not atomic: if the room is created and
    /// credential signing then fails, the error is returned and the room is
    /// left behind for the registry to reclaim after its empty timeout.
    #[instrument(skip_all, name = "sb.broker.start_session")]
    pub async fn start_session(
        &self,
        identity: &str,
        display_name: Option<&str>,
        max_participants: Option<u32>,
    ) -> Result<SessionStarted, SbError> {
        let max = max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS);
        let room = generate_room_name()?;

        self.registry
            .create_room(&room, max, DEFAULT_EMPTY_TIMEOUT_SECS, None)
            .await
            .map_err(|e| SbError::RoomCreationFailed(e.to_string()))?;

        let token = self
            .issuer
            .issue_participant_token(identity, &room, display_name, Some(max));

        // A sentinel from a live issuer means signing failed after the room
        // was already created; the orphaned room is left to expire.
        if self.service_type() == "live" && TokenIssuer::is_sentinel(&token) {
            return Err(SbError::TokenGeneration(format!(
                "room {room} was created but credential signing failed"
            )));
        }

        info!(
            target: "sb.services.broker",
            room = %room,
            max_participants = max,
            "Session started"
        );

        Ok(SessionStarted { room, token })
    }

    /// Issue a join credential for an existing room.
    ///
    /// Trusts the caller to have checked capacity out-of-band via
    /// [`Self::check_capacity`]; issuance itself is unconditional once
    /// identity and room are present. May return a sentinel; callers that
    /// control an HTTP response must reject it.
    pub fn join_session(
        &self,
        room: &str,
        identity: &str,
        display_name: Option<&str>,
    ) -> String {
        self.issuer
            .issue_participant_token(identity, room, display_name, None)
    }

    /// Compute the admission verdict for a room from live registry state.
    ///
    /// Registry failures propagate; the HTTP layer fails closed.
    #[instrument(skip_all, name = "sb.broker.check_capacity", fields(room = %room))]
    pub async fn check_capacity(&self, room: &str) -> Result<CapacityDecision, SbError> {
        let info = self.registry.describe_room(room).await?;
        Ok(capacity::resolve(info.as_ref()))
    }

    /// Delete a room, treating "not found" as success.
    ///
    /// `Delete; Delete` both succeed: the second call reports
    /// [`DeleteOutcome::AlreadyAbsent`]. Any other registry error surfaces
    /// as failure.
    #[instrument(skip_all, name = "sb.broker.delete_room", fields(room = %room))]
    pub async fn delete_room(&self, room: &str) -> Result<DeleteOutcome, SbError> {
        match self.registry.delete_room(room).await {
            Ok(()) => {
                info!(target: "sb.services.broker", room = %room, "Room deleted");
                Ok(DeleteOutcome::Deleted)
            }
            Err(RegistryError::NotFound(_)) => {
                info!(
                    target: "sb.services.broker",
                    room = %room,
                    "Room already absent; delete treated as success"
                );
                Ok(DeleteOutcome::AlreadyAbsent)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Generate a random room name.
///
/// Produces 8 base62 characters from a CSPRNG. Always returns exactly
/// `ROOM_NAME_LENGTH` characters, left-padded with '0' if the random value
/// produces fewer digits.
fn generate_room_name() -> Result<String, SbError> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; ROOM_NAME_RANDOM_BYTES];

    rng.fill(&mut bytes).map_err(|e| {
        error!(target: "sb.services.broker", error = %e, "Failed to generate random bytes for room name");
        SbError::Internal("RNG failure".to_string())
    })?;

    // Convert bytes to a big integer (u64 can hold 6 bytes = 48 bits)
    let mut value: u64 = 0;
    for &b in &bytes {
        value = (value << 8) | u64::from(b);
    }

    // Encode as base62, extracting digits from least-significant end
    let mut name = Vec::with_capacity(ROOM_NAME_LENGTH);
    for _ in 0..ROOM_NAME_LENGTH {
        let idx = (value % 62) as usize;
        let ch = BASE62_CHARS
            .get(idx)
            .ok_or_else(|| SbError::Internal("Base62 index out of range".to_string()))?;
        name.push(*ch);
        value /= 62;
    }

    // Reverse to get most-significant digit first (consistent ordering)
    name.reverse();

    String::from_utf8(name)
        .map_err(|_| SbError::Internal("Room name contained invalid UTF-8".to_string()))
}
