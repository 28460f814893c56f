//! Access-token claims and signing helpers shared across Switchboard
//! components.
//!
//! The media provider's room API and its client SDKs both consume the same
//! self-contained token format: an HS256 JWT whose `iss` is the provider API
//! key and whose `video` claim carries the room-scoped grant. This module
//! defines that claim layout once so the credential issuer, the registry
//! client (admin tokens for server-to-server calls), and the test suites all
//! agree on it.
//!
//! # Security
//!
//! - Tokens are signed with the provider API secret (HS256); the secret
//!   never appears in claims.
//! - The `sub` field (participant identity) is redacted in Debug output.
//! - Short TTLs: participant tokens default to one hour, admin tokens to
//!   ten minutes.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Default participant token lifetime (1 hour).
///
/// Participant tokens are minted per join and are not revocable, so the
/// lifetime bounds how long a leaked token stays usable.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

/// Admin token lifetime for server-to-server registry calls (10 minutes).
///
/// Admin tokens are generated per request by the registry client, so they
/// only need to outlive a single HTTP round trip plus clock skew.
pub const ADMIN_TOKEN_TTL: Duration = Duration::from_secs(600);

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when signing or decoding access tokens.
#[derive(Error, Debug)]
pub enum JwtError {
    /// Token could not be signed.
    #[error("Failed to sign access token: {0}")]
    Signing(String),

    /// Token could not be decoded or failed validation.
    #[error("Failed to decode access token: {0}")]
    Decoding(String),
}

// =============================================================================
// Claims Types
// =============================================================================

/// Room-scoped permission grant embedded in an access token.
///
/// Participant tokens carry `room_join` plus the target `room`; admin tokens
/// (used by the registry client) carry the `room_create` / `room_list` /
/// `room_admin` flags instead. `max_participants` is informational: it echoes
/// the room's declared capacity into the credential but is not enforced at
/// the token layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoGrant {
    /// Permission to join a room.
    #[serde(default, skip_serializing_if = "is_false")]
    pub room_join: bool,

    /// Permission to create rooms.
    #[serde(default, skip_serializing_if = "is_false")]
    pub room_create: bool,

    /// Permission to list rooms.
    #[serde(default, skip_serializing_if = "is_false")]
    pub room_list: bool,

    /// Administrative permission over rooms (delete, update).
    #[serde(default, skip_serializing_if = "is_false")]
    pub room_admin: bool,

    /// The single room this grant is scoped to (join grants only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,

    /// Declared room capacity, carried for the client's information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<u32>,
}

impl VideoGrant {
    /// Grant for a participant joining exactly one room.
    pub fn for_join(room: impl Into<String>, max_participants: Option<u32>) -> Self {
        Self {
            room_join: true,
            room: Some(room.into()),
            max_participants,
            ..Self::default()
        }
    }

    /// Grant for server-to-server room administration.
    pub fn for_admin() -> Self {
        Self {
            room_create: true,
            room_list: true,
            room_admin: true,
            ..Self::default()
        }
    }
}

/// Access-token claims.
///
/// # Fields
///
/// - `iss`: Issuer (the provider API key)
/// - `sub`: Subject (participant identity) - redacted in Debug output
/// - `name`: Optional display name shown to other participants
/// - `nbf`/`exp`: Validity window (Unix epoch seconds)
/// - `video`: The room-scoped grant
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Issuer (provider API key).
    pub iss: String,

    /// Subject (participant identity) - redacted in Debug output.
    pub sub: String,

    /// Display name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Not-before timestamp (Unix epoch seconds).
    pub nbf: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Room-scoped permission grant.
    pub video: VideoGrant,
}

impl AccessClaims {
    /// Create claims valid from now for `ttl`.
    pub fn new(
        api_key: impl Into<String>,
        identity: impl Into<String>,
        name: Option<String>,
        ttl: Duration,
        video: VideoGrant,
    ) -> Self {
        let now = Utc::now().timestamp();
        Self {
            iss: api_key.into(),
            sub: identity.into(),
            name,
            nbf: now,
            exp: now + ttl.as_secs() as i64,
            video,
        }
    }
}

/// Custom Debug implementation that redacts the participant identity.
impl fmt::Debug for AccessClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessClaims")
            .field("iss", &self.iss)
            .field("sub", &"[REDACTED]")
            .field("name", &self.name)
            .field("nbf", &self.nbf)
            .field("exp", &self.exp)
            .field("video", &self.video)
            .finish()
    }
}

// =============================================================================
// Signing / Decoding
// =============================================================================

/// Sign claims with the provider API secret (HS256).
///
/// # Errors
///
/// Returns [`JwtError::Signing`] if serialization or signing fails.
pub fn sign_hs256(claims: &AccessClaims, api_secret: &str) -> Result<String, JwtError> {
    let key = EncodingKey::from_secret(api_secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| JwtError::Signing(e.to_string()))
}

/// Decode and validate a token signed with the provider API secret.
///
/// Validates the signature, `exp`, and `nbf`. Primarily used by test code to
/// assert on issued credentials; the service itself never consumes its own
/// tokens.
///
/// # Errors
///
/// Returns [`JwtError::Decoding`] if the token is malformed, expired, or the
/// signature does not verify.
pub fn decode_hs256(token: &str, api_secret: &str) -> Result<AccessClaims, JwtError> {
    let key = DecodingKey::from_secret(api_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_nbf = true;
    validation.required_spec_claims = ["exp", "nbf"].iter().map(ToString::to_string).collect();

    decode::<AccessClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| JwtError::Decoding(e.to_string()))
}

/// Serde helper: skip serializing `false` grant flags.
#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}
