//! Credential issuer for participant join tokens.
//!
//! Produces self-contained signed grants bound to an identity and exactly
//! one room. The issuer is stateless: every call is independent and has no
//! side effects beyond the signing computation. There is no server-side
//! revocation; a token's lifetime is whatever its `exp` claim encodes.
//!
//! Issuance never raises. Without provider credentials (degraded mode) it
//! returns a fixed sentinel string; if signing itself fails it returns a
//! second, distinct sentinel. Callers that control an HTTP response must
//! check [`TokenIssuer::is_sentinel`] and refuse to report success with a
//! placeholder credential.

use crate::config::Mode;
use common::jwt::{sign_hs256, AccessClaims, VideoGrant, DEFAULT_TOKEN_TTL};
use common::secret::{ExposeSecret, SecretString};
use tracing::{debug, error, warn};

/// Sentinel returned when no signing credentials are configured.
pub const SENTINEL_TOKEN_MISSING_CONFIG: &str = "dummy_token_for_testing";

/// Sentinel returned when signing fails despite credentials being present.
pub const SENTINEL_TOKEN_SIGNING_FAILED: &str = "dummy_token_fallback";

/// Signing material for participant tokens.
#[derive(Clone)]
struct IssuerCredentials {
    api_key: String,
    api_secret: SecretString,
}

/// Stateless issuer of room-scoped join credentials.
#[derive(Clone)]
pub struct TokenIssuer {
    creds: Option<IssuerCredentials>,
}

impl TokenIssuer {
    /// Build an issuer for the resolved operating mode.
    pub fn from_mode(mode: &Mode) -> Self {
        let creds = match mode {
            Mode::Live(provider) => Some(IssuerCredentials {
                api_key: provider.api_key.clone(),
                api_secret: provider.api_secret.clone(),
            }),
            Mode::Degraded => None,
        };
        Self { creds }
    }

    /// Issue a join credential for `identity` scoped to `room`.
    ///
    /// `max_participants` is carried on the grant for the client's
    /// information only; admission is decided by the capacity resolver, not
    /// the token.
    ///
    /// Never fails: degraded configuration or a signing failure yields a
    /// sentinel string recognizable via [`Self::is_sentinel`].
    pub fn issue_participant_token(
        &self,
        identity: &str,
        room: &str,
        display_name: Option<&str>,
        max_participants: Option<u32>,
    ) -> String {
        let Some(creds) = &self.creds else {
            warn!(
                target: "sb.services.issuer",
                "Cannot generate real token without provider credentials; returning sentinel"
            );
            return SENTINEL_TOKEN_MISSING_CONFIG.to_string();
        };

        let claims = AccessClaims::new(
            creds.api_key.clone(),
            identity,
            display_name.map(ToString::to_string),
            DEFAULT_TOKEN_TTL,
            VideoGrant::for_join(room, max_participants),
        );

        match sign_hs256(&claims, creds.api_secret.expose_secret()) {
            Ok(token) => {
                debug!(target: "sb.services.issuer", room = %room, "Issued participant token");
                token
            }
            Err(e) => {
                error!(target: "sb.services.issuer", error = %e, "Failed to sign participant token");
                SENTINEL_TOKEN_SIGNING_FAILED.to_string()
            }
        }
    }

    /// Whether a token string is one of the placeholder sentinels rather
    /// than a real signed credential.
    pub fn is_sentinel(token: &str) -> bool {
        token == SENTINEL_TOKEN_MISSING_CONFIG || token == SENTINEL_TOKEN_SIGNING_FAILED
    }
}
