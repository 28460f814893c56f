//! Session Broker configuration.
//!
//! Configuration is loaded from environment variables. Provider credentials
//! are optional as a set: when any of them is absent the service runs in
//! degraded mode with placeholder backends instead of refusing to start.
//! Sensitive fields are redacted in Debug output.

use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default SB instance ID prefix.
pub const DEFAULT_SB_ID_PREFIX: &str = "sb";

/// Environment variables that select live mode. All three must be present
/// and non-empty; anything less resolves to degraded mode.
pub const REGISTRY_ENV_KEYS: [&str; 3] = ["REGISTRY_URL", "REGISTRY_API_KEY", "REGISTRY_API_SECRET"];

/// Credentials for the external room provider (registry + token signing).
#[derive(Clone)]
pub struct ProviderCredentials {
    /// Base URL of the provider's room API.
    pub url: String,

    /// Provider API key (token issuer identity).
    pub api_key: String,

    /// Provider API secret (token signing key).
    pub api_secret: SecretString,
}

/// Operating mode resolved from the environment.
///
/// `Live` requires the full credential set; `Degraded` serves placeholder
/// results so the rest of the stack stays exercisable without a provider.
/// Degraded mode is surfaced to operators only through health reporting
/// (`service_type: "dummy"`), never as request errors.
#[derive(Clone)]
pub enum Mode {
    /// Full credentials available; talk to the real provider.
    Live(ProviderCredentials),

    /// Credentials incomplete; all operations return placeholder successes.
    Degraded,
}

impl Mode {
    /// Returns true when running against the real provider.
    pub fn is_live(&self) -> bool {
        matches!(self, Mode::Live(_))
    }
}

/// Session Broker configuration.
///
/// Loaded from environment variables with sensible defaults. Resolution is
/// deterministic given the variable map and happens once at startup.
#[derive(Clone)]
pub struct Config {
    /// Operating mode (live provider credentials or degraded).
    pub mode: Mode,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Unique identifier for this SB instance.
    /// Used for log correlation and debugging.
    pub sb_id: String,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match &self.mode {
            Mode::Live(creds) => format!("Live {{ url: {}, api_key: {} }}", creds.url, creds.api_key),
            Mode::Degraded => "Degraded".to_string(),
        };
        f.debug_struct("Config")
            .field("mode", &mode)
            .field("bind_address", &self.bind_address)
            .field("sb_id", &self.sb_id)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let mode = resolve_mode(vars);

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        // Generate SB instance ID
        let sb_id = vars.get("SB_ID").cloned().unwrap_or_else(|| {
            let hostname = vars
                .get("HOSTNAME")
                .cloned()
                .unwrap_or_else(|| "unknown".to_string());
            // Use first 8 chars of UUID for uniqueness
            let uuid_suffix = uuid::Uuid::new_v4().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{}-{}-{}", DEFAULT_SB_ID_PREFIX, hostname, short_suffix)
        });

        Config {
            mode,
            bind_address,
            sb_id,
        }
    }
}

/// Resolve live vs. degraded mode from the provider credential variables.
///
/// Live is selected only when every key in [`REGISTRY_ENV_KEYS`] is present
/// and non-empty. Otherwise the missing keys are logged at warning level and
/// the service runs degraded.
fn resolve_mode(vars: &HashMap<String, String>) -> Mode {
    let missing: Vec<&str> = REGISTRY_ENV_KEYS
        .iter()
        .filter(|key| vars.get(**key).map_or(true, |v| v.is_empty()))
        .copied()
        .collect();

    if !missing.is_empty() {
        tracing::warn!(
            target: "sb.config",
            missing = ?missing,
            "Provider credentials incomplete; running in degraded mode"
        );
        return Mode::Degraded;
    }

    // All three keys were just checked present and non-empty
    let get = |key: &str| vars.get(key).cloned().unwrap_or_default();

    Mode::Live(ProviderCredentials {
        url: get("REGISTRY_URL"),
        api_key: get("REGISTRY_API_KEY"),
        api_secret: SecretString::from(get("REGISTRY_API_SECRET")),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::secret::ExposeSecret;

    fn live_vars() -> HashMap<String, String> {
        HashMap::from([
            (
                "REGISTRY_URL".to_string(),
                "https://rooms.example.com".to_string(),
            ),
            ("REGISTRY_API_KEY".to_string(), "SWKEY123".to_string()),
            ("REGISTRY_API_SECRET".to_string(), "shh-secret".to_string()),
        ])
    }

    #[test]
    fn test_from_vars_live_with_full_credentials() {
        let config = Config::from_vars(&live_vars());

        assert!(config.mode.is_live());
        match config.mode {
            Mode::Live(creds) => {
                assert_eq!(creds.url, "https://rooms.example.com");
                assert_eq!(creds.api_key, "SWKEY123");
                assert_eq!(creds.api_secret.expose_secret(), "shh-secret");
            }
            Mode::Degraded => unreachable!("expected live mode"),
        }
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        // SB ID should be auto-generated
        assert!(config.sb_id.starts_with("sb-"));
    }

    #[test]
    fn test_from_vars_degraded_when_empty() {
        let config = Config::from_vars(&HashMap::new());
        assert!(!config.mode.is_live());
    }

    #[test]
    fn test_from_vars_degraded_when_one_key_missing() {
        let mut vars = live_vars();
        vars.remove("REGISTRY_API_SECRET");

        let config = Config::from_vars(&vars);
        assert!(!config.mode.is_live());
    }

    #[test]
    fn test_from_vars_degraded_when_key_is_empty_string() {
        let mut vars = live_vars();
        vars.insert("REGISTRY_API_KEY".to_string(), String::new());

        let config = Config::from_vars(&vars);
        assert!(!config.mode.is_live());
    }

    #[test]
    fn test_bind_address_custom_value() {
        let mut vars = live_vars();
        vars.insert("BIND_ADDRESS".to_string(), "127.0.0.1:9000".to_string());

        let config = Config::from_vars(&vars);
        assert_eq!(config.bind_address, "127.0.0.1:9000");
    }

    #[test]
    fn test_sb_id_custom_value() {
        let mut vars = live_vars();
        vars.insert("SB_ID".to_string(), "sb-custom-001".to_string());

        let config = Config::from_vars(&vars);
        assert_eq!(config.sb_id, "sb-custom-001");
    }

    #[test]
    fn test_mode_resolution_is_deterministic() {
        let vars = live_vars();
        assert_eq!(
            Config::from_vars(&vars).mode.is_live(),
            Config::from_vars(&vars).mode.is_live()
        );
    }

    #[test]
    fn test_debug_redacts_api_secret() {
        let config = Config::from_vars(&live_vars());

        let debug_output = format!("{:?}", config);

        assert!(debug_output.contains("SWKEY123"));
        assert!(!debug_output.contains("shh-secret"));
    }
}
