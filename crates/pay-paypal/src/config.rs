//! # PayPal Configuration
//!
//! Configuration management for the order/capture provider.
//! All secrets are loaded from environment variables.

use pay_core::config::parse_secs;
use pay_core::ConfigError;
use std::env;
use std::time::Duration;

pub const SANDBOX_API_BASE: &str = "https://api-m.sandbox.paypal.com";
pub const LIVE_API_BASE: &str = "https://api-m.paypal.com";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Which PayPal environment to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayPalMode {
    Sandbox,
    Live,
}

impl PayPalMode {
    pub fn api_base(&self) -> &'static str {
        match self {
            PayPalMode::Sandbox => SANDBOX_API_BASE,
            PayPalMode::Live => LIVE_API_BASE,
        }
    }
}

/// PayPal API configuration
#[derive(Clone)]
pub struct PayPalConfig {
    pub client_id: String,

    /// Client secret, only ever sent to the token endpoint
    pub client_secret: String,

    pub mode: PayPalMode,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// Upper bound for create and capture calls
    pub request_timeout: Duration,

    /// Upper bound for the client-credentials exchange
    pub auth_timeout: Duration,
}

impl std::fmt::Debug for PayPalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayPalConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("mode", &self.mode)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout", &self.request_timeout)
            .field("auth_timeout", &self.auth_timeout)
            .finish()
    }
}

impl PayPalConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `PAYPAL_CLIENT_ID`
    /// - `PAYPAL_CLIENT_SECRET`
    ///
    /// Optional: `PAYPAL_MODE`, `PAYPAL_API_BASE`,
    /// `PAYPAL_REQUEST_TIMEOUT_SECS`, `PAYPAL_AUTH_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from any key lookup (environment, map in tests)
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let client_id = get("PAYPAL_CLIENT_ID")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError("PAYPAL_CLIENT_ID not set".to_string()))?;

        let client_secret = get("PAYPAL_CLIENT_SECRET")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError("PAYPAL_CLIENT_SECRET not set".to_string()))?;

        let mode = match get("PAYPAL_MODE").as_deref().map(str::trim) {
            None | Some("") | Some("sandbox") => PayPalMode::Sandbox,
            Some("live") => PayPalMode::Live,
            Some(other) => {
                return Err(ConfigError(format!(
                    "PAYPAL_MODE must be sandbox or live, got {other:?}"
                )))
            }
        };

        let mut config = Self::new(client_id, client_secret).with_mode(mode);

        if let Some(base) = get("PAYPAL_API_BASE").filter(|v| !v.trim().is_empty()) {
            config = config.with_api_base_url(base);
        }
        if let Some(secs) = get("PAYPAL_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = parse_secs("PAYPAL_REQUEST_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = get("PAYPAL_AUTH_TIMEOUT_SECS") {
            config.auth_timeout = parse_secs("PAYPAL_AUTH_TIMEOUT_SECS", &secs)?;
        }

        Ok(config)
    }

    /// Create config with explicit values (sandbox, default timeouts)
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            mode: PayPalMode::Sandbox,
            api_base_url: SANDBOX_API_BASE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            auth_timeout: DEFAULT_AUTH_TIMEOUT,
        }
    }

    pub fn is_live_mode(&self) -> bool {
        self.mode == PayPalMode::Live
    }

    /// Builder: switch mode; also resets the base URL to the mode's default
    pub fn with_mode(mut self, mode: PayPalMode) -> Self {
        self.mode = mode;
        self.api_base_url = mode.api_base().to_string();
        self
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pay_core::config::vars_from_pairs as vars;


    #[test]
    fn test_defaults() {
        let config = PayPalConfig::from_vars(vars(&[
            ("PAYPAL_CLIENT_ID", "client"),
            ("PAYPAL_CLIENT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.mode, PayPalMode::Sandbox);
        assert_eq!(config.api_base_url, SANDBOX_API_BASE);
        assert_eq!(config.request_timeout, Duration::from_secs(20));
        assert_eq!(config.auth_timeout, Duration::from_secs(10));
        assert!(!config.is_live_mode());
    }

    #[test]
    fn test_live_mode_and_overrides() {
        let config = PayPalConfig::from_vars(vars(&[
            ("PAYPAL_CLIENT_ID", "client"),
            ("PAYPAL_CLIENT_SECRET", "secret"),
            ("PAYPAL_MODE", "live"),
            ("PAYPAL_REQUEST_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url, LIVE_API_BASE);
        assert_eq!(config.request_timeout, Duration::from_secs(5));

        let mocked = PayPalConfig::from_vars(vars(&[
            ("PAYPAL_CLIENT_ID", "client"),
            ("PAYPAL_CLIENT_SECRET", "secret"),
            ("PAYPAL_API_BASE", "http://127.0.0.1:9999/"),
        ]))
        .unwrap();
        assert_eq!(mocked.api_base_url, "http://127.0.0.1:9999");
    }

    #[test]
    fn test_missing_and_invalid_values() {
        assert!(PayPalConfig::from_vars(vars(&[("PAYPAL_CLIENT_ID", "client")])).is_err());

        let bad_mode = PayPalConfig::from_vars(vars(&[
            ("PAYPAL_CLIENT_ID", "client"),
            ("PAYPAL_CLIENT_SECRET", "secret"),
            ("PAYPAL_MODE", "production"),
        ]));
        assert!(bad_mode.is_err());

        let bad_timeout = PayPalConfig::from_vars(vars(&[
            ("PAYPAL_CLIENT_ID", "client"),
            ("PAYPAL_CLIENT_SECRET", "secret"),
            ("PAYPAL_AUTH_TIMEOUT_SECS", "0"),
        ]));
        assert!(bad_timeout.is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = PayPalConfig::new("client", "super-secret");
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
