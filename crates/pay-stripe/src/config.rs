//! # Stripe Configuration
//!
//! Configuration management for Stripe integration.
//! All secrets are loaded from environment variables.

use pay_core::config::{parse_positive, parse_secs};
use pay_core::ConfigError;
use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";
pub const API_VERSION: &str = "2024-12-18.acacia";

/// Largest unit price (in the session currency) a catalog item may carry
pub const DEFAULT_PRICE_CEILING: f64 = 100_000.0;

/// Webhook timestamps further than this from now are rejected
pub const DEFAULT_WEBHOOK_TOLERANCE: Duration = Duration::from_secs(300);

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_CLIENT_URL: &str = "http://localhost:3000";

/// Stripe API configuration
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (sk_test_... or sk_live_...)
    pub secret_key: String,

    /// Webhook signing secret (whsec_...)
    pub webhook_secret: String,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// API version
    pub api_version: String,

    pub request_timeout: Duration,

    pub webhook_tolerance: Duration,

    /// Storefront origin used for success and cancel redirects
    pub client_url: String,

    pub price_ceiling: f64,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"<redacted>")
            .field("webhook_secret", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("api_version", &self.api_version)
            .field("request_timeout", &self.request_timeout)
            .field("webhook_tolerance", &self.webhook_tolerance)
            .field("client_url", &self.client_url)
            .field("price_ceiling", &self.price_ceiling)
            .finish()
    }
}

impl StripeConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `STRIPE_SECRET_KEY`
    /// - `STRIPE_WEBHOOK_SECRET`
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from any key lookup (environment, map in tests)
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret_key = get("STRIPE_SECRET_KEY")
            .ok_or_else(|| ConfigError("STRIPE_SECRET_KEY not set".to_string()))?;

        let webhook_secret = get("STRIPE_WEBHOOK_SECRET")
            .ok_or_else(|| ConfigError("STRIPE_WEBHOOK_SECRET not set".to_string()))?;

        // Validate key formats
        if !secret_key.starts_with("sk_test_") && !secret_key.starts_with("sk_live_") {
            return Err(ConfigError(
                "STRIPE_SECRET_KEY must start with sk_test_ or sk_live_".to_string(),
            ));
        }

        if !webhook_secret.starts_with("whsec_") {
            return Err(ConfigError(
                "STRIPE_WEBHOOK_SECRET must start with whsec_".to_string(),
            ));
        }

        let mut config = Self::new(secret_key, webhook_secret);

        if let Some(base) = get("STRIPE_API_BASE").filter(|v| !v.trim().is_empty()) {
            config = config.with_api_base_url(base);
        }
        if let Some(url) = get("CLIENT_URL").filter(|v| !v.trim().is_empty()) {
            config = config.with_client_url(url);
        }
        if let Some(secs) = get("STRIPE_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = parse_secs("STRIPE_REQUEST_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = get("STRIPE_WEBHOOK_TOLERANCE_SECS") {
            config.webhook_tolerance = parse_secs("STRIPE_WEBHOOK_TOLERANCE_SECS", &secs)?;
        }
        if let Some(raw) = get("CHECKOUT_PRICE_CEILING") {
            config.price_ceiling = parse_positive("CHECKOUT_PRICE_CEILING", &raw)?;
        }

        Ok(config)
    }

    /// Create config with explicit values (for testing)
    pub fn new(secret_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            webhook_secret: webhook_secret.into(),
            api_base_url: DEFAULT_API_BASE.to_string(),
            api_version: API_VERSION.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            webhook_tolerance: DEFAULT_WEBHOOK_TOLERANCE,
            client_url: DEFAULT_CLIENT_URL.to_string(),
            price_ceiling: DEFAULT_PRICE_CEILING,
        }
    }

    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.secret_key.starts_with("sk_test_")
    }

    /// Check if using live keys
    pub fn is_live_mode(&self) -> bool {
        self.secret_key.starts_with("sk_live_")
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.secret_key)
    }

    /// Redirect after a paid session; Stripe fills in the session id
    pub fn success_url(&self) -> String {
        format!("{}/success?session_id={{CHECKOUT_SESSION_ID}}", self.client_url)
    }

    pub fn cancel_url(&self) -> String {
        format!("{}/cancel", self.client_url)
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_client_url(mut self, url: impl Into<String>) -> Self {
        self.client_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_webhook_tolerance(mut self, tolerance: Duration) -> Self {
        self.webhook_tolerance = tolerance;
        self
    }

    pub fn with_price_ceiling(mut self, ceiling: f64) -> Self {
        self.price_ceiling = ceiling;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pay_core::config::vars_from_pairs as vars;


    #[test]
    fn test_config_validation() {
        // Valid test keys
        let config = StripeConfig::new("sk_test_abc123", "whsec_secret");
        assert!(config.is_test_mode());
        assert!(!config.is_live_mode());

        // Valid live keys
        let config = StripeConfig::new("sk_live_abc123", "whsec_secret");
        assert!(!config.is_test_mode());
        assert!(config.is_live_mode());
    }

    #[test]
    fn test_auth_header() {
        let config = StripeConfig::new("sk_test_abc123", "whsec_secret");
        assert_eq!(config.auth_header(), "Bearer sk_test_abc123");
    }

    #[test]
    fn test_from_vars() {
        let config = StripeConfig::from_vars(vars(&[
            ("STRIPE_SECRET_KEY", "sk_test_abc"),
            ("STRIPE_WEBHOOK_SECRET", "whsec_abc"),
            ("CLIENT_URL", "https://shop.example.com/"),
            ("STRIPE_WEBHOOK_TOLERANCE_SECS", "120"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, DEFAULT_API_BASE);
        assert_eq!(config.webhook_tolerance, Duration::from_secs(120));
        assert_eq!(config.price_ceiling, DEFAULT_PRICE_CEILING);
        assert_eq!(
            config.success_url(),
            "https://shop.example.com/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(config.cancel_url(), "https://shop.example.com/cancel");
    }

    #[test]
    fn test_from_vars_rejects_bad_keys() {
        assert!(StripeConfig::from_vars(vars(&[("STRIPE_WEBHOOK_SECRET", "whsec_abc")])).is_err());
        assert!(StripeConfig::from_vars(vars(&[
            ("STRIPE_SECRET_KEY", "pk_test_abc"),
            ("STRIPE_WEBHOOK_SECRET", "whsec_abc"),
        ]))
        .is_err());
        assert!(StripeConfig::from_vars(vars(&[
            ("STRIPE_SECRET_KEY", "sk_test_abc"),
            ("STRIPE_WEBHOOK_SECRET", "secret"),
        ]))
        .is_err());
        assert!(StripeConfig::from_vars(vars(&[
            ("STRIPE_SECRET_KEY", "sk_test_abc"),
            ("STRIPE_WEBHOOK_SECRET", "whsec_abc"),
            ("CHECKOUT_PRICE_CEILING", "-1"),
        ]))
        .is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = StripeConfig::new("sk_test_topsecret", "whsec_topsecret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("topsecret"));
    }
}
