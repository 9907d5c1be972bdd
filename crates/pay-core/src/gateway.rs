//! # Provider Gateways
//!
//! Narrow seams between the orchestrators and the provider HTTP clients.
//! Orchestration logic only sees these traits and the domain types they
//! carry, never a provider client's own request/response structs.
//!
//! ```text
//! ┌──────────────────────┐        ┌──────────────────────┐
//! │  OrderOrchestrator   │        │ CheckoutOrchestrator │
//! └──────────┬───────────┘        └──────────┬───────────┘
//!            │ OrderGateway                  │ SessionGateway
//!            │  ├── create_order()           │  └── create_session()
//!            │  └── capture_order()          │
//!  ┌─────────┴─────────┐           ┌─────────┴─────────┐
//!  │   PayPalClient    │           │   StripeClient    │
//!  └───────────────────┘           └───────────────────┘
//! ```

use crate::cart::ValidatedCart;
use crate::checkout::{CheckoutSession, SessionRequest};
use crate::order::{CapturedOrder, ProviderOrder};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Short-lived bearer token for the order provider
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    expires_in: Duration,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_in: Duration) -> Self {
        Self {
            value: value.into(),
            expires_in,
        }
    }

    pub fn secret(&self) -> &str {
        &self.value
    }

    /// Lifetime reported by the provider at issue time
    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    /// Get authorization header value
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.value)
    }
}

// tokens must never end up in logs
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// How a gateway call failed, before any provider-specific mapping
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayFailure {
    /// Provider answered with a non-2xx status
    #[error("HTTP {status}")]
    Status { status: u16, body: String },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Transport(String),

    /// 2xx response we could not interpret
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Order/capture style provider
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Create a pending order for an already validated cart.
    async fn create_order(
        &self,
        token: &AccessToken,
        cart: &ValidatedCart,
    ) -> Result<ProviderOrder, GatewayFailure>;

    /// Capture funds on an approved order.
    async fn capture_order(
        &self,
        token: &AccessToken,
        order_id: &str,
    ) -> Result<CapturedOrder, GatewayFailure>;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

/// Hosted checkout style provider
#[async_trait]
pub trait SessionGateway: Send + Sync {
    /// Create a hosted checkout session and return its redirect URL.
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<CheckoutSession, GatewayFailure>;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_redacted() {
        let token = AccessToken::new("A21AAF-secret", Duration::from_secs(32400));
        let debug = format!("{token:?}");

        assert!(!debug.contains("A21AAF"));
        assert_eq!(token.bearer(), "Bearer A21AAF-secret");
        assert_eq!(token.expires_in(), Duration::from_secs(32400));
    }

    #[test]
    fn test_gateway_failure_display() {
        let failure = GatewayFailure::Status {
            status: 422,
            body: "{}".into(),
        };
        assert_eq!(failure.to_string(), "HTTP 422");
    }
}
