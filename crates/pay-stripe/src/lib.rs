//! # pay-stripe
//!
//! Hosted checkout provider integration for paybridge.
//!
//! 1. **CheckoutOrchestrator** - Checkout Sessions API
//!    - Prices every line from the product catalog
//!    - USD or ILS (converted with the configured exchange rate)
//!    - Idempotency key per session request
//!
//! 2. **WebhookHandler** - signed asynchronous notifications
//!    - HMAC-SHA256 verification with timestamp tolerance
//!    - Fulfillment hook for completed checkouts
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pay_stripe::{CheckoutOrchestrator, StripeConfig};
//!
//! let checkout = CheckoutOrchestrator::from_config(StripeConfig::from_env()?, catalog, rates)?;
//! let session = checkout.create_session(&items, "usd").await?;
//!
//! // Redirect user to session.url
//! ```
//!
//! ## Webhook Handling
//!
//! ```rust,ignore
//! use pay_stripe::{LoggingFulfillment, WebhookHandler, WebhookOutcome, WebhookVerifier};
//!
//! let handler = WebhookHandler::new(
//!     WebhookVerifier::new(config.webhook_secret.clone(), config.webhook_tolerance),
//!     Arc::new(LoggingFulfillment),
//! );
//!
//! // In your webhook endpoint (raw body, never pre-parsed):
//! match handler.handle(&body, signature_header).await {
//!     WebhookOutcome::Acknowledged => { /* 200 */ }
//!     WebhookOutcome::Rejected => { /* 400 */ }
//!     WebhookOutcome::Malformed => { /* 500 */ }
//! }
//! ```

pub mod checkout;
pub mod client;
pub mod config;
pub mod signature;
pub mod webhook;

// Re-exports
pub use checkout::{CheckoutOrchestrator, CheckoutSettings};
pub use client::StripeClient;
pub use config::StripeConfig;
pub use signature::WebhookVerifier;
pub use webhook::{
    CheckoutCompletedData, FulfillmentHandler, LoggingFulfillment, WebhookHandler, WebhookOutcome,
};
