//! # pay-paypal
//!
//! Order/capture provider integration for paybridge.
//!
//! - [`PayPalClient`] speaks the Orders v2 REST API
//! - [`TokenCache`] keeps one OAuth access token, refreshed single-flight
//! - [`ErrorTaxonomyMapper`] turns provider error bodies into [`pay_core::OrderError`]
//! - [`OrderOrchestrator`] runs create and capture end to end
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pay_paypal::{OrderOrchestrator, PayPalConfig};
//!
//! let orders = OrderOrchestrator::from_config(PayPalConfig::from_env()?, false)?;
//!
//! let created = orders.create(&cart).await?;
//! // Redirect the payer to created.approve_url, then later:
//! let captured = orders.capture(&created.id).await?;
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod orders;

// Re-exports
pub use auth::{TokenCache, TokenSource, REFRESH_SKEW};
pub use client::PayPalClient;
pub use config::{PayPalConfig, PayPalMode};
pub use errors::ErrorTaxonomyMapper;
pub use orders::OrderOrchestrator;
