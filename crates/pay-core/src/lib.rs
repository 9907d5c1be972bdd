//! # pay-core
//!
//! Core types and traits for the paybridge payment orchestration layer.
//!
//! This crate provides:
//! - [`cart::validate`] for cart shape, amount and currency checks
//! - `ProductCatalog` and `ExchangeRateSource` collaborator traits
//! - `OrderGateway` and `SessionGateway` seams for provider clients
//! - Order, checkout session and webhook event types
//! - `config` value parsers shared by the env loaders
//! - The unified error taxonomy (`OrderError`, `CheckoutError`, `WebhookError`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use pay_core::{validate, CartLine};
//!
//! let cart = vec![CartLine::new("Silver Ring", "50.00", "USD", "1")];
//! let validated = validate(&cart)?;
//!
//! // Only a ValidatedCart can be handed to an OrderGateway
//! let order = gateway.create_order(&token, &validated).await?;
//! ```

pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod gateway;
pub mod order;
pub mod product;
pub mod webhook;

// Re-exports for convenience
pub use cart::{validate, CartLine, RawQuantity, UnitAmount, ValidatedCart, ValidatedLine};
pub use checkout::{CheckoutItem, CheckoutSession, CheckoutStatus, SessionLine, SessionRequest};
pub use error::{
    AuthError, CheckoutError, ConfigError, ErrorKind, OrderError, ProviderContext, ProviderIssue,
    SignatureError, ValidationError, WebhookError,
};
pub use gateway::{AccessToken, GatewayFailure, OrderGateway, SessionGateway};
pub use order::{CaptureRecord, CapturedOrder, CreatedOrder, Link, OrderStatus, ProviderOrder};
pub use product::{
    CatalogProduct, CollaboratorError, Currency, ExchangeRateSource, FixedExchangeRate,
    InMemoryCatalog, ProductCatalog,
};
pub use webhook::{WebhookEvent, WebhookEventType};
