//! # Payment Error Types
//!
//! Typed error taxonomy for paybridge. Each component boundary returns
//! its own enum; all of them report an [`ErrorKind`] and an HTTP status
//! so the API layer never has to know provider wire formats.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse grouping of every error this crate can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Detected locally, never forwarded to a provider
    Validation,
    /// Derived from a real provider response
    Provider,
    /// Auth, timeouts, transport and malformed payloads
    Infrastructure,
    /// Webhook signature could not be verified
    Signature,
}

/// Missing or invalid startup configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Configuration error: {0}")]
pub struct ConfigError(pub String);

/// Locally detected request problems
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Line {line}: invalid amount {value:?}")]
    InvalidAmount { line: usize, value: String },

    #[error("Line {line}: invalid quantity {value:?}")]
    InvalidQuantity { line: usize, value: String },

    #[error("Line {line}: total exceeds the largest supported amount")]
    AmountOverflow { line: usize },

    #[error("Cart mixes currencies: {}", .currencies.join(", "))]
    MixedCurrencyCart { currencies: Vec<String> },

    #[error("No items in checkout request")]
    MissingItems,

    #[error("Invalid product id: {0:?}")]
    InvalidProductId(String),

    #[error("Product not found: {0}")]
    ProductNotFound(u64),

    #[error("Product out of stock: {0}")]
    OutOfStock(u64),

    /// Catalog data produced a free, negative or absurd price
    #[error("Invalid price for product {product_id}: {reason}")]
    InvalidPrice { product_id: u64, reason: String },

    #[error("Order id must not be blank")]
    InvalidOrderId,

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),
}

impl ValidationError {
    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ValidationError::ProductNotFound(_) => 404,
            // corrupted catalog data is a server-side fault
            ValidationError::InvalidPrice { .. } => 500,
            _ => 400,
        }
    }
}

/// A single issue reported by a provider alongside an error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderIssue {
    pub issue: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// What we keep from a provider error response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProviderContext {
    /// HTTP status returned by the provider
    pub status: u16,

    /// Provider's error name (e.g. `UNPROCESSABLE_ENTITY`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Human readable message
    pub message: String,

    /// Opaque identifier for support escalation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_id: Option<String>,

    /// Raw issue list, only retained outside production
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ProviderIssue>>,
}

/// Failure obtaining a provider access token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Token request rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Token request timed out")]
    Timeout,

    #[error("Token request failed: {0}")]
    Transport(String),

    #[error("Malformed token response: {0}")]
    MalformedResponse(String),
}

/// Errors from the order/capture flow
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid request: {}", .0.message)]
    InvalidRequest(ProviderContext),

    #[error("Order cannot be processed: {}", .0.message)]
    Unprocessable(ProviderContext),

    #[error("Order already captured")]
    AlreadyCaptured(ProviderContext),

    #[error("Order has not been approved by the payer")]
    NotApproved(ProviderContext),

    #[error("Order not found")]
    OrderNotFound(ProviderContext),

    #[error("Payment provider unavailable (HTTP {})", .0.status)]
    UpstreamUnavailable(ProviderContext),

    #[error("Payment provider authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Payment provider did not respond in time")]
    Timeout,

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Unexpected provider response: {0}")]
    MalformedResponse(String),
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::Validation(_) => ErrorKind::Validation,
            OrderError::InvalidRequest(_)
            | OrderError::Unprocessable(_)
            | OrderError::AlreadyCaptured(_)
            | OrderError::NotApproved(_)
            | OrderError::OrderNotFound(_)
            | OrderError::UpstreamUnavailable(_) => ErrorKind::Provider,
            OrderError::Auth(_)
            | OrderError::Timeout
            | OrderError::Transport(_)
            | OrderError::MalformedResponse(_) => ErrorKind::Infrastructure,
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            OrderError::Validation(err) => err.status_code(),
            OrderError::InvalidRequest(_) => 400,
            OrderError::OrderNotFound(_) => 404,
            OrderError::Unprocessable(_)
            | OrderError::AlreadyCaptured(_)
            | OrderError::NotApproved(_) => 422,
            OrderError::UpstreamUnavailable(_) => 502,
            OrderError::Auth(_) => 500,
            OrderError::Timeout => 504,
            OrderError::Transport(_) | OrderError::MalformedResponse(_) => 502,
        }
    }

    /// Provider details, if this error came from a provider response
    pub fn provider_context(&self) -> Option<&ProviderContext> {
        match self {
            OrderError::InvalidRequest(ctx)
            | OrderError::Unprocessable(ctx)
            | OrderError::AlreadyCaptured(ctx)
            | OrderError::NotApproved(ctx)
            | OrderError::OrderNotFound(ctx)
            | OrderError::UpstreamUnavailable(ctx) => Some(ctx),
            _ => None,
        }
    }

    pub fn debug_id(&self) -> Option<&str> {
        self.provider_context().and_then(|ctx| ctx.debug_id.as_deref())
    }

    /// Advisory only: this layer never retries on its own.
    ///
    /// Order creation is not idempotent at the provider, so a timed-out
    /// create must be checked for existence before any retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OrderError::UpstreamUnavailable(_) | OrderError::Transport(_)
        )
    }
}

/// Errors from hosted checkout session creation
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Catalog lookup failed: {0}")]
    Catalog(String),

    #[error("Exchange rate unavailable: {0}")]
    ExchangeRate(String),

    #[error("Payment provider error: {message}")]
    UpstreamError {
        status: Option<u16>,
        message: String,
    },

    #[error("Payment provider did not respond in time")]
    Timeout,

    #[error("Network error: {0}")]
    Transport(String),
}

impl CheckoutError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckoutError::Validation(_) => ErrorKind::Validation,
            CheckoutError::UpstreamError { .. } => ErrorKind::Provider,
            CheckoutError::Catalog(_)
            | CheckoutError::ExchangeRate(_)
            | CheckoutError::Timeout
            | CheckoutError::Transport(_) => ErrorKind::Infrastructure,
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CheckoutError::Validation(err) => err.status_code(),
            CheckoutError::Catalog(_) | CheckoutError::ExchangeRate(_) => 500,
            CheckoutError::UpstreamError { .. } | CheckoutError::Transport(_) => 502,
            CheckoutError::Timeout => 504,
        }
    }
}

/// Why a webhook signature was rejected.
///
/// The reason is for logs only; callers always see a flat failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature header missing")]
    MissingHeader,

    #[error("signature header malformed: {0}")]
    MalformedHeader(String),

    #[error("payload is empty")]
    EmptyPayload,

    #[error("timestamp outside tolerance ({age_secs}s)")]
    TimestampOutsideTolerance { age_secs: i64 },

    #[error("no signature matched")]
    NoMatchingSignature,
}

/// Errors from webhook verification and parsing
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Webhook verification failed: {0}")]
    Signature(#[from] SignatureError),

    /// Signature was valid but the payload is not a usable event
    #[error("Malformed webhook event: {0}")]
    MalformedEvent(String),
}

impl WebhookError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WebhookError::Signature(_) => ErrorKind::Signature,
            WebhookError::MalformedEvent(_) => ErrorKind::Infrastructure,
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            WebhookError::Signature(_) => 400,
            WebhookError::MalformedEvent(_) => 500,
        }
    }
}
