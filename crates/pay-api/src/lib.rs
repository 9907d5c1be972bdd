//! # pay-api
//!
//! HTTP API layer for paybridge.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Order create/capture and hosted checkout endpoints
//! - Webhook endpoint for payment events
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/orders` | Create order from cart |
//! | POST | `/orders/{order_id}/capture` | Capture approved order |
//! | POST | `/create-checkout-session` | Create hosted checkout session |
//! | POST | `/webhook` | Stripe webhook |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
