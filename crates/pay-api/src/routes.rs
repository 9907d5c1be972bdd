//! # Routes
//!
//! Axum router configuration for the payment API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Orders (PayPal):
///   - POST /orders - Create order from cart
///   - POST /orders/{order_id}/capture - Capture approved order
///
/// - Hosted checkout (Stripe):
///   - POST /create-checkout-session - Create checkout session
///
/// - Webhooks:
///   - POST /webhook - Stripe webhook handler
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(state.config.client_origin.clone());

    // Browser-facing routes
    let api_routes = Router::new()
        .route("/orders", post(handlers::create_order))
        .route("/orders/{order_id}/capture", post(handlers::capture_order))
        .route(
            "/create-checkout-session",
            post(handlers::create_checkout_session),
        )
        .layer(cors);

    // Webhook routes (no CORS, must accept raw body)
    let webhook_routes = Router::new().route("/webhook", post(handlers::stripe_webhook));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .merge(api_routes)
        .merge(webhook_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Only the storefront origin may call the API
fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}
