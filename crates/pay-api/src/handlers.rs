//! # Request Handlers
//!
//! Axum request handlers for the payment API.
//! Order/capture goes to PayPal, hosted checkout and webhooks to Stripe.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use pay_core::{
    CapturedOrder, CartLine, CheckoutError, CheckoutItem, ErrorKind, Link, OrderError, OrderStatus,
};
use pay_stripe::WebhookOutcome;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, field, info, instrument, warn, Span};

pub const SIGNATURE_HEADER: &str = "stripe-signature";

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create order request
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub cart: Vec<CartLine>,
}

/// Create order response
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub id: String,
    pub status: OrderStatus,
    pub links: Vec<Link>,
}

/// Capture response, shaped like the provider's own capture body
#[derive(Debug, Serialize)]
pub struct CaptureOrderResponse {
    pub id: String,
    pub status: OrderStatus,
    pub purchase_units: Vec<PurchaseUnit>,
}

#[derive(Debug, Serialize)]
pub struct PurchaseUnit {
    pub payments: Payments,
}

#[derive(Debug, Serialize)]
pub struct Payments {
    pub captures: Vec<CaptureBody>,
}

#[derive(Debug, Serialize)]
pub struct CaptureBody {
    pub id: String,
    pub status: String,
    pub amount: AmountBody,
}

#[derive(Debug, Serialize)]
pub struct AmountBody {
    pub currency_code: String,
    pub value: String,
}

impl From<CapturedOrder> for CaptureOrderResponse {
    fn from(order: CapturedOrder) -> Self {
        let captures = order
            .captures
            .into_iter()
            .map(|c| CaptureBody {
                id: c.id,
                status: c.status,
                amount: AmountBody {
                    currency_code: c.currency_code,
                    value: c.amount.to_string(),
                },
            })
            .collect();

        Self {
            id: order.id,
            status: order.status,
            purchase_units: vec![PurchaseUnit {
                payments: Payments { captures },
            }],
        }
    }
}

/// Create checkout session request
#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
    /// `usd` or `ils`, defaults to `usd`
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "usd".to_string()
}

/// Create checkout session response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutResponse {
    pub session_id: String,
    /// Hosted payment page (redirect user here)
    pub url: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16, kind: ErrorKind) -> Self {
        Self {
            error: error.into(),
            code,
            kind,
            debug_id: None,
            details: None,
        }
    }

    pub fn with_debug_id(mut self, debug_id: Option<&str>) -> Self {
        self.debug_id = debug_id.map(String::from);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Caller-facing text for an error. Infrastructure failures carry URLs and
/// transport internals, so they get a fixed message and the detail stays in
/// the logs.
fn public_message(message: String, code: u16, kind: ErrorKind) -> String {
    if kind != ErrorKind::Infrastructure {
        return message;
    }
    error!(code, "Infrastructure failure: {}", message);
    match code {
        504 => "Payment provider did not respond in time",
        500 => "Internal server error",
        _ => "Payment provider unavailable",
    }
    .to_string()
}

pub fn order_error_to_response(err: &OrderError, expose_details: bool) -> ApiError {
    let code = err.status_code();
    let kind = err.kind();
    let mut response = ErrorResponse::new(public_message(err.to_string(), code, kind), code, kind)
        .with_debug_id(err.debug_id());

    if expose_details && kind == ErrorKind::Infrastructure {
        response = response.with_details(json!({ "message": err.to_string() }));
    } else if expose_details {
        let details = err
            .provider_context()
            .and_then(|ctx| ctx.details.as_ref())
            .and_then(|issues| serde_json::to_value(issues).ok());
        if let Some(details) = details {
            response = response.with_details(details);
        }
    }

    (status(code), Json(response))
}

pub fn checkout_error_to_response(err: &CheckoutError, expose_details: bool) -> ApiError {
    let code = err.status_code();
    let kind = err.kind();
    let mut response = ErrorResponse::new(public_message(err.to_string(), code, kind), code, kind);

    if expose_details && kind == ErrorKind::Infrastructure {
        response = response.with_details(json!({ "message": err.to_string() }));
    } else if expose_details {
        if let CheckoutError::UpstreamError {
            status: Some(upstream),
            ..
        } = err
        {
            response = response.with_details(json!({ "upstream_status": upstream }));
        }
    }

    (status(code), Json(response))
}

/// Unwrap a JSON body, turning axum's plain-text rejection into a
/// validation `ErrorResponse`.
fn json_body<T>(
    payload: Result<Json<T>, JsonRejection>,
    expose_details: bool,
) -> Result<T, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            warn!(status = %rejection.status(), "Rejected request body: {}", rejection.body_text());
            let mut response = ErrorResponse::new("Invalid request body", 400, ErrorKind::Validation);
            if expose_details {
                response = response.with_details(json!({ "reason": rejection.body_text() }));
            }
            Err((StatusCode::BAD_REQUEST, Json(response)))
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "paybridge",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
    }))
}

/// Create a provider order from the storefront cart
#[instrument(skip(state, payload), fields(lines = field::Empty))]
pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError> {
    let request = json_body(payload, state.expose_details())?;
    Span::current().record("lines", request.cart.len());

    let order = state
        .orders
        .create(&request.cart)
        .await
        .map_err(|e| order_error_to_response(&e, state.expose_details()))?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            id: order.id,
            status: order.status,
            links: order.links,
        }),
    ))
}

/// Capture a payer-approved order
#[instrument(skip(state))]
pub async fn capture_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<CaptureOrderResponse>, ApiError> {
    let captured = state
        .orders
        .capture(&order_id)
        .await
        .map_err(|e| order_error_to_response(&e, state.expose_details()))?;

    Ok(Json(captured.into()))
}

/// Create a hosted checkout session priced from the catalog
#[instrument(skip(state, payload), fields(items = field::Empty, currency = field::Empty))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    payload: Result<Json<CreateCheckoutRequest>, JsonRejection>,
) -> Result<Json<CreateCheckoutResponse>, ApiError> {
    let request = json_body(payload, state.expose_details())?;
    Span::current()
        .record("items", request.items.len())
        .record("currency", request.currency.as_str());

    let session = state
        .checkout
        .create_session(&request.items, &request.currency)
        .await
        .map_err(|e| checkout_error_to_response(&e, state.expose_details()))?;

    info!("Created checkout session: {}", session.session_id);

    Ok(Json(CreateCheckoutResponse {
        session_id: session.session_id,
        url: session.url,
    }))
}

/// Handle Stripe webhook. The body must reach the verifier untouched.
#[instrument(skip(state, headers, body), fields(bytes = body.len()))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let outcome = state.webhooks.handle(&body, signature).await;
    let code = status(outcome.status_code());

    match outcome {
        WebhookOutcome::Acknowledged => (code, Json(json!({ "received": true }))),
        WebhookOutcome::Rejected => {
            warn!("Rejected webhook delivery");
            (code, Json(json!({ "error": "verification failed" })))
        }
        WebhookOutcome::Malformed => (code, Json(json!({ "error": "malformed event" }))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pay_core::{CaptureRecord, ProviderContext, ProviderIssue, ValidationError};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn not_approved() -> OrderError {
        OrderError::NotApproved(ProviderContext {
            status: 422,
            name: Some("UNPROCESSABLE_ENTITY".into()),
            message: "Payer has not approved".into(),
            debug_id: Some("dbg-1".into()),
            details: Some(vec![ProviderIssue {
                issue: "ORDER_NOT_APPROVED".into(),
                description: None,
                field: None,
                location: None,
            }]),
        })
    }

    #[test]
    fn test_order_error_response_hides_details_in_production() {
        let (code, Json(body)) = order_error_to_response(&not_approved(), false);
        assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.kind, ErrorKind::Provider);
        assert_eq!(body.debug_id.as_deref(), Some("dbg-1"));
        assert!(body.details.is_none());

        let (_, Json(body)) = order_error_to_response(&not_approved(), true);
        assert_eq!(body.details.unwrap()[0]["issue"], "ORDER_NOT_APPROVED");
    }

    #[test]
    fn test_validation_error_conversion() {
        let err = OrderError::from(ValidationError::EmptyCart);
        let (code, Json(body)) = order_error_to_response(&err, true);
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(body.kind, ErrorKind::Validation);
        assert!(body.debug_id.is_none());
    }

    #[test]
    fn test_checkout_error_conversion() {
        let err = CheckoutError::Validation(ValidationError::InvalidPrice {
            product_id: 3,
            reason: "price must be positive".into(),
        });
        let (code, _) = checkout_error_to_response(&err, false);
        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);

        let (code, _) = checkout_error_to_response(&CheckoutError::Timeout, false);
        assert_eq!(code, StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_infrastructure_error_message_is_generic() {
        let err = OrderError::Transport(
            "error sending request for url (https://api-m.paypal.com/v2/checkout/orders)".into(),
        );
        let (code, Json(body)) = order_error_to_response(&err, false);
        assert_eq!(code, StatusCode::BAD_GATEWAY);
        assert_eq!(body.kind, ErrorKind::Infrastructure);
        assert_eq!(body.error, "Payment provider unavailable");
        assert!(body.details.is_none());

        let (_, Json(body)) = order_error_to_response(&err, true);
        assert!(!body.error.contains("paypal.com"));
        assert!(body.details.unwrap()["message"]
            .as_str()
            .unwrap()
            .contains("api-m.paypal.com"));

        let auth = OrderError::Auth(pay_core::AuthError::Transport("connect refused 10.0.0.5".into()));
        let (code, Json(body)) = order_error_to_response(&auth, false);
        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Internal server error");

        let (_, Json(body)) =
            checkout_error_to_response(&CheckoutError::Transport("dns error: api.stripe.com".into()), false);
        assert_eq!(body.error, "Payment provider unavailable");
    }

    #[test]
    fn test_provider_error_message_is_kept() {
        let (_, Json(body)) = order_error_to_response(&not_approved(), false);
        assert_eq!(body.error, "Order has not been approved by the payer");
    }

    #[test]
    fn test_capture_response_shape() {
        let captured = CapturedOrder {
            id: "ORDER-123".into(),
            status: OrderStatus::Completed,
            captures: vec![CaptureRecord {
                id: "CAP-1".into(),
                status: "COMPLETED".into(),
                amount: Decimal::from_str("100.00").unwrap(),
                currency_code: "USD".into(),
            }],
        };

        let body = serde_json::to_value(CaptureOrderResponse::from(captured)).unwrap();
        assert_eq!(body["status"], "COMPLETED");
        let capture = &body["purchase_units"][0]["payments"]["captures"][0];
        assert_eq!(capture["id"], "CAP-1");
        assert_eq!(capture["amount"]["value"], "100.00");
        assert_eq!(capture["amount"]["currency_code"], "USD");
    }
}
