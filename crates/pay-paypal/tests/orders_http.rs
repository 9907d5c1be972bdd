//! Order flows against a mocked Orders API

use pay_core::{CartLine, OrderError, OrderStatus, ValidationError};
use pay_paypal::{OrderOrchestrator, PayPalConfig};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A21AA-integration",
            "token_type": "Bearer",
            "expires_in": 32400
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn orders(server: &MockServer, expose_details: bool) -> OrderOrchestrator {
    let config = PayPalConfig::new("client-id", "client-secret")
        .with_api_base_url(server.uri())
        .with_request_timeout(Duration::from_secs(2));
    OrderOrchestrator::from_config(config, expose_details).unwrap()
}

#[tokio::test]
async fn create_then_capture_reuses_token() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/v2/checkout/orders"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "ORDER-123",
            "status": "CREATED",
            "links": [
                { "href": "https://www.sandbox.paypal.com/checkoutnow?token=ORDER-123", "rel": "approve", "method": "GET" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v2/checkout/orders/ORDER-123/capture"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "ORDER-123",
            "status": "COMPLETED",
            "purchase_units": [{
                "payments": { "captures": [{
                    "id": "CAPTURE-1",
                    "status": "COMPLETED",
                    "amount": { "currency_code": "USD", "value": "100.00" }
                }]}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let orders = orders(&server, false);
    let cart = vec![CartLine::new("Silver Ring", "50.00", "USD", "2")];

    let created = orders.create(&cart).await.unwrap();
    assert_eq!(created.id, "ORDER-123");
    assert_eq!(created.status, OrderStatus::Created);

    let captured = orders.capture(&created.id).await.unwrap();
    assert_eq!(captured.status, OrderStatus::Completed);
    assert_eq!(captured.captures[0].amount.to_string(), "100.00");
}

#[tokio::test]
async fn mixed_currency_cart_makes_no_calls() {
    let server = MockServer::start().await;
    mount_token(&server, 0).await;
    Mock::given(method("POST"))
        .and(path("/v2/checkout/orders"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let cart = vec![
        CartLine::new("Ring", "50.00", "USD", "1"),
        CartLine::new("Bracelet", "180.00", "ILS", "1"),
    ];
    let err = orders(&server, false).create(&cart).await.unwrap_err();

    assert!(matches!(
        err,
        OrderError::Validation(ValidationError::MixedCurrencyCart { .. })
    ));
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn capture_not_approved_keeps_debug_id() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/v2/checkout/orders/ORDER-9/capture"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "name": "UNPROCESSABLE_ENTITY",
            "message": "The requested action could not be performed, semantically incorrect, or failed business validation.",
            "debug_id": "c6e4b0a1d2f3",
            "details": [{
                "issue": "ORDER_NOT_APPROVED",
                "description": "Payer has not yet approved the Order for payment."
            }]
        })))
        .mount(&server)
        .await;

    let err = orders(&server, false).capture("ORDER-9").await.unwrap_err();

    assert!(matches!(err, OrderError::NotApproved(_)));
    assert_eq!(err.debug_id(), Some("c6e4b0a1d2f3"));
    assert!(err.provider_context().unwrap().details.is_none());
}

#[tokio::test]
async fn slow_provider_times_out() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/v2/checkout/orders"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "id": "ORDER-1", "status": "CREATED", "links": [] }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let cart = vec![CartLine::new("Ring", "50.00", "USD", "1")];
    let err = orders(&server, false).create(&cart).await.unwrap_err();

    assert!(matches!(err, OrderError::Timeout));
    assert_eq!(err.status_code(), 504);
}
