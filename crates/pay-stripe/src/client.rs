//! # Stripe Checkout Sessions Client
//!
//! reqwest implementation of [`SessionGateway`] against the Checkout
//! Sessions API.

use crate::config::StripeConfig;
use async_trait::async_trait;
use chrono::DateTime;
use pay_core::{
    CheckoutSession, CheckoutStatus, ConfigError, GatewayFailure, SessionGateway, SessionRequest,
};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

/// Stripe Checkout Session client
///
/// Uses Stripe's hosted checkout page for secure payments.
pub struct StripeClient {
    config: StripeConfig,
    client: Client,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(StripeConfig::from_env()?)
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// Form-encode a session request the way the Stripe API expects
    fn form_params(request: &SessionRequest) -> Vec<(String, String)> {
        let mut form_params: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
        ];

        for (i, line) in request.lines.iter().enumerate() {
            form_params.push((
                format!("line_items[{}][price_data][currency]", i),
                request.currency.as_str().to_string(),
            ));
            form_params.push((
                format!("line_items[{}][price_data][unit_amount]", i),
                line.unit_amount.to_string(),
            ));
            form_params.push((
                format!("line_items[{}][price_data][product_data][name]", i),
                line.name.clone(),
            ));
            if let Some(ref desc) = line.description {
                form_params.push((
                    format!("line_items[{}][price_data][product_data][description]", i),
                    desc.clone(),
                ));
            }
            if let Some(ref img) = line.image_url {
                form_params.push((
                    format!("line_items[{}][price_data][product_data][images][0]", i),
                    img.clone(),
                ));
            }
            form_params.push((
                format!("line_items[{}][price_data][product_data][metadata][product_id]", i),
                line.product_id.to_string(),
            ));
            form_params.push((
                format!("line_items[{}][quantity]", i),
                line.quantity.to_string(),
            ));
        }

        let mut metadata: Vec<_> = request.metadata.iter().collect();
        metadata.sort();
        for (key, value) in metadata {
            form_params.push((format!("metadata[{}]", key), value.clone()));
        }

        form_params
    }
}

#[async_trait]
impl SessionGateway for StripeClient {
    #[instrument(skip(self, request), fields(currency = request.currency.as_str(), lines = request.lines.len()))]
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<CheckoutSession, GatewayFailure> {
        let form_params = Self::form_params(request);
        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);

        debug!(lines = request.lines.len(), "Creating Stripe checkout session");

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .header("Idempotency-Key", &request.idempotency_key)
            .form(&form_params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayFailure::Timeout
                } else {
                    GatewayFailure::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayFailure::Transport(e.to_string()))?;

        if !status.is_success() {
            error!(status = status.as_u16(), "Stripe API error");
            return Err(GatewayFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        let session_response: StripeCheckoutSessionResponse = serde_json::from_str(&body)
            .map_err(|e| {
                GatewayFailure::MalformedResponse(format!(
                    "Failed to parse Stripe response: {}",
                    e
                ))
            })?;

        let url = session_response.url.ok_or_else(|| {
            GatewayFailure::MalformedResponse(format!(
                "session {} has no redirect url",
                session_response.id
            ))
        })?;

        info!(session_id = %session_response.id, "Created Stripe checkout session");

        Ok(CheckoutSession {
            session_id: session_response.id,
            url,
            status: CheckoutStatus::Open,
            expires_at: session_response
                .expires_at
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
        })
    }

    fn provider_name(&self) -> &'static str {
        "stripe"
    }
}

/// Pull the human-readable message out of a Stripe error body
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<StripeErrorResponse>(body)
        .ok()
        .map(|e| e.error.message)
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeCheckoutSessionResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pay_core::{Currency, SessionLine};
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> SessionRequest {
        SessionRequest {
            currency: Currency::ILS,
            lines: vec![SessionLine {
                product_id: 12,
                name: "Silver Ring".into(),
                description: Some("Sterling silver".into()),
                image_url: None,
                unit_amount: 18500,
                quantity: 2,
            }],
            success_url: "http://localhost:3000/success?session_id={CHECKOUT_SESSION_ID}".into(),
            cancel_url: "http://localhost:3000/cancel".into(),
            idempotency_key: "idem-1".into(),
            metadata: HashMap::from([("source".to_string(), "storefront".to_string())]),
        }
    }

    #[test]
    fn test_form_params() {
        let params = StripeClient::form_params(&request());
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("mode"), Some("payment"));
        assert_eq!(get("line_items[0][price_data][currency]"), Some("ils"));
        assert_eq!(get("line_items[0][price_data][unit_amount]"), Some("18500"));
        assert_eq!(
            get("line_items[0][price_data][product_data][metadata][product_id]"),
            Some("12")
        );
        assert_eq!(get("line_items[0][quantity]"), Some("2"));
        assert_eq!(get("metadata[source]"), Some("storefront"));
        assert_eq!(get("line_items[0][price_data][product_data][images][0]"), None);
    }

    #[test]
    fn test_error_message() {
        let body = r#"{"error":{"message":"Invalid API Key provided","type":"invalid_request_error"}}"#;
        assert_eq!(error_message(body).as_deref(), Some("Invalid API Key provided"));
        assert_eq!(error_message("<html>"), None);
    }

    #[tokio::test]
    async fn test_create_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .and(header("Authorization", "Bearer sk_test_abc"))
            .and(header("Idempotency-Key", "idem-1"))
            .and(body_string_contains("unit_amount%5D=18500"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cs_test_a1",
                "object": "checkout.session",
                "url": "https://checkout.stripe.com/c/pay/cs_test_a1",
                "expires_at": 1767225600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = StripeConfig::new("sk_test_abc", "whsec_abc").with_api_base_url(server.uri());
        let session = StripeClient::new(config)
            .unwrap()
            .create_session(&request())
            .await
            .unwrap();

        assert_eq!(session.session_id, "cs_test_a1");
        assert_eq!(session.url, "https://checkout.stripe.com/c/pay/cs_test_a1");
        assert!(session.expires_at.is_some());
    }

    #[tokio::test]
    async fn test_create_session_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .respond_with(ResponseTemplate::new(401).set_body_string(
                r#"{"error":{"message":"Invalid API Key provided"}}"#,
            ))
            .mount(&server)
            .await;

        let config = StripeConfig::new("sk_test_bad", "whsec_abc").with_api_base_url(server.uri());
        let err = StripeClient::new(config)
            .unwrap()
            .create_session(&request())
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayFailure::Status { status: 401, .. }));
    }
}
