//! # Stripe Webhook Handling
//!
//! Receives Stripe's asynchronous notifications, verifies them and
//! dispatches on event type. Only `checkout.session.completed` triggers
//! fulfillment; every other verified event is acknowledged as-is.

use crate::signature::WebhookVerifier;
use async_trait::async_trait;
use pay_core::{Currency, WebhookError, WebhookEvent, WebhookEventType};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Parsed checkout.session.completed event data
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutCompletedData {
    pub session_id: String,
    pub payment_intent_id: Option<String>,
    pub customer_email: Option<String>,
    /// Total in minor units
    pub amount_total: i64,
    pub currency: Option<Currency>,
    pub payment_status: String,
    pub metadata: HashMap<String, String>,
}

impl CheckoutCompletedData {
    /// Parse from a webhook event
    pub fn from_event(event: &WebhookEvent) -> Result<Self, WebhookError> {
        let obj = &event.data;

        let session_id = event
            .object_str("id")
            .map(String::from)
            .ok_or_else(|| WebhookError::MalformedEvent("Missing session id".to_string()))?;

        let payment_intent_id = event.object_str("payment_intent").map(String::from);

        let customer_email = obj
            .get("customer_details")
            .and_then(|cd| cd.get("email"))
            .and_then(|v| v.as_str())
            .map(String::from);

        let amount_total = obj
            .get("amount_total")
            .and_then(|v| v.as_i64())
            .unwrap_or(0);

        let currency = event
            .object_str("currency")
            .and_then(|c| c.parse::<Currency>().ok());

        let payment_status = event
            .object_str("payment_status")
            .unwrap_or("unknown")
            .to_string();

        let metadata = obj
            .get("metadata")
            .and_then(|m| m.as_object())
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            session_id,
            payment_intent_id,
            customer_email,
            amount_total,
            currency,
            payment_status,
            metadata,
        })
    }

    /// Check if payment was successful
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }

    /// Catalog product ids the session was priced from
    pub fn product_ids(&self) -> Vec<u64> {
        self.metadata
            .get("product_ids")
            .map(|ids| ids.split(',').filter_map(|id| id.trim().parse().ok()).collect())
            .unwrap_or_default()
    }
}

/// Side effects of a completed checkout (order records, emails, stock)
#[async_trait]
pub trait FulfillmentHandler: Send + Sync {
    async fn on_checkout_completed(&self, data: CheckoutCompletedData) -> Result<(), String>;
}

/// Default fulfillment: just logs the completed checkout
pub struct LoggingFulfillment;

#[async_trait]
impl FulfillmentHandler for LoggingFulfillment {
    async fn on_checkout_completed(&self, data: CheckoutCompletedData) -> Result<(), String> {
        info!(
            session_id = %data.session_id,
            amount_total = data.amount_total,
            paid = data.is_paid(),
            products = ?data.product_ids(),
            "Checkout completed"
        );
        Ok(())
    }
}

/// What the webhook route should answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Verified and processed (200)
    Acknowledged,
    /// Signature could not be verified (400)
    Rejected,
    /// Verified, but the payload is not a usable event (500)
    Malformed,
}

impl WebhookOutcome {
    pub fn status_code(&self) -> u16 {
        match self {
            WebhookOutcome::Acknowledged => 200,
            WebhookOutcome::Rejected => 400,
            WebhookOutcome::Malformed => 500,
        }
    }
}

pub struct WebhookHandler {
    verifier: WebhookVerifier,
    fulfillment: Arc<dyn FulfillmentHandler>,
}

impl WebhookHandler {
    pub fn new(verifier: WebhookVerifier, fulfillment: Arc<dyn FulfillmentHandler>) -> Self {
        Self {
            verifier,
            fulfillment,
        }
    }

    pub fn verifier(&self) -> &WebhookVerifier {
        &self.verifier
    }

    /// Verify a delivery and dispatch it.
    pub async fn handle(&self, payload: &[u8], signature_header: Option<&str>) -> WebhookOutcome {
        let event = match self.verifier.verify(payload, signature_header.unwrap_or_default()) {
            Ok(event) => event,
            Err(WebhookError::Signature(_)) => return WebhookOutcome::Rejected,
            Err(err @ WebhookError::MalformedEvent(_)) => {
                error!(error = %err, "Verified webhook could not be parsed");
                return WebhookOutcome::Malformed;
            }
        };

        match event.event_type {
            WebhookEventType::CheckoutCompleted => {
                let data = match CheckoutCompletedData::from_event(&event) {
                    Ok(data) => data,
                    Err(err) => {
                        error!(event_id = %event.id, error = %err, "Bad checkout.session.completed payload");
                        return WebhookOutcome::Malformed;
                    }
                };
                let session_id = data.session_id.clone();
                if let Err(reason) = self.fulfillment.on_checkout_completed(data).await {
                    error!(event_id = %event.id, %session_id, %reason, "Fulfillment failed");
                }
            }
            WebhookEventType::PaymentFailed => {
                warn!(event_id = %event.id, "Payment failed");
            }
            ref other => {
                debug!(event_id = %event.id, event_type = %other, "Acknowledged webhook event");
            }
        }

        WebhookOutcome::Acknowledged
    }
}
