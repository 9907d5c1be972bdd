//! # Webhook Signature Verification
//!
//! Stripe signs each delivery with HMAC-SHA256 over `"{t}.{payload}"` and
//! sends the result in the `Stripe-Signature` header:
//!
//! ```text
//! Stripe-Signature: t=1700000000,v1=5257a869e7ec...,v1=...
//! ```
//!
//! A payload is only parsed after the signature has been checked.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use pay_core::{SignatureError, WebhookError, WebhookEvent, WebhookEventType};
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// Verifies signed webhook deliveries against the endpoint secret
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance: Duration,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>, tolerance: Duration) -> Self {
        Self {
            secret: secret.into(),
            tolerance,
        }
    }

    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    /// Verify against the system clock.
    pub fn verify(&self, payload: &[u8], header: &str) -> Result<WebhookEvent, WebhookError> {
        self.verify_at(payload, header, Utc::now().timestamp())
    }

    /// Verify as of `now` (unix seconds), then parse the event.
    pub fn verify_at(
        &self,
        payload: &[u8],
        header: &str,
        now: i64,
    ) -> Result<WebhookEvent, WebhookError> {
        self.check_signature(payload, header, now).map_err(|err| {
            warn!(reason = %err, "Webhook signature rejected");
            err
        })?;

        let event: StripeWebhookEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::MalformedEvent(format!("Failed to parse webhook: {e}")))?;

        debug!(event_id = %event.id, event_type = %event.event_type, "Verified Stripe webhook");

        Ok(WebhookEvent {
            id: event.id,
            event_type: WebhookEventType::from_provider(&event.event_type),
            data: event.data.object,
            created: DateTime::from_timestamp(event.created, 0).unwrap_or_else(Utc::now),
        })
    }

    fn check_signature(&self, payload: &[u8], header: &str, now: i64) -> Result<(), SignatureError> {
        if header.trim().is_empty() {
            return Err(SignatureError::MissingHeader);
        }
        if payload.is_empty() {
            return Err(SignatureError::EmptyPayload);
        }

        let parsed = parse_signature_header(header)?;

        let age_secs = now.checked_sub(parsed.timestamp).unwrap_or(i64::MAX);
        if age_secs.unsigned_abs() > self.tolerance.as_secs() {
            return Err(SignatureError::TimestampOutsideTolerance { age_secs });
        }

        let mac = self.mac(parsed.timestamp, payload);
        let matched = parsed.signatures.iter().any(|candidate| {
            hex::decode(candidate)
                .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
                .unwrap_or(false)
        });

        if matched {
            Ok(())
        } else {
            Err(SignatureError::NoMatchingSignature)
        }
    }

    fn mac(&self, timestamp: i64, payload: &[u8]) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac
    }

    /// Produce a header value for `payload` as Stripe would send it.
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> String {
        let digest = self.mac(timestamp, payload).finalize().into_bytes();
        format!("t={},v1={}", timestamp, hex::encode(digest))
    }
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &"<redacted>")
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> Result<SignatureHeader, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                let parsed = value.parse::<i64>().map_err(|_| {
                    SignatureError::MalformedHeader(format!("invalid timestamp {value:?}"))
                })?;
                timestamp = Some(parsed);
            }
            "v1" => signatures.push(value.to_string()),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| SignatureError::MalformedHeader("missing timestamp".into()))?;

    if signatures.is_empty() {
        return Err(SignatureError::MalformedHeader("no v1 signature".into()));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

#[derive(Debug, Deserialize)]
struct StripeWebhookEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created: i64,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Map<String, serde_json::Value>,
}
