//! # Checkout Types
//!
//! Request and session types for the hosted checkout flow.

use crate::error::ValidationError;
use crate::product::Currency;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Item as the storefront sends it: `{ "id": "12", "amount": 2 }`.
///
/// Both fields arrive as strings or numbers, so they are kept raw until
/// [`CheckoutItem::product_id`] and [`CheckoutItem::quantity`] parse them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub id: serde_json::Value,
    /// Requested quantity (defaults to 1)
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
}

impl CheckoutItem {
    pub fn new(id: u64, amount: u32) -> Self {
        Self {
            id: id.into(),
            amount: Some(amount.into()),
        }
    }

    /// Product id as a positive integer
    pub fn product_id(&self) -> Result<u64, ValidationError> {
        let parsed = match &self.id {
            serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
            serde_json::Value::Number(n) => n.as_u64(),
            _ => None,
        };

        parsed
            .filter(|&id| id > 0)
            .ok_or_else(|| ValidationError::InvalidProductId(raw_text(&self.id)))
    }

    /// Requested quantity as a positive integer
    pub fn quantity(&self, line: usize) -> Result<u32, ValidationError> {
        let Some(raw) = &self.amount else {
            return Ok(1);
        };

        let parsed = match raw {
            serde_json::Value::String(s) => s.trim().parse::<u32>().ok(),
            serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            _ => None,
        };

        parsed
            .filter(|&q| q > 0)
            .ok_or_else(|| ValidationError::InvalidQuantity {
                line,
                value: raw_text(raw),
            })
    }
}

fn raw_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One priced line of a session request, amounts in minor units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLine {
    pub product_id: u64,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub unit_amount: i64,
    pub quantity: u32,
}

/// Everything the hosted-session provider needs, priced from the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub currency: Currency,
    pub lines: Vec<SessionLine>,
    pub success_url: String,
    pub cancel_url: String,
    /// Prevents duplicate sessions if the same request is replayed
    pub idempotency_key: String,
    pub metadata: HashMap<String, String>,
}

impl SessionRequest {
    /// Sum of all lines in minor units
    pub fn total(&self) -> Result<i64, ValidationError> {
        self.lines
            .iter()
            .enumerate()
            .try_fold(0i64, |total, (line, l)| {
                l.unit_amount
                    .checked_mul(i64::from(l.quantity))
                    .and_then(|line_total| total.checked_add(line_total))
                    .ok_or(ValidationError::AmountOverflow { line })
            })
    }
}

/// Status of a checkout session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStatus {
    /// Session created, awaiting payment
    Open,
    /// Payment completed successfully
    Complete,
    /// Session expired
    Expired,
}

impl Default for CheckoutStatus {
    fn default() -> Self {
        CheckoutStatus::Open
    }
}

/// A hosted checkout session created by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider's session ID
    pub session_id: String,

    /// URL to redirect customer to for payment
    pub url: String,

    #[serde(default)]
    pub status: CheckoutStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CheckoutSession {
    pub fn new(session_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            url: url.into(),
            status: CheckoutStatus::Open,
            expires_at: None,
        }
    }

    /// Check if session is still valid
    pub fn is_active(&self) -> bool {
        matches!(self.status, CheckoutStatus::Open)
            && self.expires_at.map(|exp| exp > Utc::now()).unwrap_or(true)
    }
}
