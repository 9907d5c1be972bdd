//! # Order Types
//!
//! References to orders owned by the order/capture provider. Nothing
//! here is persisted; an order id lives only between create and capture.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order lifecycle as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Created, awaiting payer approval
    Created,
    Saved,
    /// Payer approved, ready to capture
    Approved,
    Voided,
    /// Funds captured
    Completed,
    PayerActionRequired,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Saved => "SAVED",
            OrderStatus::Approved => "APPROVED",
            OrderStatus::Voided => "VOIDED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::PayerActionRequired => "PAYER_ACTION_REQUIRED",
            OrderStatus::Unknown => "UNKNOWN",
        }
    }

    /// No further transitions happen after this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Voided)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HATEOAS link returned with an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// An order as the provider describes it right after a call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOrder {
    pub id: String,
    pub status: OrderStatus,
    pub links: Vec<Link>,
}

impl ProviderOrder {
    /// The link the payer must visit to approve the order
    pub fn approve_link(&self) -> Option<&Link> {
        self.links
            .iter()
            .find(|l| l.rel == "approve")
            .or_else(|| self.links.iter().find(|l| l.rel == "payer-action"))
    }
}

/// Result of a successful create
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedOrder {
    pub id: String,
    pub status: OrderStatus,
    /// Redirect target for payer approval
    pub approve_url: String,
    pub links: Vec<Link>,
}

/// One settled capture. This is the proof that funds moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub id: String,
    pub status: String,
    pub amount: Decimal,
    pub currency_code: String,
}

/// Result of a successful capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapturedOrder {
    pub id: String,
    pub status: OrderStatus,
    pub captures: Vec<CaptureRecord>,
}

impl CapturedOrder {
    pub fn total_captured(&self) -> Decimal {
        self.captures.iter().map(|c| c.amount).sum()
    }
}
