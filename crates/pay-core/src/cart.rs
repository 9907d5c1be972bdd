//! # Cart Validation
//!
//! Shape, amount and currency checks for carts submitted by the
//! storefront. Nothing here performs I/O; a [`ValidatedCart`] is the only
//! thing the order gateway accepts, so an amount cannot reach a provider
//! without passing through [`validate`].
//!
//! Amount bounds (zero, negative, very large) are left to the provider's
//! own validation. The only local limit is that line and cart totals must
//! fit in a [`Decimal`].

use crate::error::ValidationError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Unit price as the storefront sends it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitAmount {
    /// Decimal string, e.g. `"50.00"`
    pub value: String,
    /// ISO-4217 code, e.g. `"USD"`
    pub currency_code: String,
}

/// Quantity as the storefront sends it (`"2"` or `2`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawQuantity {
    Text(String),
    Number(serde_json::Number),
}

impl RawQuantity {
    fn as_text(&self) -> String {
        match self {
            RawQuantity::Text(s) => s.clone(),
            RawQuantity::Number(n) => n.to_string(),
        }
    }
}

impl From<u32> for RawQuantity {
    fn from(value: u32) -> Self {
        RawQuantity::Number(value.into())
    }
}

/// One purchasable entry in a cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Display name
    pub name: String,
    pub unit_amount: UnitAmount,
    pub quantity: RawQuantity,
}

impl CartLine {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        currency_code: impl Into<String>,
        quantity: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            unit_amount: UnitAmount {
                value: value.into(),
                currency_code: currency_code.into(),
            },
            quantity: RawQuantity::Text(quantity.into()),
        }
    }
}

/// A cart line after parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLine {
    pub name: String,
    pub unit_amount: Decimal,
    pub quantity: u32,
    total: Decimal,
}

impl ValidatedLine {
    pub fn total(&self) -> Decimal {
        self.total
    }
}

/// A non-empty, single-currency cart with parsed amounts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCart {
    lines: Vec<ValidatedLine>,
    currency_code: String,
    total: Decimal,
}

impl ValidatedCart {
    pub fn lines(&self) -> &[ValidatedLine] {
        &self.lines
    }

    pub fn currency_code(&self) -> &str {
        &self.currency_code
    }

    /// Sum of all line totals
    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }
}

/// Validate a cart submitted by the storefront.
///
/// Lines are checked in order and the first bad line wins. Currency
/// homogeneity is checked once every line has parsed.
pub fn validate(cart: &[CartLine]) -> Result<ValidatedCart, ValidationError> {
    if cart.is_empty() {
        return Err(ValidationError::EmptyCart);
    }

    let mut lines = Vec::with_capacity(cart.len());
    let mut currencies = BTreeSet::new();
    let mut total = Decimal::ZERO;

    for (index, line) in cart.iter().enumerate() {
        let unit_amount = parse_amount(&line.unit_amount.value).ok_or_else(|| {
            ValidationError::InvalidAmount {
                line: index,
                value: line.unit_amount.value.clone(),
            }
        })?;

        let quantity = parse_quantity(&line.quantity).ok_or_else(|| {
            ValidationError::InvalidQuantity {
                line: index,
                value: line.quantity.as_text(),
            }
        })?;

        let line_total = unit_amount
            .checked_mul(Decimal::from(quantity))
            .ok_or(ValidationError::AmountOverflow { line: index })?;
        total = total
            .checked_add(line_total)
            .ok_or(ValidationError::AmountOverflow { line: index })?;

        currencies.insert(line.unit_amount.currency_code.clone());
        lines.push(ValidatedLine {
            name: line.name.clone(),
            unit_amount,
            quantity,
            total: line_total,
        });
    }

    if currencies.len() > 1 {
        return Err(ValidationError::MixedCurrencyCart {
            currencies: currencies.into_iter().collect(),
        });
    }

    let currency_code = currencies.into_iter().next().unwrap_or_default();

    Ok(ValidatedCart {
        lines,
        currency_code,
        total,
    })
}

fn parse_amount(value: &str) -> Option<Decimal> {
    Decimal::from_str(value.trim()).ok()
}

/// Fractional quantities truncate toward zero (`"1.5"` is one item).
fn parse_quantity(raw: &RawQuantity) -> Option<u32> {
    let text = raw.as_text();
    let parsed = Decimal::from_str(text.trim()).ok()?;
    let whole = parsed.trunc().to_u32()?;
    (whole > 0).then_some(whole)
}
