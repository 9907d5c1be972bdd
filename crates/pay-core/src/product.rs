//! # Product Catalog
//!
//! Catalog and exchange-rate collaborators consulted when pricing a
//! hosted checkout session. The catalog is the only source of prices for
//! that flow; client-supplied prices are never used.

use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Currencies the hosted checkout flow can price in (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    USD,
    ILS,
}

impl Currency {
    /// Returns the lowercase ISO 4217 code, as the provider expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::USD => "usd",
            Currency::ILS => "ils",
        }
    }

    /// Both supported currencies use two minor-unit digits
    pub fn decimal_places(&self) -> u32 {
        2
    }

    /// Convert a decimal amount to the smallest currency unit (cents, agorot)
    pub fn to_smallest_unit(&self, amount: Decimal) -> Option<i64> {
        use rust_decimal::prelude::ToPrimitive;
        let scale = Decimal::from(10_i64.pow(self.decimal_places()));
        (amount * scale)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::USD
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "usd" => Ok(Currency::USD),
            "ils" => Ok(Currency::ILS),
            other => Err(other.to_string()),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// A product record as the catalog supplies it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: u64,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Price in US dollars, unchecked
    pub usd_price: f64,

    /// Units available for sale
    pub quantity: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl CatalogProduct {
    pub fn new(id: u64, name: impl Into<String>, usd_price: f64, quantity: i64) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            usd_price,
            quantity,
            image_url: None,
        }
    }

    /// Builder: set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Builder: set image URL
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

/// Catalog or rate collaborator failure
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct CollaboratorError(pub String);

/// Read access to the product catalog
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Look up a product; `Ok(None)` when it does not exist.
    async fn find_product(&self, id: u64) -> Result<Option<CatalogProduct>, CollaboratorError>;
}

/// Source of the USD → ILS exchange rate
#[async_trait]
pub trait ExchangeRateSource: Send + Sync {
    /// How many shekels one dollar buys
    async fn usd_to_ils(&self) -> Result<f64, CollaboratorError>;
}

/// Catalog held in memory (loaded from `config/products.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryCatalog {
    #[serde(default)]
    pub products: Vec<CatalogProduct>,
    #[serde(skip)]
    index: HashMap<u64, usize>,
}

impl InMemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product to the catalog
    pub fn add(&mut self, product: CatalogProduct) {
        self.index.insert(product.id, self.products.len());
        self.products.push(product);
    }

    /// Builder: add a product
    pub fn with_product(mut self, product: CatalogProduct) -> Self {
        self.add(product);
        self
    }

    pub fn get(&self, id: u64) -> Option<&CatalogProduct> {
        self.index.get(&id).and_then(|&i| self.products.get(i))
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Load catalog from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let parsed: InMemoryCatalog = toml::from_str(toml_str)?;
        Ok(parsed
            .products
            .into_iter()
            .fold(InMemoryCatalog::new(), InMemoryCatalog::with_product))
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn find_product(&self, id: u64) -> Result<Option<CatalogProduct>, CollaboratorError> {
        Ok(self.get(id).cloned())
    }
}

/// A rate fixed at startup
#[derive(Debug, Clone, Copy)]
pub struct FixedExchangeRate {
    usd_to_ils: f64,
}

impl FixedExchangeRate {
    pub fn new(usd_to_ils: f64) -> Self {
        Self { usd_to_ils }
    }
}

#[async_trait]
impl ExchangeRateSource for FixedExchangeRate {
    async fn usd_to_ils(&self) -> Result<f64, CollaboratorError> {
        Ok(self.usd_to_ils)
    }
}
