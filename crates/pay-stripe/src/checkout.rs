//! # Checkout Session Orchestration
//!
//! Prices a storefront checkout request from the catalog and opens a
//! hosted checkout session for it. Client-supplied prices are never
//! read; the catalog record is the only price source.

use crate::client::{error_message, StripeClient};
use crate::config::StripeConfig;
use pay_core::{
    CatalogProduct, CheckoutError, CheckoutItem, CheckoutSession, ConfigError, Currency,
    ExchangeRateSource, GatewayFailure, ProductCatalog, SessionGateway, SessionLine,
    SessionRequest, ValidationError,
};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// Redirect targets and limits applied to every session
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub success_url: String,
    pub cancel_url: String,
    pub price_ceiling: f64,
    pub request_timeout: Duration,
}

impl From<&StripeConfig> for CheckoutSettings {
    fn from(config: &StripeConfig) -> Self {
        Self {
            success_url: config.success_url(),
            cancel_url: config.cancel_url(),
            price_ceiling: config.price_ceiling,
            request_timeout: config.request_timeout,
        }
    }
}

pub struct CheckoutOrchestrator {
    gateway: Arc<dyn SessionGateway>,
    catalog: Arc<dyn ProductCatalog>,
    rates: Arc<dyn ExchangeRateSource>,
    settings: CheckoutSettings,
}

impl CheckoutOrchestrator {
    pub fn new(
        gateway: Arc<dyn SessionGateway>,
        catalog: Arc<dyn ProductCatalog>,
        rates: Arc<dyn ExchangeRateSource>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            gateway,
            catalog,
            rates,
            settings,
        }
    }

    /// Wire an orchestrator to a real Stripe client
    pub fn from_config(
        config: StripeConfig,
        catalog: Arc<dyn ProductCatalog>,
        rates: Arc<dyn ExchangeRateSource>,
    ) -> Result<Self, ConfigError> {
        let settings = CheckoutSettings::from(&config);
        let client = StripeClient::new(config)?;
        Ok(Self::new(Arc::new(client), catalog, rates, settings))
    }

    /// Price the requested items and create a hosted checkout session.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn create_session(
        &self,
        items: &[CheckoutItem],
        currency: &str,
    ) -> Result<CheckoutSession, CheckoutError> {
        if items.is_empty() {
            return Err(ValidationError::MissingItems.into());
        }

        let requested = items
            .iter()
            .enumerate()
            .map(|(line, item)| -> Result<(u64, u32), ValidationError> {
                Ok((item.product_id()?, item.quantity(line)?))
            })
            .collect::<Result<Vec<(u64, u32)>, ValidationError>>()?;

        let currency: Currency = currency
            .parse()
            .map_err(ValidationError::UnsupportedCurrency)?;

        let mut products = Vec::with_capacity(requested.len());
        for (product_id, quantity) in requested {
            let product = self.lookup(product_id).await?;
            products.push((product, quantity));
        }

        let rate = match currency {
            Currency::USD => 1.0,
            Currency::ILS => self.usd_to_ils().await?,
        };

        let lines = products
            .into_iter()
            .map(|(product, quantity)| self.price_line(product, quantity, currency, rate))
            .collect::<Result<Vec<_>, ValidationError>>()?;

        let metadata = HashMap::from([(
            "product_ids".to_string(),
            lines
                .iter()
                .map(|l| l.product_id.to_string())
                .collect::<Vec<_>>()
                .join(","),
        )]);

        let request = SessionRequest {
            currency,
            lines,
            success_url: self.settings.success_url.clone(),
            cancel_url: self.settings.cancel_url.clone(),
            idempotency_key: uuid::Uuid::new_v4().to_string(),
            metadata,
        };
        let total = request.total()?;

        let outcome = match tokio::time::timeout(
            self.settings.request_timeout,
            self.gateway.create_session(&request),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(GatewayFailure::Timeout),
        };

        let session = outcome.map_err(|failure| {
            let err = map_failure(failure);
            error!(provider = self.gateway.provider_name(), error = %err, "Checkout session creation failed");
            err
        })?;

        info!(
            session_id = %session.session_id,
            currency = %currency,
            total,
            "Created checkout session"
        );

        Ok(session)
    }

    async fn lookup(&self, product_id: u64) -> Result<CatalogProduct, CheckoutError> {
        let product = self
            .catalog
            .find_product(product_id)
            .await
            .map_err(|e| CheckoutError::Catalog(e.to_string()))?
            .ok_or(ValidationError::ProductNotFound(product_id))?;

        if !product.in_stock() {
            warn!(product_id, "Product out of stock");
            return Err(ValidationError::OutOfStock(product_id).into());
        }
        Ok(product)
    }

    async fn usd_to_ils(&self) -> Result<f64, CheckoutError> {
        let rate = self
            .rates
            .usd_to_ils()
            .await
            .map_err(|e| CheckoutError::ExchangeRate(e.to_string()))?;

        if !rate.is_finite() || rate <= 0.0 {
            return Err(CheckoutError::ExchangeRate(format!("invalid rate {rate}")));
        }
        Ok(rate)
    }

    fn price_line(
        &self,
        product: CatalogProduct,
        quantity: u32,
        currency: Currency,
        rate: f64,
    ) -> Result<SessionLine, ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidPrice {
            product_id: product.id,
            reason,
        };

        let price = product.usd_price * rate;
        if !price.is_finite() {
            return Err(invalid("price is not a finite number".into()));
        }
        if price <= 0.0 {
            return Err(invalid(format!("price {price} is not positive")));
        }
        if price > self.settings.price_ceiling {
            return Err(invalid(format!(
                "price {price} exceeds ceiling {}",
                self.settings.price_ceiling
            )));
        }

        let unit_amount = Decimal::from_f64(price)
            .and_then(|amount| currency.to_smallest_unit(amount))
            .filter(|&minor| minor > 0)
            .ok_or_else(|| invalid(format!("price {price} rounds to zero {currency}")))?;

        Ok(SessionLine {
            product_id: product.id,
            name: product.name,
            description: product.description,
            image_url: product.image_url,
            unit_amount,
            quantity,
        })
    }
}

fn map_failure(failure: GatewayFailure) -> CheckoutError {
    match failure {
        GatewayFailure::Status { status, body } => CheckoutError::UpstreamError {
            status: Some(status),
            message: error_message(&body).unwrap_or_else(|| format!("HTTP {status}")),
        },
        GatewayFailure::Timeout => CheckoutError::Timeout,
        GatewayFailure::Transport(msg) => CheckoutError::Transport(msg),
        GatewayFailure::MalformedResponse(msg) => CheckoutError::UpstreamError {
            status: None,
            message: msg,
        },
    }
}
