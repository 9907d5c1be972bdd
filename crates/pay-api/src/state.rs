//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the two provider orchestrators, the webhook handler and
//! configuration.

use anyhow::{bail, Context};
use axum::http::HeaderValue;
use pay_core::config::parse_positive;
use pay_core::{FixedExchangeRate, InMemoryCatalog};
use pay_paypal::{OrderOrchestrator, PayPalConfig};
use pay_stripe::{
    CheckoutOrchestrator, LoggingFulfillment, StripeConfig, WebhookHandler, WebhookVerifier,
};
use std::sync::Arc;

const DEFAULT_USD_ILS_RATE: f64 = 3.7;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Storefront URL used for checkout redirects
    pub client_url: String,
    /// `client_url` as the only CORS origin allowed
    pub client_origin: HeaderValue,
    /// Explicit catalog file; otherwise `config/products.toml` is searched
    pub catalog_path: Option<String>,
    pub usd_ils_rate: f64,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Absent variables take their defaults;
    /// present but invalid ones are an error.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got {raw:?}"))?,
            None => 8080,
        };

        let client_url = get("CLIENT_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| "http://localhost:3000".to_string());
        if !(client_url.starts_with("http://") || client_url.starts_with("https://")) {
            bail!("CLIENT_URL must be an http(s) origin, got {client_url:?}");
        }
        let client_origin = HeaderValue::from_str(&client_url)
            .with_context(|| format!("CLIENT_URL is not a valid origin: {client_url:?}"))?;

        let usd_ils_rate = match get("USD_ILS_RATE") {
            Some(raw) => parse_positive("USD_ILS_RATE", &raw)?,
            None => DEFAULT_USD_ILS_RATE,
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            environment: get("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            client_url,
            client_origin,
            catalog_path: get("CATALOG_PATH").filter(|p| !p.trim().is_empty()),
            usd_ils_rate,
        })
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Order/capture flow (PayPal)
    pub orders: Arc<OrderOrchestrator>,
    /// Hosted checkout flow (Stripe)
    pub checkout: Arc<CheckoutOrchestrator>,
    /// Stripe webhook verification and dispatch
    pub webhooks: Arc<WebhookHandler>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        orders: OrderOrchestrator,
        checkout: CheckoutOrchestrator,
        webhooks: WebhookHandler,
    ) -> Self {
        Self {
            orders: Arc::new(orders),
            checkout: Arc::new(checkout),
            webhooks: Arc::new(webhooks),
            config,
        }
    }

    /// Build every component from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let paypal = PayPalConfig::from_env().context("Failed to load PayPal config")?;
        let stripe = StripeConfig::from_env()
            .context("Failed to load Stripe config")?
            .with_client_url(config.client_url.clone());

        let catalog = load_product_catalog(config.catalog_path.as_deref())?;
        Self::build(config, paypal, stripe, catalog)
    }

    /// Wire orchestrators from provider configs and a loaded catalog
    pub fn build(
        config: AppConfig,
        paypal: PayPalConfig,
        stripe: StripeConfig,
        catalog: InMemoryCatalog,
    ) -> anyhow::Result<Self> {
        if config.is_production() && (!paypal.is_live_mode() || stripe.is_test_mode()) {
            tracing::warn!("Production environment is using sandbox/test provider credentials");
        }

        let expose_details = !config.is_production();
        let orders = OrderOrchestrator::from_config(paypal, expose_details)
            .context("Failed to initialize PayPal")?;

        let webhooks = WebhookHandler::new(
            WebhookVerifier::new(stripe.webhook_secret.clone(), stripe.webhook_tolerance),
            Arc::new(LoggingFulfillment),
        );

        let checkout = CheckoutOrchestrator::from_config(
            stripe,
            Arc::new(catalog),
            Arc::new(FixedExchangeRate::new(config.usd_ils_rate)),
        )
        .context("Failed to initialize Stripe")?;

        Ok(Self::new(config, orders, checkout, webhooks))
    }

    /// Provider error details are only shown outside production
    pub fn expose_details(&self) -> bool {
        !self.config.is_production()
    }
}

/// Load product catalog from config file
fn load_product_catalog(explicit: Option<&str>) -> anyhow::Result<InMemoryCatalog> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path))?;
        let catalog = InMemoryCatalog::from_toml(&content)
            .with_context(|| format!("Failed to parse {}", path))?;
        tracing::info!("Loaded {} products from {}", catalog.len(), path);
        return Ok(catalog);
    }

    let config_paths = [
        "config/products.toml",
        "../config/products.toml",
        "../../config/products.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let catalog = InMemoryCatalog::from_toml(&content)
                .with_context(|| format!("Failed to parse {}", path))?;
            tracing::info!("Loaded {} products from {}", catalog.len(), path);
            return Ok(catalog);
        }
    }

    // Return empty catalog if no config found
    tracing::warn!("No product catalog found, using empty catalog");
    Ok(InMemoryCatalog::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pay_core::config::vars_from_pairs as vars;

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.client_url, "http://localhost:3000");
        assert_eq!(config.usd_ils_rate, 3.7);
        assert!(!config.is_production());
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig::from_vars(vars(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "3000"),
            ("ENVIRONMENT", "production"),
        ]))
        .unwrap();

        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");
        assert!(config.is_production());
    }

    #[test]
    fn test_invalid_exchange_rate_fails_fast() {
        for rate in ["4.1x", "0", "-3.7", "NaN", "inf"] {
            let err = AppConfig::from_vars(vars(&[("USD_ILS_RATE", rate)])).unwrap_err();
            assert!(err.to_string().contains("USD_ILS_RATE"), "{rate:?}: {err}");
        }

        let config = AppConfig::from_vars(vars(&[("USD_ILS_RATE", "3.65")])).unwrap();
        assert_eq!(config.usd_ils_rate, 3.65);
    }

    #[test]
    fn test_invalid_client_url_fails_fast() {
        for url in ["localhost:3000", "https://shop\n.example.com", "not a url"] {
            assert!(
                AppConfig::from_vars(vars(&[("CLIENT_URL", url)])).is_err(),
                "{url:?} should be rejected"
            );
        }

        let config =
            AppConfig::from_vars(vars(&[("CLIENT_URL", "https://shop.example.com/")])).unwrap();
        assert_eq!(config.client_url, "https://shop.example.com");
        assert_eq!(config.client_origin, "https://shop.example.com");
    }

    #[test]
    fn test_invalid_port_fails_fast() {
        assert!(AppConfig::from_vars(vars(&[("PORT", "eighty")])).is_err());
    }

    #[test]
    fn test_load_explicit_catalog_missing() {
        assert!(load_product_catalog(Some("/nonexistent/products.toml")).is_err());
    }
}
