//! # Order Orchestration
//!
//! Create and capture for the order/capture provider.
//!
//! ```text
//! create:  validate ─▶ token ─▶ create_order ─▶ approve link
//! capture: order id ─▶ token ─▶ capture_order ─▶ capture records
//! ```
//!
//! Each step runs only after the previous one succeeded. Nothing is
//! retried here: a timed-out create may still have produced an order at
//! the provider.

use crate::auth::TokenCache;
use crate::client::PayPalClient;
use crate::config::PayPalConfig;
use crate::errors::ErrorTaxonomyMapper;
use pay_core::{
    cart, CapturedOrder, CartLine, ConfigError, CreatedOrder, GatewayFailure, OrderError,
    OrderGateway, OrderStatus, ValidationError,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

pub struct OrderOrchestrator {
    gateway: Arc<dyn OrderGateway>,
    tokens: Arc<TokenCache>,
    mapper: ErrorTaxonomyMapper,
    request_timeout: Duration,
}

impl OrderOrchestrator {
    pub fn new(
        gateway: Arc<dyn OrderGateway>,
        tokens: Arc<TokenCache>,
        mapper: ErrorTaxonomyMapper,
        request_timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            tokens,
            mapper,
            request_timeout,
        }
    }

    /// Wire an orchestrator to a real PayPal client. The client is both
    /// the token source and the order gateway.
    pub fn from_config(config: PayPalConfig, expose_details: bool) -> Result<Self, ConfigError> {
        let request_timeout = config.request_timeout;
        let auth_timeout = config.auth_timeout;
        let client = Arc::new(PayPalClient::new(config)?);

        Ok(Self::new(
            client.clone(),
            Arc::new(TokenCache::new(client, auth_timeout)),
            ErrorTaxonomyMapper::new(expose_details),
            request_timeout,
        ))
    }

    /// Create a pending order for the cart and return its approval link.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn create(&self, lines: &[CartLine]) -> Result<CreatedOrder, OrderError> {
        let validated = cart::validate(lines).map_err(|err| {
            warn!(error = %err, "Cart rejected");
            err
        })?;

        let token = self.tokens.get_or_refresh().await?;

        let order = self
            .bounded(self.gateway.create_order(&token, &validated))
            .await?;

        let approve_url = order
            .approve_link()
            .map(|link| link.href.clone())
            .ok_or_else(|| {
                error!(order_id = %order.id, "Order response has no approve link");
                OrderError::MalformedResponse(format!("order {} has no approve link", order.id))
            })?;

        info!(
            order_id = %order.id,
            status = %order.status,
            total = %validated.total(),
            currency = validated.currency_code(),
            "Created order"
        );

        Ok(CreatedOrder {
            id: order.id,
            status: order.status,
            approve_url,
            links: order.links,
        })
    }

    /// Capture funds on an order the payer has approved.
    #[instrument(skip(self))]
    pub async fn capture(&self, order_id: &str) -> Result<CapturedOrder, OrderError> {
        let order_id = order_id.trim();
        if order_id.is_empty() {
            return Err(ValidationError::InvalidOrderId.into());
        }

        let token = self.tokens.get_or_refresh().await?;

        let captured = self
            .bounded(self.gateway.capture_order(&token, order_id))
            .await?;

        info!(
            order_id = %captured.id,
            status = %captured.status,
            captures = captured.captures.len(),
            total = %captured.total_captured(),
            "Captured order"
        );

        if captured.status != OrderStatus::Completed {
            warn!(order_id = %captured.id, status = %captured.status, "Capture did not complete");
        }

        Ok(captured)
    }

    /// Run a gateway call under the request timeout and map its failure.
    /// On expiry the call's future is dropped, which aborts the request.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, GatewayFailure>>,
    ) -> Result<T, OrderError> {
        let outcome = match tokio::time::timeout(self.request_timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(GatewayFailure::Timeout),
        };
        outcome.map_err(|failure| self.map_failure(failure))
    }

    fn map_failure(&self, failure: GatewayFailure) -> OrderError {
        let err = match failure {
            GatewayFailure::Status { status, body } => self.mapper.map(status, &body),
            GatewayFailure::Timeout => OrderError::Timeout,
            GatewayFailure::Transport(msg) => OrderError::Transport(msg),
            GatewayFailure::MalformedResponse(msg) => OrderError::MalformedResponse(msg),
        };

        error!(
            provider = self.gateway.provider_name(),
            kind = ?err.kind(),
            debug_id = err.debug_id().unwrap_or("-"),
            error = %err,
            "Order provider call failed"
        );
        err
    }
}
