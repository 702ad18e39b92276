//! Veeqo inventory client
//!
//! Facade for the Veeqo API: products, orders, and stock levels. Order
//! creation and stock updates are mutating calls and go out with
//! idempotency keys attached by the core.

mod models;
pub use models::*;

use std::sync::Arc;

use async_trait::async_trait;
use log::warn;
use serde_json::json;

use crate::config::{ServiceConfig, VeeqoConfig, DEFAULT_PROVIDER};
use crate::core::{ClientBuilder, RequestDescriptor, ResilientClient, ServiceClient};
use crate::error::{Result, ServiceError};
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, IdempotencyKeys};
use crate::services::common::UserAgent;

/// Veeqo API client
pub struct VeeqoClient {
    client: ResilientClient,
    config: VeeqoConfig,
}

impl VeeqoClient {
    /// Create a client from environment configuration
    pub fn from_env() -> Result<Self> {
        let config = VeeqoConfig::from_provider(&**DEFAULT_PROVIDER)?;
        Self::new_with_config(config)
    }

    /// Create a client with explicit configuration
    pub fn new_with_config(config: VeeqoConfig) -> Result<Self> {
        config.validate()?;
        let client = ClientBuilder::new("veeqo")
            .base_url(&config.base_url)
            .user_agent(UserAgent::for_service("veeqo"))
            .attempt_timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .base_delay(std::time::Duration::from_millis(800))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a builder for fine-grained control
    pub fn builder() -> VeeqoClientBuilder {
        VeeqoClientBuilder::default()
    }

    /// List products, paginated
    pub async fn list_products(&self, page: u32, page_size: u32) -> Result<Vec<Product>> {
        let descriptor = self.descriptor(
            RequestDescriptor::get("products")
                .query("page", page.to_string())
                .query("page_size", page_size.to_string()),
        );
        self.client.send_json(&descriptor).await
    }

    /// Fetch one order by id
    pub async fn get_order(&self, order_id: u64) -> Result<Order> {
        let descriptor = self.descriptor(RequestDescriptor::get(format!("orders/{}", order_id)));
        self.client.send_json(&descriptor).await
    }

    /// List orders, optionally filtered by status
    pub async fn list_orders(&self, status: Option<&str>) -> Result<Vec<Order>> {
        let mut descriptor = RequestDescriptor::get("orders");
        if let Some(status) = status {
            descriptor = descriptor.query("status", status);
        }
        self.client.send_json(&self.descriptor(descriptor)).await
    }

    /// Create an order (mutating)
    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order> {
        let descriptor = self
            .descriptor(RequestDescriptor::post("orders", json!({"order": request})))
            .mutating();
        self.client.send_json(&descriptor).await
    }

    /// Set the physical stock level for a sellable at a warehouse (mutating)
    pub async fn update_stock_entry(
        &self,
        sellable_id: u64,
        warehouse_id: u64,
        request: &UpdateStockRequest,
    ) -> Result<StockEntry> {
        let descriptor = self
            .descriptor(RequestDescriptor::put(
                format!(
                    "sellables/{}/warehouses/{}/stock_entry",
                    sellable_id, warehouse_id
                ),
                json!({"stock_entry": request}),
            ))
            .mutating();
        self.client.send_json(&descriptor).await
    }

    /// Access the underlying resilient client (breaker state, tests)
    pub fn inner(&self) -> &ResilientClient {
        &self.client
    }

    fn descriptor(&self, descriptor: RequestDescriptor) -> RequestDescriptor {
        descriptor.header("x-api-key", self.config.api_key.clone())
    }
}

#[async_trait]
impl ServiceClient for VeeqoClient {
    fn name(&self) -> &str {
        "veeqo"
    }

    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    async fn health_check(&self) -> Result<bool> {
        let descriptor = self.descriptor(RequestDescriptor::get("current_user"));
        match self.client.send(&descriptor).await {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!("Veeqo health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

/// Builder for the Veeqo client
#[derive(Default)]
pub struct VeeqoClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_seconds: Option<u64>,
    max_attempts: Option<u32>,
    base_delay_ms: Option<u64>,
    breaker_config: Option<CircuitBreakerConfig>,
    breaker: Option<Arc<CircuitBreaker>>,
    idempotency: Option<Arc<IdempotencyKeys>>,
}

impl VeeqoClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the per-attempt timeout in seconds
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Set the maximum attempts per call
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Set the first backoff delay in milliseconds
    pub fn base_delay_ms(mut self, delay_ms: u64) -> Self {
        self.base_delay_ms = Some(delay_ms);
        self
    }

    /// Set circuit breaker configuration
    pub fn circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.breaker_config = Some(config);
        self
    }

    /// Share an existing breaker instance
    pub fn breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    /// Share an existing idempotency cache
    pub fn idempotency(mut self, idempotency: Arc<IdempotencyKeys>) -> Self {
        self.idempotency = Some(idempotency);
        self
    }

    /// Build the Veeqo client
    pub fn build(self) -> Result<VeeqoClient> {
        let mut config = VeeqoConfig::from_provider(&**DEFAULT_PROVIDER).unwrap_or_default();

        if let Some(api_key) = self.api_key {
            config.api_key = api_key;
        }
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(timeout) = self.timeout_seconds {
            config.timeout_seconds = timeout;
        }

        if config.api_key.is_empty() {
            return Err(ServiceError::invalid_input("Veeqo API key is required"));
        }

        let mut builder = ClientBuilder::new("veeqo")
            .base_url(&config.base_url)
            .user_agent(UserAgent::for_service("veeqo"))
            .attempt_timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .base_delay(std::time::Duration::from_millis(self.base_delay_ms.unwrap_or(800)));

        if let Some(attempts) = self.max_attempts {
            builder = builder.max_attempts(attempts);
        }
        if let Some(breaker_config) = self.breaker_config {
            builder = builder.breaker_config(breaker_config);
        }
        if let Some(breaker) = self.breaker {
            builder = builder.breaker(breaker);
        }
        if let Some(idempotency) = self.idempotency {
            builder = builder.idempotency(idempotency);
        }

        let client = builder.build()?;
        Ok(VeeqoClient { client, config })
    }
}
