//! EasyPost shipping client
//!
//! Facade for the EasyPost API: address verification, shipment creation
//! and rating, label purchase, and trackers. Label purchase and tracker
//! creation are mutating calls; the core attaches idempotency keys to
//! them so a retried purchase never buys two labels.

mod models;
pub use models::*;

use std::sync::Arc;

use async_trait::async_trait;
use log::warn;
use serde_json::json;

use crate::config::{EasyPostConfig, ServiceConfig, DEFAULT_PROVIDER};
use crate::core::{ClientBuilder, RequestDescriptor, ResilientClient, ServiceClient};
use crate::error::{Result, ServiceError};
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, IdempotencyKeys};
use crate::services::common::UserAgent;

/// EasyPost API client
pub struct EasyPostClient {
    client: ResilientClient,
    config: EasyPostConfig,
}

impl EasyPostClient {
    /// Create a client from environment configuration
    pub fn from_env() -> Result<Self> {
        let config = EasyPostConfig::from_provider(&**DEFAULT_PROVIDER)?;
        Self::new_with_config(config)
    }

    /// Create a client with explicit configuration
    pub fn new_with_config(config: EasyPostConfig) -> Result<Self> {
        config.validate()?;
        let client = ClientBuilder::new("easypost")
            .base_url(&config.base_url)
            .user_agent(UserAgent::for_service("easypost"))
            .attempt_timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .base_delay(std::time::Duration::from_millis(1000))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a builder for fine-grained control
    pub fn builder() -> EasyPostClientBuilder {
        EasyPostClientBuilder::default()
    }

    /// Verify a postal address
    pub async fn verify_address(&self, address: &Address) -> Result<VerifiedAddress> {
        let descriptor = self.descriptor(RequestDescriptor::post(
            "addresses",
            json!({"address": address, "verify": ["delivery"]}),
        ));
        self.client.send_json(&descriptor).await
    }

    /// Create a shipment and get quoted rates
    pub async fn create_shipment(&self, request: &CreateShipmentRequest) -> Result<Shipment> {
        let descriptor =
            self.descriptor(RequestDescriptor::post("shipments", json!({"shipment": request})));
        self.client.send_json(&descriptor).await
    }

    /// Buy a label for a shipment at the given rate (mutating)
    pub async fn buy_shipment(&self, shipment_id: &str, rate_id: &str) -> Result<Shipment> {
        let descriptor = self
            .descriptor(RequestDescriptor::post(
                format!("shipments/{}/buy", shipment_id),
                json!({"rate": {"id": rate_id}}),
            ))
            .mutating();
        self.client.send_json(&descriptor).await
    }

    /// Create a tracker for a tracking code (mutating)
    pub async fn create_tracker(&self, request: &CreateTrackerRequest) -> Result<Tracker> {
        let descriptor = self
            .descriptor(RequestDescriptor::post("trackers", json!({"tracker": request})))
            .mutating();
        self.client.send_json(&descriptor).await
    }

    /// Fetch a tracker by id
    pub async fn get_tracker(&self, tracker_id: &str) -> Result<Tracker> {
        let descriptor = self.descriptor(RequestDescriptor::get(format!("trackers/{}", tracker_id)));
        self.client.send_json(&descriptor).await
    }

    /// Access the underlying resilient client (breaker state, tests)
    pub fn inner(&self) -> &ResilientClient {
        &self.client
    }

    fn descriptor(&self, descriptor: RequestDescriptor) -> RequestDescriptor {
        descriptor.header("Authorization", format!("Bearer {}", self.config.api_key))
    }
}

#[async_trait]
impl ServiceClient for EasyPostClient {
    fn name(&self) -> &str {
        "easypost"
    }

    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    async fn health_check(&self) -> Result<bool> {
        let descriptor = self.descriptor(RequestDescriptor::get("carrier_types"));
        match self.client.send(&descriptor).await {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!("EasyPost health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

/// Builder for the EasyPost client
#[derive(Default)]
pub struct EasyPostClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_seconds: Option<u64>,
    max_attempts: Option<u32>,
    base_delay_ms: Option<u64>,
    breaker_config: Option<CircuitBreakerConfig>,
    breaker: Option<Arc<CircuitBreaker>>,
    idempotency: Option<Arc<IdempotencyKeys>>,
}

impl EasyPostClientBuilder {
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

    /// Build the EasyPost client
    pub fn build(self) -> Result<EasyPostClient> {
        let mut config = EasyPostConfig::from_provider(&**DEFAULT_PROVIDER).unwrap_or_default();

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
            return Err(ServiceError::invalid_input("EasyPost API key is required"));
        }

        let mut builder = ClientBuilder::new("easypost")
            .base_url(&config.base_url)
            .user_agent(UserAgent::for_service("easypost"))
            .attempt_timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .base_delay(std::time::Duration::from_millis(self.base_delay_ms.unwrap_or(1000)));

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
        Ok(EasyPostClient { client, config })
    }
}
