//! Client builder
//!
//! Wires a `ResilientClient` together: transport, circuit breaker,
//! idempotency cache, and retry policy. Facades use this instead of
//! assembling the pieces by hand.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, ServiceError};
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, IdempotencyKeys};
use crate::services::common::{build_http_client, UserAgent};

use super::{ClientConfig, HttpTransport, ResilientClient, Transport};

/// Builder for `ResilientClient`
pub struct ClientBuilder {
    service: String,
    base_url: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    user_agent: Option<UserAgent>,
    config: ClientConfig,
    breaker_config: CircuitBreakerConfig,
    breaker: Option<Arc<CircuitBreaker>>,
    idempotency: Option<Arc<IdempotencyKeys>>,
}

impl ClientBuilder {
    /// Create a builder for the named dependency
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            base_url: None,
            transport: None,
            user_agent: None,
            config: ClientConfig::default(),
            breaker_config: CircuitBreakerConfig::default(),
            breaker: None,
            idempotency: None,
        }
    }

    /// Set the base URL for the vendor API
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Supply a transport directly (tests, custom stacks)
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the user agent used when the builder constructs the transport
    pub fn user_agent(mut self, user_agent: UserAgent) -> Self {
        self.user_agent = Some(user_agent);
        self
    }

    /// Set the maximum number of physical attempts per call
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    /// Set the first exponential backoff delay
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.config.base_delay = delay;
        self
    }

    /// Set the backoff ceiling
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.config.max_delay = delay;
        self
    }

    /// Set the per-attempt timeout
    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.config.attempt_timeout = timeout;
        self
    }

    /// Bound the whole retry loop, sleeps included
    pub fn overall_deadline(mut self, deadline: Duration) -> Self {
        self.config.overall_deadline = Some(deadline);
        self
    }

    /// Replace the whole retry policy
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Configure the circuit breaker built for this client
    pub fn breaker_config(mut self, config: CircuitBreakerConfig) -> Self {
        self.breaker_config = config;
        self
    }

    /// Share an existing breaker (one instance per dependency)
    pub fn breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    /// Share an existing idempotency cache (process-wide)
    pub fn idempotency(mut self, idempotency: Arc<IdempotencyKeys>) -> Self {
        self.idempotency = Some(idempotency);
        self
    }

    /// Build the client
    ///
    /// A transport must be supplied directly or derivable from a base URL.
    pub fn build(self) -> Result<ResilientClient> {
        let transport: Arc<dyn Transport> = match (self.transport, &self.base_url) {
            (Some(transport), _) => transport,
            (None, Some(base_url)) => {
                let http = build_http_client(
                    self.user_agent,
                    Some(self.config.attempt_timeout),
                )?;
                Arc::new(HttpTransport::new(http, base_url.clone()))
            }
            (None, None) => {
                return Err(ServiceError::invalid_input(format!(
                    "{} client needs a transport or a base URL",
                    self.service
                )))
            }
        };

        let breaker = self
            .breaker
            .unwrap_or_else(|| Arc::new(CircuitBreaker::new(&self.service, self.breaker_config)));
        let idempotency = self.idempotency.unwrap_or_default();

        Ok(ResilientClient::new(
            self.service,
            transport,
            breaker,
            idempotency,
            self.config,
        ))
    }
}
