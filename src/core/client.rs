//! Resilient request execution
//!
//! `ResilientClient` executes one `RequestDescriptor` to completion,
//! hiding transient failure behind a bounded retry policy. It layers, in
//! order: idempotency key attachment (mutating calls), the circuit
//! breaker gate, per-attempt timeouts, error classification, and the
//! backoff schedule. Callers always observe either a decoded success or a
//! classified terminal error.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{mapping, ErrorContext, ErrorKind, Result, ServiceError};
use crate::resilience::{backoff, CircuitBreaker, IdempotencyKeys};
use crate::util;

use super::{AttemptResult, RequestDescriptor, ServiceResponse, Transport};

/// Header carrying the deduplication token for mutating calls
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Header carrying the per-call trace id
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Retry and timeout policy for one vendor dependency
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Maximum physical attempts per logical call
    pub max_attempts: u32,

    /// First exponential backoff delay
    pub base_delay: Duration,

    /// Ceiling for exponential backoff delays
    pub max_delay: Duration,

    /// Per-attempt deadline (descriptor may override)
    pub attempt_timeout: Duration,

    /// Optional ceiling on the whole retry loop, sleeps included
    pub overall_deadline: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(10),
            attempt_timeout: Duration::from_secs(30),
            overall_deadline: None,
        }
    }
}

/// Executes logical calls against one vendor dependency
///
/// Shared state (the breaker and the idempotency cache) arrives by `Arc`
/// so all concurrent callers of a dependency see one breaker and one
/// token cache; everything else is call-local.
pub struct ResilientClient {
    service: String,
    transport: Arc<dyn Transport>,
    breaker: Arc<CircuitBreaker>,
    idempotency: Arc<IdempotencyKeys>,
    config: ClientConfig,
}

impl ResilientClient {
    /// Create a client; prefer `ClientBuilder` for the common wiring
    pub fn new(
        service: impl Into<String>,
        transport: Arc<dyn Transport>,
        breaker: Arc<CircuitBreaker>,
        idempotency: Arc<IdempotencyKeys>,
        config: ClientConfig,
    ) -> Self {
        Self {
            service: service.into(),
            transport,
            breaker,
            idempotency,
            config,
        }
    }

    /// The dependency this client calls
    pub fn service(&self) -> &str {
        &self.service
    }

    /// The breaker guarding this dependency
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Execute a request to completion and decode the body as JSON
    pub async fn send_json<R: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<R> {
        self.send(descriptor).await?.json()
    }

    /// Execute a request to completion
    ///
    /// Returns the successful response or a terminal classified error.
    /// Breaker rejections surface immediately and consume no attempts;
    /// rate-limit waits honor the vendor's Retry-After and do not advance
    /// the exponential schedule; every failed attempt is reported to the
    /// breaker.
    pub async fn send(&self, descriptor: &RequestDescriptor) -> Result<ServiceResponse> {
        let (request, request_id) = self.prepare(descriptor);
        let started = Instant::now();

        self.breaker.check()?;

        let attempt_timeout = request.timeout.unwrap_or(self.config.attempt_timeout);
        let mut exponent: u32 = 0;

        for attempt in 1..=self.config.max_attempts {
            let outcome = self.attempt(&request, attempt_timeout).await;

            let error = match outcome {
                AttemptResult::Response(response) if response.is_success() => {
                    self.breaker.record_success();
                    log::debug!(
                        "{} {} {} succeeded on attempt {} ({} ms)",
                        self.service,
                        request.method,
                        request.path,
                        attempt,
                        started.elapsed().as_millis()
                    );
                    return Ok(response);
                }
                AttemptResult::Response(response) => mapping::classify_status(
                    &self.service,
                    &request.path,
                    response.status,
                    response.header("retry-after"),
                    &response.body,
                ),
                AttemptResult::TransportFailure(error) => error.with_context(
                    ErrorContext::for_service(&self.service).endpoint(&request.path),
                ),
            };

            self.breaker.record_failure();

            if !error.is_retryable() || attempt == self.config.max_attempts {
                log::warn!(
                    "{} {} {} [{}] failed terminally after {} attempt(s): {} [{}]",
                    self.service,
                    request.method,
                    request.path,
                    request_id,
                    attempt,
                    util::sanitize_for_logging(&error.to_string()),
                    error.kind()
                );
                return Err(self.terminal(error, attempt, &request_id));
            }

            // Rate-limit waits are vendor-authoritative and sit outside the
            // exponential series; everything else backs off exponentially
            // with jitter.
            let delay = if error.kind() == ErrorKind::RateLimited {
                error
                    .suggested_delay()
                    .unwrap_or(crate::error::DEFAULT_RATE_LIMIT_DELAY)
            } else {
                let delay = backoff::jittered_delay(
                    self.config.base_delay,
                    self.config.max_delay,
                    exponent,
                );
                exponent += 1;
                delay
            };

            if let Some(overall) = self.config.overall_deadline {
                if started.elapsed() + delay >= overall {
                    log::warn!(
                        "{} {} {} abandoning retries, overall deadline of {:?} would be exceeded",
                        self.service,
                        request.method,
                        request.path,
                        overall
                    );
                    let error = ServiceError::timeout(format!(
                        "{} call exceeded overall deadline of {:?}",
                        self.service, overall
                    ));
                    return Err(self.terminal(error, attempt, &request_id));
                }
            }

            log::warn!(
                "{} {} {} attempt {}/{} failed ({}), retrying in {:?}",
                self.service,
                request.method,
                request.path,
                attempt,
                self.config.max_attempts,
                error.kind(),
                delay
            );
            tokio::time::sleep(delay).await;
        }

        // The loop always returns from its terminal branch
        Err(ServiceError::internal(format!(
            "{} retry loop exited without a result",
            self.service
        )))
    }

    /// Attach the trace id, and the idempotency token for mutating calls
    fn prepare(&self, descriptor: &RequestDescriptor) -> (RequestDescriptor, String) {
        let mut request = descriptor.clone();

        let request_id = util::generate_request_id();
        request
            .headers
            .insert(REQUEST_ID_HEADER.to_string(), request_id.clone());

        if request.mutating {
            let body = request.body.clone().unwrap_or(Value::Null);
            let token = self.idempotency.key_for(&request.path, &body);
            request.headers.insert(IDEMPOTENCY_HEADER.to_string(), token);
        }
        (request, request_id)
    }

    /// One physical attempt bound by a cancellable deadline
    async fn attempt(&self, request: &RequestDescriptor, deadline: Duration) -> AttemptResult {
        let execution = self.transport.execute(request, deadline);
        match tokio::time::timeout(deadline, execution).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(error)) => AttemptResult::TransportFailure(error),
            Err(_) => AttemptResult::TransportFailure(ServiceError::timeout(format!(
                "{} attempt exceeded {:?} deadline",
                self.service, deadline
            ))),
        }
    }

    /// Stamp the attempt count and trace id onto a terminal error
    fn terminal(&self, error: ServiceError, attempts: u32, request_id: &str) -> ServiceError {
        match error {
            // Keep the classification context, add the call-level fields
            ServiceError::WithContext { inner, context } => ServiceError::WithContext {
                inner,
                context: context.attempts(attempts).request_id(request_id),
            },
            other => other.with_context(
                ErrorContext::for_service(&self.service)
                    .attempts(attempts)
                    .request_id(request_id),
            ),
        }
    }
}
