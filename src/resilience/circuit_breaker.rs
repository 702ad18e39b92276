//! Circuit breaker for short-circuiting calls during sustained outages
//!
//! One breaker instance exists per downstream dependency and is shared by
//! every concurrent caller of that dependency. The breaker itself never
//! retries; the client's retry loop is layered outside it.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::{ErrorContext, Result, ServiceError};

use super::BreakerState;

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,

    /// Cool-down before a probe request is allowed through an open circuit
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

/// Mutable breaker state, guarded by a single mutex
#[derive(Debug)]
struct BreakerInner {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    /// When the in-flight probe was admitted; None means the slot is free
    probe_started_at: Option<Instant>,
}

/// A thread-safe circuit breaker
///
/// State machine: Closed -> Open when consecutive failures reach the
/// threshold; Open -> HalfOpen once the reset timeout elapses; HalfOpen
/// admits exactly one probe, which closes the circuit on success or
/// reopens it on failure.
pub struct CircuitBreaker {
    service: String,
    inner: Mutex<BreakerInner>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    /// Create a new breaker for the named dependency
    pub fn new(service: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            service: service.into(),
            inner: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_started_at: None,
            }),
            config,
        }
    }

    /// Check whether a call is admitted
    ///
    /// Rejected calls fail with a ServiceUnavailable-kind error carrying
    /// the remaining cool-down; no network attempt is made for them.
    ///
    /// A probe caller that never reports an outcome (its future was
    /// dropped mid-flight) would otherwise hold the slot forever, so the
    /// grant expires after `reset_timeout` and the next caller reclaims
    /// it.
    pub fn check(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();

        match inner.state {
            BreakerState::Closed => Ok(()),
            BreakerState::Open => {
                let elapsed = inner.opened_at.map(|at| at.elapsed()).unwrap_or_default();
                if elapsed >= self.config.reset_timeout {
                    log::info!(
                        "{} circuit breaker transitioning to HalfOpen, admitting probe",
                        self.service
                    );
                    inner.state = BreakerState::HalfOpen;
                    inner.probe_started_at = Some(Instant::now());
                    Ok(())
                } else {
                    let remaining = self.config.reset_timeout - elapsed;
                    Err(self.rejection(remaining))
                }
            }
            BreakerState::HalfOpen => match inner.probe_started_at {
                Some(started) if started.elapsed() < self.config.reset_timeout => {
                    Err(self.probe_rejection(self.config.reset_timeout - started.elapsed()))
                }
                Some(_) => {
                    log::warn!(
                        "{} circuit breaker probe vanished without an outcome, reclaiming slot",
                        self.service
                    );
                    inner.probe_started_at = Some(Instant::now());
                    Ok(())
                }
                None => {
                    inner.probe_started_at = Some(Instant::now());
                    Ok(())
                }
            },
        }
    }

    /// Record a successful call
    pub fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap();

        match inner.state {
            BreakerState::Closed => {
                inner.consecutive_failures = 0;
            }
            BreakerState::HalfOpen => {
                log::info!(
                    "{} circuit breaker probe succeeded, transitioning to Closed",
                    self.service
                );
                inner.state = BreakerState::Closed;
                inner.consecutive_failures = 0;
                inner.opened_at = None;
                inner.probe_started_at = None;
            }
            BreakerState::Open => {
                log::warn!(
                    "{} circuit breaker received success while Open, ignoring",
                    self.service
                );
            }
        }
    }

    /// Record a failed call
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap();

        match inner.state {
            BreakerState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    log::warn!(
                        "{} circuit breaker tripped after {} consecutive failures",
                        self.service,
                        inner.consecutive_failures
                    );
                    inner.state = BreakerState::Open;
                    inner.opened_at = Some(Instant::now());
                }
            }
            BreakerState::HalfOpen => {
                log::warn!(
                    "{} circuit breaker probe failed, transitioning back to Open",
                    self.service
                );
                inner.state = BreakerState::Open;
                inner.opened_at = Some(Instant::now());
                inner.probe_started_at = None;
            }
            BreakerState::Open => {
                log::debug!(
                    "{} circuit breaker received failure while Open, ignoring",
                    self.service
                );
            }
        }
    }

    /// Reset the breaker to its initial state
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.state = BreakerState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.probe_started_at = None;
    }

    /// Get the current state
    pub fn state(&self) -> BreakerState {
        self.inner.lock().unwrap().state
    }

    /// Get the current consecutive-failure count
    pub fn failure_count(&self) -> u32 {
        self.inner.lock().unwrap().consecutive_failures
    }

    /// The dependency this breaker guards
    pub fn service(&self) -> &str {
        &self.service
    }

    fn rejection(&self, remaining: Duration) -> ServiceError {
        ServiceError::service_unavailable(format!(
            "{} circuit breaker is open, rejecting calls for {} more seconds",
            self.service,
            remaining.as_secs()
        ))
        .with_context(ErrorContext::for_service(&self.service))
    }

    fn probe_rejection(&self, remaining: Duration) -> ServiceError {
        ServiceError::service_unavailable(format!(
            "{} circuit breaker is half-open with a probe in flight, rejecting calls for up to {} more seconds",
            self.service,
            remaining.as_secs()
        ))
        .with_context(ErrorContext::for_service(&self.service))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn breaker(threshold: u32, reset_timeout: Duration) -> CircuitBreaker {
        CircuitBreaker::new(
            "test",
            CircuitBreakerConfig {
                failure_threshold: threshold,
                reset_timeout,
            },
        )
    }

    #[test]
    fn starts_closed_with_zero_failures() {
        let cb = breaker(5, Duration::from_secs(30));
        assert_eq!(cb.state(), BreakerState::Closed);
        assert_eq!(cb.failure_count(), 0);
        assert!(cb.check().is_ok());
    }

    #[test]
    fn opens_at_threshold() {
        let cb = breaker(3, Duration::from_secs(30));

        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), BreakerState::Closed);

        cb.record_failure();
        assert_eq!(cb.state(), BreakerState::Open);
        assert!(cb.check().is_err());
    }

    #[test]
    fn success_resets_failure_count() {
        let cb = breaker(3, Duration::from_secs(30));

        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        assert_eq!(cb.failure_count(), 0);

        cb.record_failure();
        assert_eq!(cb.state(), BreakerState::Closed);
    }

    #[test]
    fn rejection_carries_remaining_cooldown() {
        let cb = breaker(1, Duration::from_secs(30));
        cb.record_failure();

        let err = cb.check().unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("more seconds"));
    }

    #[test]
    fn admits_single_probe_after_reset_timeout() {
        let cb = breaker(1, Duration::from_millis(50));
        cb.record_failure();
        assert_eq!(cb.state(), BreakerState::Open);

        thread::sleep(Duration::from_millis(80));

        // First caller gets the probe slot, a concurrent one is rejected
        assert!(cb.check().is_ok());
        assert_eq!(cb.state(), BreakerState::HalfOpen);
        let err = cb.check().unwrap_err();
        assert!(err.to_string().contains("probe in flight"));
    }

    #[test]
    fn vanished_probe_releases_slot_after_reset_timeout() {
        let cb = breaker(1, Duration::from_millis(20));
        cb.record_failure();

        // Take the probe slot and never report an outcome, as a caller
        // whose future was dropped mid-flight would
        thread::sleep(Duration::from_millis(30));
        assert!(cb.check().is_ok());
        assert!(cb.check().is_err());

        // The next caller reclaims the expired grant instead of being
        // rejected forever
        thread::sleep(Duration::from_millis(30));
        assert!(cb.check().is_ok());
        assert_eq!(cb.state(), BreakerState::HalfOpen);

        // And the reclaimed probe can still close the circuit
        cb.record_success();
        assert_eq!(cb.state(), BreakerState::Closed);
    }

    #[test]
    fn probe_success_closes_circuit() {
        let cb = breaker(1, Duration::from_millis(10));
        cb.record_failure();
        thread::sleep(Duration::from_millis(30));
        assert!(cb.check().is_ok());

        cb.record_success();
        assert_eq!(cb.state(), BreakerState::Closed);
        assert_eq!(cb.failure_count(), 0);
        assert!(cb.check().is_ok());
    }

    #[test]
    fn probe_failure_reopens_circuit() {
        let cb = breaker(1, Duration::from_millis(10));
        cb.record_failure();
        thread::sleep(Duration::from_millis(30));
        assert!(cb.check().is_ok());

        cb.record_failure();
        assert_eq!(cb.state(), BreakerState::Open);
        // Cool-down refreshed, calls are rejected again
        assert!(cb.check().is_err());
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let cb = breaker(1, Duration::from_secs(30));
        cb.record_failure();
        assert_eq!(cb.state(), BreakerState::Open);

        cb.reset();
        assert_eq!(cb.state(), BreakerState::Closed);
        assert_eq!(cb.failure_count(), 0);
    }
}
