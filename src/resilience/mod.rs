//! Resilience primitives for vendor clients
//!
//! This module provides the shared mutable state behind the resilient
//! client core:
//! - Circuit breaker (one instance per downstream dependency)
//! - Idempotency key cache (process-wide)
//! - Exponential backoff schedule for retry delays

pub mod backoff;
mod circuit_breaker;
mod idempotency;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
pub use idempotency::{canonical_json, IdempotencyKeys, DEFAULT_IDEMPOTENCY_WINDOW};

/// State of a circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Calls pass through normally
    Closed,

    /// Calls fail immediately without network I/O
    Open,

    /// A single probe call is allowed through
    HalfOpen,
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
            Self::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}
