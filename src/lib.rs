//! # logistics-sdk
//!
//! A unified SDK for the shipping and inventory integrations behind the
//! logistics tool server.
//!
//! This crate provides:
//!
//! - A resilient HTTP client core: bounded retries with exponential
//!   backoff, vendor-authoritative rate-limit waits, per-attempt
//!   timeouts, circuit breaking, and idempotency keys for mutating calls
//! - A normalized error taxonomy — callers see classified errors, never
//!   raw status codes or transport exceptions
//! - Typed vendor facades for the EasyPost (shipping) and Veeqo
//!   (inventory) APIs
//! - Configuration management with environment-variable support
//!
//! ## Architecture
//!
//! The SDK is designed around the following key abstractions:
//!
//! - `RequestDescriptor`: immutable description of one logical vendor call
//! - `Transport`: the swappable HTTP primitive
//! - `ResilientClient`: executes a descriptor to completion through the
//!   circuit breaker and retry policy
//! - `CircuitBreaker` / `IdempotencyKeys`: the only shared mutable state,
//!   one breaker per dependency and one process-wide key cache
//! - `ServiceError`: the complete error vocabulary surfaced to callers

// Core abstractions
pub mod core;
pub use crate::core::{
    AttemptResult, ClientBuilder, ClientConfig, HttpTransport, RequestDescriptor, ResilientClient,
    ServiceClient, ServiceResponse, Transport,
};

// Error handling
pub mod error;
pub use error::{ErrorContext, ErrorKind, Result, ServiceError, VendorPayload};

// Resilience primitives
pub mod resilience;
pub use resilience::{BreakerState, CircuitBreaker, CircuitBreakerConfig, IdempotencyKeys};

// Configuration management
pub mod config;
pub use config::{ConfigProvider, ResilienceConfig, ServiceConfig as ServiceConfigTrait};

// Vendor facades
pub mod services;
pub use services::{easypost, veeqo};

// Utility module for common functionality
mod util;

#[cfg(test)]
mod tests;

/// Create a builder for an EasyPost client
pub fn easypost_client() -> easypost::EasyPostClientBuilder {
    easypost::EasyPostClientBuilder::new()
}

/// Create a builder for a Veeqo client
pub fn veeqo_client() -> veeqo::VeeqoClientBuilder {
    veeqo::VeeqoClientBuilder::new()
}
