//! Core abstractions for vendor clients
//!
//! This module defines the seams the resilient client core is built on:
//!
//! - `RequestDescriptor`: immutable description of one logical call
//! - `AttemptResult`: outcome of one physical network attempt
//! - `Transport`: the HTTP primitive (swappable in tests)
//! - `ResilientClient`: the retry/breaker/idempotency orchestration
//! - `ServiceClient`: the base trait vendor facades implement

mod builder;
mod client;

pub use builder::ClientBuilder;
pub use client::{ClientConfig, ResilientClient, IDEMPOTENCY_HEADER, REQUEST_ID_HEADER};

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{mapping, Result, ServiceError};

/// Immutable description of one logical vendor call
///
/// Created by a facade immediately before dispatch and never mutated
/// afterwards; the `mutating` flag marks calls whose side effects must not
/// be silently duplicated by retries.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// HTTP method
    pub method: Method,

    /// Path relative to the client's base URL
    pub path: String,

    /// Headers specific to this call
    pub headers: HashMap<String, String>,

    /// Query parameters
    pub query: Vec<(String, String)>,

    /// Optional JSON body
    pub body: Option<Value>,

    /// Per-call timeout override
    pub timeout: Option<Duration>,

    /// Whether this call has side effects requiring deduplication
    pub mutating: bool,
}

impl RequestDescriptor {
    /// Describe a call with the given method and path
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HashMap::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
            mutating: false,
        }
    }

    /// Describe a GET call
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Describe a POST call with a JSON body
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        let mut descriptor = Self::new(Method::POST, path);
        descriptor.body = Some(body);
        descriptor
    }

    /// Describe a PUT call with a JSON body
    pub fn put(path: impl Into<String>, body: Value) -> Self {
        let mut descriptor = Self::new(Method::PUT, path);
        descriptor.body = Some(body);
        descriptor
    }

    /// Describe a DELETE call
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Override the per-attempt timeout for this call
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Mark the call as side-effecting
    pub fn mutating(mut self) -> Self {
        self.mutating = true;
        self
    }
}

/// A decoded vendor response
#[derive(Debug, Clone)]
pub struct ServiceResponse {
    /// HTTP status code
    pub status: u16,

    /// Response headers, lowercase names
    pub headers: HashMap<String, String>,

    /// Raw body text
    pub body: String,
}

impl ServiceResponse {
    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get a header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Decode the body as JSON into a typed value
    pub fn json<R: DeserializeOwned>(&self) -> Result<R> {
        serde_json::from_str(&self.body).map_err(|e| {
            ServiceError::external(format!("Failed to decode response body: {}", e))
        })
    }
}

/// Outcome of one physical network attempt
///
/// Either the vendor answered (any status) or the transport itself failed.
/// Consumed immediately by the retry loop.
#[derive(Debug)]
pub enum AttemptResult {
    /// The vendor produced a response
    Response(ServiceResponse),

    /// The attempt failed below the HTTP layer
    TransportFailure(ServiceError),
}

/// The HTTP transport primitive
///
/// Issues one physical request bound by a deadline and reports the raw
/// outcome. Production code uses `HttpTransport`; tests substitute
/// scripted implementations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one attempt of the described request
    async fn execute(&self, request: &RequestDescriptor, deadline: Duration)
        -> Result<AttemptResult>;
}

/// Transport backed by a shared `reqwest::Client`
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport rooted at the given base URL
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// The base URL requests are issued against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        request: &RequestDescriptor,
        deadline: Duration,
    ) -> Result<AttemptResult> {
        let url = format!("{}/{}", self.base_url, request.path.trim_start_matches('/'));

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .timeout(deadline);

        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                return Ok(AttemptResult::TransportFailure(mapping::classify_transport(
                    &err,
                )))
            }
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                return Ok(AttemptResult::TransportFailure(mapping::classify_transport(
                    &err,
                )))
            }
        };

        Ok(AttemptResult::Response(ServiceResponse {
            status,
            headers,
            body,
        }))
    }
}

/// Base trait for vendor facades
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// The client name/identifier
    fn name(&self) -> &str;

    /// The base URL for the service
    fn base_url(&self) -> &str;

    /// Health check for the service
    async fn health_check(&self) -> Result<bool>;
}
