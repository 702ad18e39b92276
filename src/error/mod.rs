//! Error handling for the logistics SDK
//!
//! This module provides a normalized error system that:
//! - Classifies failures into a fixed set of kinds (network, auth, rate limit, etc.)
//! - Adds structured context to errors for better debugging
//! - Carries vendor error payloads without ever crashing on unexpected shapes
//! - Provides a convenient Result type alias

use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub mod mapping;

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Main error type for the SDK
///
/// Each variant is one canonical error kind; raw HTTP status codes and
/// transport exception types never leak past this boundary.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Request validation errors (HTTP 400)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Authentication errors (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authorization errors (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found errors (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limiting errors (HTTP 429)
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Upstream outage errors (HTTP 500/502/503, open circuit)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Timeout errors (HTTP 504 or attempt deadline expiry)
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Connection-level errors (DNS, connection refused, resets)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Unclassifiable upstream responses
    #[error("External service error: {0}")]
    ExternalError(String),

    /// Unexpected errors on our side of the wire
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Errors with additional context
    #[error("{inner}")]
    WithContext {
        inner: Box<ServiceError>,
        context: ErrorContext,
    },
}

/// Canonical error kind, independent of the message payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Unauthorized,
    Forbidden,
    NotFound,
    RateLimited,
    ServiceUnavailable,
    Timeout,
    NetworkError,
    ExternalError,
    InternalError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::ServiceUnavailable => "service_unavailable",
            ErrorKind::Timeout => "timeout",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::ExternalError => "external_error",
            ErrorKind::InternalError => "internal_error",
        };
        write!(f, "{}", name)
    }
}

/// Default delay before retrying a rate-limited call when the vendor
/// supplies no Retry-After header
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_secs(60);

/// Default delay suggested for service-unavailable responses
pub const DEFAULT_UNAVAILABLE_DELAY: Duration = Duration::from_secs(5);

impl ServiceError {
    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ServiceError::InvalidInput(message.into())
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ServiceError::Unauthorized(message.into())
    }

    /// Create a forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    /// Create a rate limited error
    pub fn rate_limited(message: impl Into<String>) -> Self {
        ServiceError::RateLimited(message.into())
    }

    /// Create a service unavailable error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ServiceError::ServiceUnavailable(message.into())
    }

    /// Create a timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        ServiceError::Timeout(message.into())
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        ServiceError::NetworkError(message.into())
    }

    /// Create an external service error
    pub fn external(message: impl Into<String>) -> Self {
        ServiceError::ExternalError(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        ServiceError::InternalError(message.into())
    }

    /// Add context to an existing error
    pub fn with_context(self, context: ErrorContext) -> Self {
        ServiceError::WithContext {
            inner: Box::new(self),
            context,
        }
    }

    /// Get the canonical kind of this error, looking through context wrappers
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::InvalidInput(_) => ErrorKind::InvalidInput,
            ServiceError::Unauthorized(_) => ErrorKind::Unauthorized,
            ServiceError::Forbidden(_) => ErrorKind::Forbidden,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::RateLimited(_) => ErrorKind::RateLimited,
            ServiceError::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
            ServiceError::Timeout(_) => ErrorKind::Timeout,
            ServiceError::NetworkError(_) => ErrorKind::NetworkError,
            ServiceError::ExternalError(_) => ErrorKind::ExternalError,
            ServiceError::InternalError(_) => ErrorKind::InternalError,
            ServiceError::WithContext { inner, .. } => inner.kind(),
        }
    }

    /// Get the attached context, if any
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            ServiceError::WithContext { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Get the service name if available
    pub fn service_name(&self) -> Option<&str> {
        self.context().map(|c| c.service.as_str())
    }

    /// Get the HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        self.context().and_then(|c| c.status_code)
    }

    /// Get the number of attempts made before this error became terminal
    pub fn attempts(&self) -> Option<u32> {
        self.context().and_then(|c| c.attempts)
    }

    /// Check if this error kind may be retried
    ///
    /// The retryable set is fixed: Timeout, ServiceUnavailable, RateLimited,
    /// NetworkError. The retry loop consults only this predicate, never raw
    /// status-code ranges.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Timeout
                | ErrorKind::ServiceUnavailable
                | ErrorKind::RateLimited
                | ErrorKind::NetworkError
        )
    }

    /// Check if this is a permanent error (not retryable)
    pub fn is_permanent(&self) -> bool {
        !self.is_retryable()
    }

    /// Suggested delay before retrying, when one is known
    ///
    /// Rate-limited errors report the vendor-supplied Retry-After value when
    /// present, else a fixed default. Service-unavailable errors report a
    /// fixed default. Everything else reports None and the caller falls back
    /// to its own backoff schedule.
    pub fn suggested_delay(&self) -> Option<Duration> {
        match self.kind() {
            ErrorKind::RateLimited => Some(
                self.context()
                    .and_then(|c| c.retry_after)
                    .unwrap_or(DEFAULT_RATE_LIMIT_DELAY),
            ),
            ErrorKind::ServiceUnavailable => Some(DEFAULT_UNAVAILABLE_DELAY),
            _ => None,
        }
    }
}

/// Structured context attached to errors
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Service that generated the error
    pub service: String,

    /// Endpoint that was called
    pub endpoint: Option<String>,

    /// HTTP status code if applicable
    pub status_code: Option<u16>,

    /// Request ID for tracing
    pub request_id: Option<String>,

    /// When the error was recorded
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// Number of attempts made before the error became terminal
    pub attempts: Option<u32>,

    /// Vendor-supplied delay before retrying, when present
    pub retry_after: Option<Duration>,

    /// Vendor error body, when one was returned
    pub vendor_payload: Option<VendorPayload>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            service: "unknown".to_string(),
            endpoint: None,
            status_code: None,
            request_id: None,
            timestamp: chrono::Utc::now(),
            attempts: None,
            retry_after: None,
            vendor_payload: None,
        }
    }
}

impl ErrorContext {
    /// Create a new error context for a specific service
    pub fn for_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            ..Self::default()
        }
    }

    /// Add an endpoint
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Add an HTTP status code
    pub fn status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Add a request ID
    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Record the number of attempts made
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    /// Record a vendor-supplied retry delay
    pub fn retry_after(mut self, delay: Duration) -> Self {
        self.retry_after = Some(delay);
        self
    }

    /// Attach a vendor error payload
    pub fn vendor_payload(mut self, payload: VendorPayload) -> Self {
        self.vendor_payload = Some(payload);
        self
    }
}

/// A vendor error body, kept as raw text plus best-effort parsed fields
///
/// Vendors return loosely shaped JSON error bodies; this never fails to
/// construct, no matter what the body looks like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorPayload {
    /// Raw response body text, capped at `MAX_RAW_BODY` characters
    pub raw: String,

    /// Parsed error message, when the body had a recognizable one
    pub message: Option<String>,

    /// Parsed vendor error code, when the body had one
    pub code: Option<String>,
}

impl VendorPayload {
    /// Longest raw body kept on an error
    pub const MAX_RAW_BODY: usize = 2048;

    /// Best-effort parse of a vendor error body
    ///
    /// Recognizes the common shapes `{"error": {"message", "code"}}`,
    /// `{"error": "..."}` and `{"message": "..."}`; anything else is kept
    /// raw with no parsed fields.
    pub fn from_body(body: &str) -> Self {
        let mut payload = Self {
            raw: crate::util::truncate_string(body, Self::MAX_RAW_BODY),
            message: None,
            code: None,
        };

        let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
            return payload;
        };

        if let Some(error) = json.get("error") {
            if let Some(text) = error.as_str() {
                payload.message = Some(text.to_string());
            } else {
                payload.message = error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string);
                payload.code = error
                    .get("code")
                    .and_then(|c| c.as_str())
                    .map(str::to_string);
            }
        }

        if payload.message.is_none() {
            payload.message = json
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string);
        }

        payload
    }

    /// The most specific human-readable message available
    pub fn message_or_raw(&self) -> &str {
        self.message.as_deref().unwrap_or(&self.raw)
    }
}

/// Convert reqwest errors to ServiceError
impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        mapping::classify_transport(&err)
    }
}

/// Convert serde_json errors to ServiceError
impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::external(format!("Failed to decode response body: {}", err))
    }
}
