//! Classification of raw HTTP and transport outcomes
//!
//! This module maps status codes and transport failures to the normalized
//! `ServiceError` kinds. Classification is a pure function of the status
//! code or transport error; it never depends on call history and never
//! panics, no matter what the vendor sent back.

use std::time::Duration;

use super::{ErrorContext, ServiceError, VendorPayload, DEFAULT_RATE_LIMIT_DELAY};

/// Classify a non-2xx HTTP response into a ServiceError
///
/// `retry_after` is the raw Retry-After header value, when present. The
/// returned error carries the service name, status code, vendor payload,
/// and (for 429s) the effective retry delay in its context.
pub fn classify_status(
    service: &str,
    endpoint: &str,
    status: u16,
    retry_after: Option<&str>,
    body: &str,
) -> ServiceError {
    let payload = VendorPayload::from_body(body);
    let message = format!("{} returned {}: {}", service, status, payload.message_or_raw());

    let mut context = ErrorContext::for_service(service)
        .endpoint(endpoint)
        .status_code(status)
        .vendor_payload(payload);

    let error = match status {
        400 => ServiceError::invalid_input(message),
        401 => ServiceError::unauthorized(message),
        403 => ServiceError::forbidden(message),
        404 => ServiceError::not_found(message),
        429 => {
            let delay = retry_after
                .and_then(parse_retry_after)
                .unwrap_or(DEFAULT_RATE_LIMIT_DELAY);
            context = context.retry_after(delay);
            ServiceError::rate_limited(message)
        }
        500 | 502 | 503 => ServiceError::service_unavailable(message),
        504 => ServiceError::timeout(message),
        _ => ServiceError::external(message),
    };

    error.with_context(context)
}

/// Classify a transport-level failure into a ServiceError
///
/// Timeouts map to Timeout, connection and DNS failures to NetworkError,
/// body decode failures to ExternalError, and anything else (builder
/// misuse, redirect loops) to InternalError.
pub fn classify_transport(err: &reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::timeout(format!("Request timed out: {}", err))
    } else if err.is_connect() {
        ServiceError::network(format!("Connection error: {}", err))
    } else if err.is_decode() {
        ServiceError::external(format!("Response decode error: {}", err))
    } else if err.is_request() || err.is_builder() {
        ServiceError::internal(format!("Invalid request: {}", err))
    } else {
        ServiceError::network(format!("Transport error: {}", err))
    }
}

/// Parse a Retry-After header value as a whole number of seconds
///
/// HTTP-date forms are not used by either vendor; unparseable values
/// degrade to None and the caller applies the default.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
