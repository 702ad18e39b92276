//! Common utilities for vendor facades

use std::fmt;
use std::time::Duration;

use reqwest::{header, Client};

use crate::error::{Result, ServiceError};

/// UserAgent structure for identifying the client to upstream services
#[derive(Debug, Clone)]
pub struct UserAgent {
    /// Application name
    pub app_name: String,

    /// Version string
    pub version: String,

    /// Optional extra info
    pub extra: Option<String>,
}

impl Default for UserAgent {
    fn default() -> Self {
        Self {
            app_name: "logistics-sdk".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            extra: None,
        }
    }
}

impl UserAgent {
    /// User agent for a specific vendor facade
    pub fn for_service(service: &str) -> Self {
        Self {
            extra: Some(service.to_string()),
            ..Self::default()
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_name, self.version)?;
        if let Some(ref extra) = self.extra {
            write!(f, " ({})", extra)?;
        }
        Ok(())
    }
}

/// Build a standard HTTP client with default settings
pub fn build_http_client(user_agent: Option<UserAgent>, timeout: Option<Duration>) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    let ua = user_agent.unwrap_or_default().to_string();

    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(&ua)
            .map_err(|e| ServiceError::invalid_input(format!("Invalid user agent: {}", e)))?,
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout.unwrap_or_else(|| Duration::from_secs(30)))
        .gzip(true)
        .build()
        .map_err(|e| ServiceError::internal(format!("Failed to build HTTP client: {}", e)))
}
