//! Configuration for vendor clients
//!
//! Utilities for loading and validating client configuration, with
//! support for environment variables. All tunables (attempt budgets,
//! delays, breaker thresholds, idempotency window) are externally
//! supplied; nothing in the core hard-codes deployment values.

use std::collections::HashMap;
use std::env;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

/// Base trait for configuration providers
pub trait ConfigProvider: Send + Sync {
    /// Get a string configuration value
    fn get_string(&self, key: &str) -> Result<String>;
}

/// Extension methods for configuration providers
pub trait ConfigProviderExt: ConfigProvider {
    /// Get an integer configuration value
    fn get_int(&self, key: &str) -> Result<i64> {
        let value = self.get_string(key)?;
        value.parse::<i64>().map_err(|e| {
            ServiceError::invalid_input(format!("Invalid integer for key {}: {}", key, e))
        })
    }

    /// Get a string configuration value with a default
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get an integer configuration value with a default
    fn get_int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }

    /// Get a non-negative integer value with a default
    ///
    /// Absent keys take the default; present-but-negative values are
    /// rejected instead of being wrapped into a huge unsigned value.
    fn get_u64_or(&self, key: &str, default: u64) -> Result<u64> {
        if self.get_string(key).is_err() {
            return Ok(default);
        }
        let value = self.get_int(key)?;
        u64::try_from(value).map_err(|_| {
            ServiceError::invalid_input(format!(
                "Configuration value for {} must be non-negative",
                key
            ))
        })
    }

    /// Get a non-negative 32-bit integer value with a default
    fn get_u32_or(&self, key: &str, default: u32) -> Result<u32> {
        let value = self.get_u64_or(key, u64::from(default))?;
        u32::try_from(value).map_err(|_| {
            ServiceError::invalid_input(format!(
                "Configuration value for {} is out of range",
                key
            ))
        })
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    /// Optional prefix for environment variables
    prefix: Option<String>,
}

impl EnvConfigProvider {
    /// Create a new environment variable config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prefix for environment variables
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Format a configuration key as an environment variable
    fn format_key(&self, key: &str) -> String {
        let mut env_key = String::new();

        if let Some(ref prefix) = self.prefix {
            env_key.push_str(prefix);
            env_key.push('_');
        }

        env_key.push_str(
            &key.to_uppercase()
                .replace(|c: char| !c.is_ascii_alphanumeric(), "_"),
        );

        env_key
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let env_key = self.format_key(key);

        env::var(&env_key).map_err(|e| match e {
            env::VarError::NotPresent => {
                ServiceError::invalid_input(format!("Environment variable not set: {}", env_key))
            }
            env::VarError::NotUnicode(_) => ServiceError::invalid_input(format!(
                "Environment variable is not valid unicode: {}",
                env_key
            )),
        })
    }
}

/// In-memory config provider for tests or static configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    /// Create a new empty memory config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory config provider with initial values
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Set a configuration value
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| ServiceError::invalid_input(format!("Configuration key not found: {}", key)))
    }
}

/// Global default configuration provider
pub static DEFAULT_PROVIDER: Lazy<Arc<EnvConfigProvider>> =
    Lazy::new(|| Arc::new(EnvConfigProvider::new().with_prefix("LOGISTICS")));

/// Trait for service-specific configuration
pub trait ServiceConfig: Debug + Send + Sync {
    /// Validate this configuration
    fn validate(&self) -> Result<()>;

    /// Service name
    fn service_name(&self) -> &str;
}

/// Configuration for the EasyPost shipping API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EasyPostConfig {
    /// API key
    pub api_key: String,

    /// Base URL (can be changed for proxies and mocks)
    pub base_url: String,

    /// Per-attempt timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for EasyPostConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.easypost.com/v2".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl EasyPostConfig {
    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let config = Self {
            api_key: provider.get_string("easypost_api_key")?,
            base_url: provider.get_string_or("easypost_base_url", "https://api.easypost.com/v2"),
            timeout_seconds: provider.get_u64_or("easypost_timeout_seconds", 30)?,
        };

        config.validate()?;
        Ok(config)
    }
}

impl ServiceConfig for EasyPostConfig {
    fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(ServiceError::invalid_input("EasyPost API key is required"));
        }
        if self.base_url.is_empty() {
            return Err(ServiceError::invalid_input("EasyPost base URL is required"));
        }
        Ok(())
    }

    fn service_name(&self) -> &str {
        "easypost"
    }
}

/// Configuration for the Veeqo inventory API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VeeqoConfig {
    /// API key
    pub api_key: String,

    /// Base URL
    pub base_url: String,

    /// Per-attempt timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for VeeqoConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.veeqo.com".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl VeeqoConfig {
    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let config = Self {
            api_key: provider.get_string("veeqo_api_key")?,
            base_url: provider.get_string_or("veeqo_base_url", "https://api.veeqo.com"),
            timeout_seconds: provider.get_u64_or("veeqo_timeout_seconds", 30)?,
        };

        config.validate()?;
        Ok(config)
    }
}

impl ServiceConfig for VeeqoConfig {
    fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(ServiceError::invalid_input("Veeqo API key is required"));
        }
        if self.base_url.is_empty() {
            return Err(ServiceError::invalid_input("Veeqo base URL is required"));
        }
        Ok(())
    }

    fn service_name(&self) -> &str {
        "veeqo"
    }
}

/// Process-wide resilience tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResilienceConfig {
    /// Maximum physical attempts per logical call
    pub max_attempts: u32,

    /// First exponential backoff delay, milliseconds
    pub base_delay_ms: u64,

    /// Backoff ceiling, milliseconds
    pub max_delay_ms: u64,

    /// Consecutive failures before a breaker opens
    pub breaker_failure_threshold: u32,

    /// Breaker cool-down before a probe, seconds
    pub breaker_reset_timeout_secs: u64,

    /// Idempotency token validity window, hours
    pub idempotency_window_hours: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
            breaker_failure_threshold: 5,
            breaker_reset_timeout_secs: 30,
            idempotency_window_hours: 24,
        }
    }
}

impl ResilienceConfig {
    /// Load resilience tunables from a config provider, defaulting
    /// anything the provider does not carry
    ///
    /// Negative values fail with an InvalidInput error.
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            max_attempts: provider.get_u32_or("max_attempts", defaults.max_attempts)?,
            base_delay_ms: provider.get_u64_or("base_delay_ms", defaults.base_delay_ms)?,
            max_delay_ms: provider.get_u64_or("max_delay_ms", defaults.max_delay_ms)?,
            breaker_failure_threshold: provider.get_u32_or(
                "breaker_failure_threshold",
                defaults.breaker_failure_threshold,
            )?,
            breaker_reset_timeout_secs: provider.get_u64_or(
                "breaker_reset_timeout_secs",
                defaults.breaker_reset_timeout_secs,
            )?,
            idempotency_window_hours: provider.get_u64_or(
                "idempotency_window_hours",
                defaults.idempotency_window_hours,
            )?,
        })
    }

    /// Base backoff delay as a Duration
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Backoff ceiling as a Duration
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Breaker cool-down as a Duration
    pub fn breaker_reset_timeout(&self) -> Duration {
        Duration::from_secs(self.breaker_reset_timeout_secs)
    }

    /// Idempotency window as a Duration
    pub fn idempotency_window(&self) -> Duration {
        Duration::from_secs(self.idempotency_window_hours * 3600)
    }
}
