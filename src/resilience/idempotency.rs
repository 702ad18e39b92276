//! Idempotency keys for safely retrying mutating calls
//!
//! Retrying a label purchase or order creation after a transport failure
//! must not execute the side effect twice. This manager derives a stable
//! token for each (endpoint, canonicalized body) pair so the vendor can
//! recognize and collapse duplicate attempts of the same logical call.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;

/// How long a token remains valid for a given (endpoint, body) pair
pub const DEFAULT_IDEMPOTENCY_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// How often the lazy sweep runs at most
const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// A cached idempotency token and when it was issued
#[derive(Debug, Clone)]
struct IdempotencyRecord {
    token: String,
    issued_at: Instant,
}

struct Inner {
    records: HashMap<String, IdempotencyRecord>,
    last_sweep: Instant,
}

/// Process-wide idempotency key cache
///
/// Explicitly constructed and shared via `Arc`; lookups and inserts for
/// the same key are atomic under one mutex, so two concurrent retries of
/// the same logical operation always observe the same token.
pub struct IdempotencyKeys {
    inner: Mutex<Inner>,
    window: Duration,
}

impl Default for IdempotencyKeys {
    fn default() -> Self {
        Self::new(DEFAULT_IDEMPOTENCY_WINDOW)
    }
}

impl IdempotencyKeys {
    /// Create a manager with the given validity window
    pub fn new(window: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                records: HashMap::new(),
                last_sweep: Instant::now(),
            }),
            window,
        }
    }

    /// Get the stable token for an (endpoint, body) pair
    ///
    /// Returns the cached token while its window is open; otherwise issues
    /// a fresh UUID, stores it, and returns it. Expiry is evaluated here at
    /// read time, so a stale record is never returned even if no sweep has
    /// run.
    pub fn key_for(&self, endpoint: &str, body: &Value) -> String {
        let cache_key = format!("{}:{}", endpoint, canonical_json(body));
        let now = Instant::now();

        let mut inner = self.inner.lock().unwrap();

        if now.duration_since(inner.last_sweep) >= SWEEP_INTERVAL {
            let window = self.window;
            inner
                .records
                .retain(|_, record| now.duration_since(record.issued_at) < window);
            inner.last_sweep = now;
        }

        match inner.records.get(&cache_key) {
            Some(record) if now.duration_since(record.issued_at) < self.window => {
                record.token.clone()
            }
            _ => {
                let token = uuid::Uuid::new_v4().to_string();
                log::debug!("issued idempotency key for {}", endpoint);
                inner.records.insert(
                    cache_key,
                    IdempotencyRecord {
                        token: token.clone(),
                        issued_at: now,
                    },
                );
                token
            }
        }
    }

    /// Remove all records older than the window
    pub fn sweep(&self) {
        let now = Instant::now();
        let mut inner = self.inner.lock().unwrap();
        let window = self.window;
        inner
            .records
            .retain(|_, record| now.duration_since(record.issued_at) < window);
        inner.last_sweep = now;
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().records.len()
    }

    /// Whether the cache holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Deterministic serialization of a JSON value
///
/// Object keys are sorted recursively; array order is preserved.
/// Semantically identical bodies produce the same string regardless of
/// field ordering, which makes the cache key stable.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let fields: Vec<String> = keys
                .into_iter()
                .map(|k| {
                    format!(
                        "{}:{}",
                        serde_json::to_string(k).unwrap_or_default(),
                        canonical_json(&map[k])
                    )
                })
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let elements: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", elements.join(","))
        }
        other => other.to_string(),
    }
}
