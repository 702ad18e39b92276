//! Common utility functions

/// Generate a unique request ID
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Truncate a string to a maximum length, adding ellipsis if truncated
///
/// Truncation lands on a char boundary, so multi-byte vendor bodies never
/// cause a panic.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }

    let budget = max_len.saturating_sub(3);
    let cut = (0..=budget).rev().find(|i| s.is_char_boundary(*i)).unwrap_or(0);
    if max_len <= 3 {
        s[..cut].to_string()
    } else {
        format!("{}...", &s[..cut])
    }
}

/// Sanitize a string for logging (remove sensitive data patterns)
pub fn sanitize_for_logging(s: &str) -> String {
    let patterns = [
        (r"Bearer [A-Za-z0-9\-_]+", "Bearer [REDACTED]"),
        (r"(?i)api[_-]?key[=:]\s*[A-Za-z0-9\-_]+", "api_key=[REDACTED]"),
        (r"(?i)idempotency-key[=:]\s*[A-Za-z0-9\-]+", "idempotency-key=[REDACTED]"),
    ];

    let mut result = s.to_string();
    for (pattern, replacement) in patterns {
        if let Ok(re) = regex::Regex::new(pattern) {
            result = re.replace_all(&result, replacement).to_string();
        }
    }
    result
}
