//! Exponential backoff schedule for retry delays
//!
//! Delays grow strictly exponentially from a base, are capped at a
//! ceiling, and are scaled by a uniform random jitter factor in
//! [0.5, 1.0] so concurrent callers do not retry in lockstep.

use std::time::Duration;

use rand::Rng;

/// Lower bound of the jitter scale factor
const JITTER_MIN: f64 = 0.5;

/// Compute the un-jittered delay for the given retry index (0-based)
///
/// `base * 2^retry_index`, capped at `max`.
pub fn raw_delay(base: Duration, max: Duration, retry_index: u32) -> Duration {
    let multiplier = 2u32.checked_pow(retry_index).unwrap_or(u32::MAX);
    base.checked_mul(multiplier).unwrap_or(max).min(max)
}

/// Compute the jittered delay for the given retry index (0-based)
pub fn jittered_delay(base: Duration, max: Duration, retry_index: u32) -> Duration {
    let raw = raw_delay(base, max, retry_index);
    let scale = rand::thread_rng().gen_range(JITTER_MIN..=1.0);
    raw.mul_f64(scale)
}
