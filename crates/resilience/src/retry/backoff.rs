//! Deterministic exponential backoff.

use std::time::Duration;

/// Calculate the delay before the next attempt.
///
/// `attempt` is the 1-based number of the attempt that just failed: the first
/// failure waits `base`, the second `base * multiplier`, and so on, capped at
/// `max`. The sequence is deterministic - no jitter - so callers and tests
/// can predict exactly how long a retry sequence takes.
pub fn backoff_delay(attempt: u32, base: Duration, multiplier: f64, max: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let raw = base.as_secs_f64() * multiplier.powi((attempt - 1) as i32);
    let capped = raw.min(max.as_secs_f64());

    Duration::from_secs_f64(capped)
}
