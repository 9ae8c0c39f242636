//! Capped exponential backoff.

use std::time::Duration;

/// Calculate the delay before the given attempt (attempt 0 is the first try
/// and never waits). Delays double per attempt and are capped at `max_ms`,
/// so the sequence is monotonically non-decreasing. No jitter: callers rely
/// on the non-decreasing guarantee.
pub fn backoff_delay(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);

    Duration::from_millis(delay_ms.min(max_ms))
}
