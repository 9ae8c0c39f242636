//! Bounded retry around fallible async operations.
//!
//! # Design Decisions
//! - Tuning is an explicit policy struct, not module constants, so tests can
//!   inject zero-delay variants
//! - The helper suspends between attempts; it never busy-waits
//! - The last-seen error is returned once attempts are exhausted

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::config::RetrySettings;
use crate::resilience::backoff::backoff_delay;

/// Retry tuning for one call site.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts = max_retries + 1.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// A policy that never waits, for tests.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(0),
            max_delay: Duration::from_millis(0),
        }
    }

    fn delay_before(&self, attempt: u32) -> Duration {
        backoff_delay(
            attempt,
            self.initial_delay.as_millis() as u64,
            self.max_delay.as_millis() as u64,
        )
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
        }
    }
}

/// Run `op` until it succeeds or the policy's attempts are exhausted,
/// sleeping a capped, non-decreasing delay between attempts.
pub async fn retry_with_backoff<T, E, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= policy.max_retries => {
                tracing::warn!(attempts = attempt + 1, error = %e, "retries exhausted");
                return Err(e);
            }
            Err(e) => {
                attempt += 1;
                let delay = policy.delay_before(attempt);
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "attempt failed, backing off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
