use std::fmt::Display;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::poll::clock::Clock;

/// Retry schedule for flaky mutating actions (clicks, navigation).
/// Unlike UI polling, the delay doubles after every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 250,
            max_delay_ms: 5_000,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            initial_delay_ms,
            ..Self::default()
        }
    }

    /// Delay after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(
            self.initial_delay_ms
                .saturating_mul(factor)
                .min(self.max_delay_ms),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("gave up after {attempts} attempt(s): {last_error}")]
pub struct RetryFailure<E: Display> {
    pub attempts: u32,
    pub last_error: E,
}

/// Run `action` until it succeeds or the policy's attempts are used up.
pub fn retry_with_backoff<T, E, F, C>(
    policy: &RetryPolicy,
    clock: &C,
    action: F,
) -> Result<T, RetryFailure<E>>
where
    E: Display,
    F: FnMut(u32) -> Result<T, E>,
    C: Clock,
{
    retry_with_backoff_if(policy, clock, action, |_| true)
}

/// Like `retry_with_backoff`, but errors `should_retry` rejects end the
/// retries immediately.
pub fn retry_with_backoff_if<T, E, F, R, C>(
    policy: &RetryPolicy,
    clock: &C,
    mut action: F,
    should_retry: R,
) -> Result<T, RetryFailure<E>>
where
    E: Display,
    F: FnMut(u32) -> Result<T, E>,
    R: Fn(&E) -> bool,
    C: Clock,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match action(attempt) {
            Ok(value) => return Ok(value),
            Err(error) if attempt < max_attempts && should_retry(&error) => {
                let delay = policy.delay_after(attempt);
                warn!(attempt, max_attempts, delay_ms = delay.as_millis() as u64, %error, "action failed, retrying");
                clock.sleep(delay);
                attempt += 1;
            }
            Err(error) => {
                return Err(RetryFailure {
                    attempts: attempt,
                    last_error: error,
                });
            }
        }
    }
}
