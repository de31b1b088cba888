use std::fmt::Debug;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::probe::ProbeResult;

pub mod clock;
pub mod retry;

pub use clock::{Clock, ManualClock, SystemClock};

/// Default pause between two checks.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 200;

/// Default total budget of a poll.
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 10_000;

// ============================================================================
// Config and outcome
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    pub interval_ms: u64,
    pub timeout_ms: u64,
}

impl PollConfig {
    /// An interval of zero is raised to 1ms so the loop always makes progress.
    pub fn new(interval_ms: u64, timeout_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            timeout_ms,
        }
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_TIMEOUT_MS)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    Success {
        value: T,
        elapsed_ms: u64,
        attempts: u32,
    },
    TimedOut {
        elapsed_ms: u64,
        attempts: u32,
        /// What the final check saw: `NotFound`, or a value that was not accepted
        last_result: ProbeResult<T>,
    },
}

impl<T> PollOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, PollOutcome::Success { .. })
    }

    pub fn elapsed_ms(&self) -> u64 {
        match self {
            PollOutcome::Success { elapsed_ms, .. } | PollOutcome::TimedOut { elapsed_ms, .. } => {
                *elapsed_ms
            }
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Success { attempts, .. } | PollOutcome::TimedOut { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn value(self) -> Option<T> {
        match self {
            PollOutcome::Success { value, .. } => Some(value),
            PollOutcome::TimedOut { .. } => None,
        }
    }
}

impl<T: Debug> PollOutcome<T> {
    /// Human-readable account, e.g. for a report attachment.
    pub fn reason(&self, description: &str) -> String {
        match self {
            PollOutcome::Success {
                value,
                elapsed_ms,
                attempts,
            } => format!(
                "{} after {}ms ({} attempts, value: {:?})",
                description, elapsed_ms, attempts, value
            ),
            PollOutcome::TimedOut {
                elapsed_ms,
                attempts,
                last_result,
            } => format!(
                "timed out after {}ms waiting for {} ({} attempts, last: {:?})",
                elapsed_ms, description, attempts, last_result
            ),
        }
    }
}

/// A driver fault seen while polling. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("driver fault after {attempts} attempt(s) in {elapsed_ms}ms: {reason}")]
pub struct ProbeFault {
    pub reason: String,
    pub elapsed_ms: u64,
    pub attempts: u32,
}

// ============================================================================
// Poller
// ============================================================================

/// Fixed-interval, time-bounded retry of a point-in-time check.
#[derive(Debug, Clone)]
pub struct Poller<C: Clock = SystemClock> {
    config: PollConfig,
    clock: C,
}

impl Poller<SystemClock> {
    pub fn new(config: PollConfig) -> Self {
        Self::with_clock(config, SystemClock::new())
    }
}

impl<C: Clock> Poller<C> {
    pub fn with_clock(config: PollConfig, clock: C) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> PollConfig {
        self.config
    }

    /// Poll until `check` finds anything.
    pub fn poll<T, F>(&self, check: F) -> Result<PollOutcome<T>, ProbeFault>
    where
        F: FnMut() -> ProbeResult<T>,
    {
        self.poll_until(check, |_| true)
    }

    /// Poll until `check` finds a value `accept` agrees with.
    ///
    /// Returns `TimedOut` once the timeout is spent; the last sleep is cut
    /// short so the final check happens at the deadline. A further check is
    /// skipped when, at the cost of the previous one, it would end past
    /// `timeout + interval`. `Errored` stops the poll at once.
    pub fn poll_until<T, F, A>(&self, mut check: F, accept: A) -> Result<PollOutcome<T>, ProbeFault>
    where
        F: FnMut() -> ProbeResult<T>,
        A: Fn(&T) -> bool,
    {
        let timeout = Duration::from_millis(self.config.timeout_ms);
        let interval = Duration::from_millis(self.config.interval_ms.max(1));
        let overrun_limit = timeout + interval;
        let start = self.clock.now();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let check_start = self.clock.now();
            let result = check();
            let now = self.clock.now();
            let check_cost = now.saturating_sub(check_start);
            let elapsed = now.saturating_sub(start);
            let elapsed_ms = elapsed.as_millis() as u64;

            match result {
                ProbeResult::Found(value) if accept(&value) => {
                    debug!(attempts, elapsed_ms, "poll succeeded");
                    return Ok(PollOutcome::Success {
                        value,
                        elapsed_ms,
                        attempts,
                    });
                }
                ProbeResult::Errored(reason) => {
                    debug!(attempts, elapsed_ms, %reason, "poll stopped by driver fault");
                    return Err(ProbeFault {
                        reason,
                        elapsed_ms,
                        attempts,
                    });
                }
                last_result => {
                    if elapsed >= timeout {
                        debug!(attempts, elapsed_ms, "poll timed out");
                        return Ok(PollOutcome::TimedOut {
                            elapsed_ms,
                            attempts,
                            last_result,
                        });
                    }
                    let pause = interval.min(timeout - elapsed);
                    if elapsed + pause + check_cost > overrun_limit {
                        debug!(
                            attempts,
                            elapsed_ms,
                            check_ms = check_cost.as_millis() as u64,
                            "poll timed out, next check would overrun"
                        );
                        return Ok(PollOutcome::TimedOut {
                            elapsed_ms,
                            attempts,
                            last_result,
                        });
                    }
                    trace!(attempts, elapsed_ms, "condition not met yet");
                    self.clock.sleep(pause);
                }
            }
        }
    }

    /// Poll a count until it reaches at least `expected`.
    pub fn poll_at_least<F>(&self, check: F, expected: u32) -> Result<PollOutcome<u32>, ProbeFault>
    where
        F: FnMut() -> ProbeResult<u32>,
    {
        self.poll_until(check, |actual| at_least(*actual, expected))
    }

    /// Poll a count until it is exactly `expected`.
    pub fn poll_exactly<F>(&self, check: F, expected: u32) -> Result<PollOutcome<u32>, ProbeFault>
    where
        F: FnMut() -> ProbeResult<u32>,
    {
        self.poll_until(check, |actual| *actual == expected)
    }

    /// Poll until `check` stops finding anything (a spinner going away).
    pub fn poll_absent<T, F>(&self, mut check: F) -> Result<PollOutcome<()>, ProbeFault>
    where
        F: FnMut() -> ProbeResult<T>,
    {
        self.poll(|| match check() {
            ProbeResult::NotFound => ProbeResult::Found(()),
            ProbeResult::Found(_) => ProbeResult::NotFound,
            ProbeResult::Errored(reason) => ProbeResult::Errored(reason),
        })
    }
}

// ============================================================================
// Count comparisons
// ============================================================================

/// The "at least" business rule, e.g. cart quantity after an increment.
pub fn at_least(actual: u32, expected: u32) -> bool {
    actual >= expected
}

pub fn assert_at_least(actual: u32, expected: u32) -> Result<(), String> {
    if at_least(actual, expected) {
        Ok(())
    } else {
        Err(format!("expected at least {} but found {}", expected, actual))
    }
}

/// Only for scenarios that expect an exact count, such as an emptied cart.
pub fn assert_exact(actual: u32, expected: u32) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected exactly {} but found {}", expected, actual))
    }
}
