//! Reconnect budget and backoff
//!
//! Backoff is linear: attempt `n` (1-indexed) waits `base_delay * n`.

use std::time::Duration;

/// Retry budget and base delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive reconnect attempts allowed before giving up
    pub max_attempts: u32,
    /// Delay unit; attempt `n` waits `base_delay * n`
    pub base_delay: Duration,
}

/// Default retry budget
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default delay unit
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(5);

impl RetryPolicy {
    /// Create a policy
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay before reconnect attempt `attempt` (1-indexed)
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Whether another attempt fits in the budget after `attempts_made`
    #[must_use]
    pub const fn allows(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}
