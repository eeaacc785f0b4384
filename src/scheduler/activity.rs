//! Last-activity clock shared between the chat path and the anti-idle task

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Timestamp of the last observed chat activity
///
/// Cloning yields a handle onto the same clock.
#[derive(Debug, Clone)]
pub struct ActivityClock {
    last: Arc<Mutex<Instant>>,
}

impl ActivityClock {
    /// Create a clock that starts now
    #[must_use]
    pub fn new() -> Self {
        Self {
            last: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Record activity at the current instant
    pub fn touch(&self) {
        *self.last.lock() = Instant::now();
    }

    /// Instant of the last recorded activity
    #[must_use]
    pub fn last(&self) -> Instant {
        *self.last.lock()
    }

    /// Time elapsed since the last recorded activity
    #[must_use]
    pub fn idle_for(&self) -> Duration {
        Instant::now().saturating_duration_since(self.last())
    }
}

impl Default for ActivityClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn idle_time_grows_until_touched() {
        let clock = ActivityClock::new();
        tokio::time::advance(Duration::from_secs(90)).await;
        assert_eq!(clock.idle_for(), Duration::from_secs(90));

        let shared = clock.clone();
        shared.touch();
        assert_eq!(clock.idle_for(), Duration::ZERO);
    }
}
