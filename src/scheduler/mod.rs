//! Idle scheduler
//!
//! Two independently ticking background tasks that run only while a session
//! is connected:
//!
//! - `anti_idle` - every `anti_idle_interval`, performs one minor action if
//!   no chat activity was seen for `idle_threshold`
//! - `health` - every `health_interval`, logs a [`HealthReport`]
//!
//! Both tasks are cancelled by [`IdleScheduler::stop`] and also end on their
//! own once the [`SessionLink`] they were started with is revoked. Tick
//! bodies are synchronous, so a tick is never interrupted half way.

mod activity;
mod anti_idle;
mod health;

use std::time::Duration;

use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;

use crate::random::SharedRng;
use crate::session::SessionLink;
use crate::types::SessionId;

pub use activity::ActivityClock;
pub use anti_idle::{TickOutcome, anti_idle_tick};
pub use health::{HealthReport, health_tick};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Default idle time before an anti-idle action fires
pub const DEFAULT_IDLE_THRESHOLD: Duration = Duration::from_secs(300);

/// Default anti-idle tick
pub const DEFAULT_ANTI_IDLE_INTERVAL: Duration = Duration::from_secs(60);

/// Default health report tick
pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Scheduler timings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Whether the anti-idle task runs at all
    pub anti_idle_enabled: bool,
    /// Idle time at or beyond which an anti-idle action fires
    pub idle_threshold: Duration,
    /// Anti-idle tick
    pub anti_idle_interval: Duration,
    /// Health report tick
    pub health_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            anti_idle_enabled: true,
            idle_threshold: DEFAULT_IDLE_THRESHOLD,
            anti_idle_interval: DEFAULT_ANTI_IDLE_INTERVAL,
            health_interval: DEFAULT_HEALTH_INTERVAL,
        }
    }
}

// ============================================================================
// SCHEDULER
// ============================================================================

struct Running {
    session: SessionId,
    cancel: CancellationToken,
}

/// Owner of the anti-idle and health report tasks
pub struct IdleScheduler {
    config: SchedulerConfig,
    activity: ActivityClock,
    rng: SharedRng,
    running: Option<Running>,
}

impl IdleScheduler {
    /// Create a stopped scheduler
    #[must_use]
    pub fn new(config: SchedulerConfig, activity: ActivityClock, rng: SharedRng) -> Self {
        Self {
            config,
            activity,
            rng,
            running: None,
        }
    }

    /// Timings in use
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Activity clock consulted by the anti-idle task
    #[must_use]
    pub const fn activity(&self) -> &ActivityClock {
        &self.activity
    }

    /// Whether the tasks are running
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Session the tasks were started for
    #[must_use]
    pub fn session(&self) -> Option<SessionId> {
        self.running.as_ref().map(|r| r.session)
    }

    /// Start both tasks against `link`
    ///
    /// Any tasks from a previous start are stopped first. The activity clock
    /// is reset: a freshly connected session counts as active.
    pub fn start(&mut self, link: SessionLink) {
        self.stop();

        let cancel = CancellationToken::new();
        self.activity.touch();

        if self.config.anti_idle_enabled {
            let link = link.clone();
            let cancel = cancel.clone();
            let activity = self.activity.clone();
            let rng = self.rng.clone();
            let period = self.config.anti_idle_interval;
            let threshold = self.config.idle_threshold;
            tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                loop {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => break,
                        () = link.revoked() => break,
                        _ = ticker.tick() => {
                            anti_idle_tick(&link, &activity, threshold, &rng);
                        }
                    }
                }
                log::trace!("Anti-idle task for session {} ended", link.id());
            });
        }

        {
            let link = link.clone();
            let cancel = cancel.clone();
            let period = self.config.health_interval;
            tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                loop {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => break,
                        () = link.revoked() => break,
                        _ = ticker.tick() => {
                            health_tick(&link);
                        }
                    }
                }
                log::trace!("Health report task for session {} ended", link.id());
            });
        }

        log::debug!("Idle scheduler started for session {}", link.id());
        self.running = Some(Running {
            session: link.id(),
            cancel,
        });
    }

    /// Cancel both tasks; no further ticks fire. Idempotent.
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancel.cancel();
            log::debug!("Idle scheduler stopped for session {}", running.session);
        }
    }
}

impl Drop for IdleScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for IdleScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdleScheduler")
            .field("config", &self.config)
            .field("session", &self.session())
            .finish_non_exhaustive()
    }
}
