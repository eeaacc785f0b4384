//! Anti-idle tick

use std::time::Duration;

use crate::random::SharedRng;
use crate::session::SessionLink;
use crate::types::MinorAction;

use super::activity::ActivityClock;

/// What one anti-idle tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Activity was recent enough; nothing happened
    Skipped,
    /// An action was issued
    Performed(MinorAction),
    /// An action was chosen but the session rejected it
    Failed(MinorAction),
}

impl TickOutcome {
    /// Whether the tick attempted an action
    #[must_use]
    pub const fn fired(self) -> bool {
        !matches!(self, Self::Skipped)
    }
}

/// Run one anti-idle check
///
/// Fires only when the bot has been idle for at least `threshold`. The
/// action is a uniform pick from [`MinorAction::ALL`]. Failures are logged
/// and never propagated; the activity clock is reset either way so a
/// failing session is not hammered on every tick.
pub fn anti_idle_tick(
    link: &SessionLink,
    activity: &ActivityClock,
    threshold: Duration,
    rng: &SharedRng,
) -> TickOutcome {
    let idle = activity.idle_for();
    if idle < threshold {
        log::trace!("Anti-idle skipped, idle for {}s", idle.as_secs());
        return TickOutcome::Skipped;
    }

    let Some(&action) = rng.choose(&MinorAction::ALL) else {
        return TickOutcome::Skipped;
    };

    let outcome = match link.perform_minor_action(action) {
        Ok(()) => {
            log::debug!("Performed anti-idle action: {action}");
            TickOutcome::Performed(action)
        }
        Err(e) => {
            log::error!("Anti-idle action {action} failed: {e}");
            TickOutcome::Failed(action)
        }
    };
    activity.touch();
    outcome
}
