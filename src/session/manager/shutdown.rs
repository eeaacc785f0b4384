//! Explicit shutdown

use crate::protocol::ProtocolClient;

use super::super::state::SessionState;
use super::core::{RunOutcome, SessionManager};

impl<C: ProtocolClient> SessionManager<C> {
    /// Any state -> `disconnected`, never to retry
    ///
    /// Cancels the pending reconnect timer, then stops the idle scheduler,
    /// then closes the protocol session.
    pub(super) fn shutdown_now(&mut self) -> RunOutcome {
        log::info!("Disconnecting bot...");
        self.set_state(SessionState::Disconnecting);

        if let Some(pending) = self.reconnect.take() {
            pending.cancel.cancel();
            log::debug!("Cancelled reconnect timer {}", pending.ticket);
        }
        self.teardown("Bot shutting down");

        self.set_state(SessionState::Disconnected);
        log::info!("Session manager stopped");
        RunOutcome::Shutdown
    }
}
