//! Teardown, retry budget and backoff timers

use std::time::Duration;

use crate::protocol::ProtocolClient;

use super::super::events::ManagerEvent;
use super::super::state::SessionState;
use super::core::{PendingReconnect, RunOutcome, SessionManager};

impl<C: ProtocolClient> SessionManager<C> {
    /// Stop everything bound to the current session and drop it
    ///
    /// Later events from the dropped session are stale and ignored, which
    /// makes a second terminal event for the same session a no-op.
    pub(super) fn teardown(&mut self, reason: &str) {
        self.scheduler.stop();
        self.dispatcher.unbind();
        if let Some(record) = self.session.take() {
            log::debug!("Tearing down session {}: {reason}", record.id);
            record.close(reason);
        }
    }

    /// A connect attempt or live session failed
    ///
    /// Either schedules the next attempt after `base_delay * n` or, once
    /// the budget is spent, settles in `disconnected` and ends the run.
    pub(super) fn handle_failure(&mut self, reason: &str) -> Option<RunOutcome> {
        self.teardown(reason);

        if !self.policy.allows(self.attempt_count) {
            log::error!(
                "Max reconnection attempts ({}) reached. Giving up.",
                self.policy.max_attempts
            );
            self.set_state(SessionState::Disconnected);
            return Some(RunOutcome::RetriesExhausted {
                attempts: self.attempt_count,
            });
        }

        self.attempt_count += 1;
        let delay = self.policy.delay_for(self.attempt_count);
        log::info!(
            "Attempting to reconnect in {}s... (Attempt {}/{})",
            delay.as_secs_f64(),
            self.attempt_count,
            self.policy.max_attempts
        );
        self.schedule_reconnect(delay);
        self.set_state(SessionState::Connecting);
        None
    }

    fn schedule_reconnect(&mut self, delay: Duration) {
        if let Some(previous) = self.reconnect.take() {
            previous.cancel.cancel();
        }
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let cancel = self.shutdown.child_token();
        let token = cancel.clone();
        let tx = self.events_tx.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    let _ = tx.send(ManagerEvent::ReconnectDue { ticket });
                }
            }
        });

        self.reconnect = Some(PendingReconnect { ticket, cancel });
    }

    pub(super) fn on_reconnect_due(&mut self, ticket: u64) {
        if !self.reconnect.as_ref().is_some_and(|p| p.ticket == ticket) {
            log::debug!("Ignoring stale reconnect timer {ticket}");
            return;
        }
        self.reconnect = None;
        self.begin_connect();
    }
}
