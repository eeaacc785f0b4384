//! Routing of queued events by state

use crate::protocol::ProtocolClient;
use crate::types::{ProtocolEvent, ProtocolFault, SessionId};

use super::super::events::ManagerEvent;
use super::super::state::SessionState;
use super::core::{RunOutcome, SessionManager};

impl<C: ProtocolClient> SessionManager<C> {
    /// Apply one queued event
    ///
    /// Returns an outcome when the manager has reached a terminal state.
    pub(super) fn handle_event(&mut self, event: ManagerEvent) -> Option<RunOutcome> {
        match event {
            ManagerEvent::Opened { session, result } => self.on_opened(session, result),
            ManagerEvent::LoginTimeout { session } => self.on_login_timeout(session),
            ManagerEvent::ReconnectDue { ticket } => {
                self.on_reconnect_due(ticket);
                None
            }
            ManagerEvent::Protocol { session, event } => {
                if !self.is_current(session) {
                    log::debug!("Dropping stale {} event from session {session}", event.name());
                    return None;
                }
                if let Some(event) = self.defer_until_opened(event) {
                    return self.on_protocol_event(event);
                }
                None
            }
        }
    }

    pub(super) fn is_current(&self, id: SessionId) -> bool {
        self.session.as_ref().is_some_and(|s| s.id == id)
    }

    /// Hold back events that arrive after login but before `open` returned
    ///
    /// Terminal events and logins pass through; everything else is kept on
    /// the session record and replayed once login completes.
    fn defer_until_opened(&mut self, event: ProtocolEvent) -> Option<ProtocolEvent> {
        let passes = matches!(
            event,
            ProtocolEvent::LoginSuccess { .. }
                | ProtocolEvent::SessionEnded { .. }
                | ProtocolEvent::Kicked { .. }
                | ProtocolEvent::Error(_)
        );
        match self.session.as_mut() {
            Some(record) if !passes && record.pending_login.is_some() => {
                record.deferred.push(event);
                None
            }
            _ => Some(event),
        }
    }

    pub(super) fn on_protocol_event(&mut self, event: ProtocolEvent) -> Option<RunOutcome> {
        match event {
            ProtocolEvent::LoginSuccess { username } => {
                if self.state == SessionState::Connecting {
                    self.on_login(username);
                }
                None
            }
            ProtocolEvent::SessionEnded { reason } => {
                log::warn!("Bot disconnected: {reason}");
                self.handle_failure(&reason)
            }
            ProtocolEvent::Kicked { reason, logged_in } => {
                log::warn!("Bot was kicked: {reason} (logged in: {logged_in})");
                self.handle_failure(&format!("kicked: {reason}"))
            }
            ProtocolEvent::Error(fault) => self.on_fault(fault),
            ProtocolEvent::Spawned => {
                self.on_spawned();
                None
            }
            ProtocolEvent::ChatReceived { sender, text } => {
                if self.state == SessionState::Connected {
                    self.on_chat(&sender, &text);
                }
                None
            }
            ProtocolEvent::VitalsChanged(vitals) => {
                if vitals.is_low_health() {
                    log::warn!("Low health: {}/20", vitals.health);
                }
                None
            }
            ProtocolEvent::PlayerJoined { username } => {
                log::info!("Player joined: {username}");
                self.on_player_joined(&username);
                None
            }
            ProtocolEvent::PlayerLeft { username } => {
                log::info!("Player left: {username}");
                None
            }
            ProtocolEvent::Died => {
                self.on_died();
                None
            }
        }
    }

    /// Errors fail a pending attempt; once connected only transient ones do
    fn on_fault(&mut self, fault: ProtocolFault) -> Option<RunOutcome> {
        log::error!("Bot error: {fault}");
        match self.state {
            SessionState::Connecting => self.handle_failure(&fault.to_string()),
            SessionState::Connected if fault.is_transient() => {
                self.handle_failure(&fault.to_string())
            }
            _ => None,
        }
    }
}
