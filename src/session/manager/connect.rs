//! Opening connect attempts and completing login

use std::sync::Arc;

use tokio::time::Instant;

use crate::error::Result;
use crate::protocol::{ProtocolClient, ProtocolSession};
use crate::types::SessionId;

use super::super::events::{EventSink, ManagerEvent};
use super::super::link::SessionLink;
use super::super::record::{LoginInfo, Session};
use super::super::state::SessionState;
use super::core::{RunOutcome, SessionManager};

impl<C: ProtocolClient> SessionManager<C> {
    /// Start a new connect attempt with a fresh session record
    ///
    /// The attempt count is carried over; only a successful login resets it.
    pub(super) fn begin_connect(&mut self) {
        let id = SessionId::new();
        let lifetime = self.shutdown.child_token();
        self.session = Some(Session::new(id, lifetime.clone()));
        self.set_state(SessionState::Connecting);

        log::info!(
            "Connecting to {}:{} as {} (session {id}, attempt {}/{})",
            self.params.host,
            self.params.port,
            self.params.username,
            self.attempt_count,
            self.policy.max_attempts
        );

        // Open in the background; the result comes back through the queue
        let client = Arc::clone(&self.client);
        let params = self.params.clone();
        let sink = EventSink::new(id, self.events_tx.clone());
        let tx = self.events_tx.clone();
        let token = lifetime.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    log::debug!("Open for session {id} abandoned");
                }
                result = client.open(params, sink) => {
                    let event = ManagerEvent::Opened { session: id, result };
                    if let Err(rejected) = tx.send(event)
                        && let ManagerEvent::Opened { result: Ok(handle), .. } = rejected.0
                    {
                        handle.close("client shutting down");
                    }
                }
            }
        });

        // Login watchdog
        let tx = self.events_tx.clone();
        let timeout = self.login_timeout;
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = lifetime.cancelled() => {}
                () = tokio::time::sleep(timeout) => {
                    let _ = tx.send(ManagerEvent::LoginTimeout { session: id });
                }
            }
        });
    }

    /// Handle the result of an `open` call
    pub(super) fn on_opened(
        &mut self,
        id: SessionId,
        result: Result<Arc<dyn ProtocolSession>>,
    ) -> Option<RunOutcome> {
        let Some(record) = self.session.as_mut().filter(|s| s.id == id) else {
            log::debug!("Discarding open result for stale session {id}");
            if let Ok(handle) = result {
                handle.close("superseded");
            }
            return None;
        };

        match result {
            Ok(handle) => {
                log::debug!("Session {id} opened");
                record.handle = Some(handle);
                let Some(username) = record.pending_login.take() else {
                    return None;
                };
                let deferred = std::mem::take(&mut record.deferred);
                self.complete_login(username);
                if !deferred.is_empty() {
                    log::debug!("Replaying {} deferred events for session {id}", deferred.len());
                }
                deferred
                    .into_iter()
                    .find_map(|event| self.on_protocol_event(event))
            }
            Err(e) => {
                log::error!("Connect attempt for session {id} failed: {e}");
                self.handle_failure(&format!("connect failed: {e}"))
            }
        }
    }

    /// Handle a login event for the current session
    pub(super) fn on_login(&mut self, username: String) {
        let Some(record) = self.session.as_mut() else {
            return;
        };
        if record.is_logged_in() {
            log::debug!("Ignoring repeated login for session {}", record.id);
            return;
        }
        if record.handle.is_none() {
            // Login raced ahead of the open result
            record.pending_login = Some(username);
            return;
        }
        self.complete_login(username);
    }

    /// `connecting -> connected`
    ///
    /// Resets the attempt count, starts the idle scheduler and binds the
    /// dispatcher to a link issued for this session.
    fn complete_login(&mut self, username: String) {
        let Some(record) = self.session.as_mut() else {
            return;
        };
        let Some(handle) = record.handle.clone() else {
            return;
        };
        let connected_at = Instant::now();
        let link = SessionLink::new(record.id, handle, record.lifetime.clone());
        log::info!(
            "Logged in as {username} (session {}, {}ms after open)",
            record.id,
            connected_at.duration_since(record.started_at).as_millis()
        );
        record.login = Some(LoginInfo {
            username,
            link: link.clone(),
        });

        self.attempt_count = 0;
        self.set_state(SessionState::Connected);
        self.scheduler.start(link.clone());
        self.dispatcher.bind(link, connected_at);
    }

    /// Login watchdog fired for `id`
    pub(super) fn on_login_timeout(&mut self, id: SessionId) -> Option<RunOutcome> {
        let current = self
            .session
            .as_ref()
            .is_some_and(|s| s.id == id && !s.is_logged_in());
        if !current {
            return None;
        }
        log::warn!(
            "Session {id} did not log in within {}s",
            self.login_timeout.as_secs()
        );
        self.handle_failure("login timed out")
    }
}
