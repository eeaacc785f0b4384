//! Manager event queue
//!
//! Every asynchronous source (protocol callbacks, the in-flight open, login
//! and reconnect timers) posts into one unbounded queue that the session
//! manager drains on a single task, so state is only ever mutated there.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::Result;
use crate::protocol::ProtocolSession;
use crate::types::{ProtocolEvent, SessionId};

/// Internal events consumed by the session manager loop
pub(crate) enum ManagerEvent {
    /// An event reported by the protocol layer for one session
    Protocol {
        session: SessionId,
        event: ProtocolEvent,
    },
    /// The `open` call for a connect attempt finished
    Opened {
        session: SessionId,
        result: Result<Arc<dyn ProtocolSession>>,
    },
    /// A connect attempt did not log in within the login timeout
    LoginTimeout { session: SessionId },
    /// A scheduled reconnect delay elapsed
    ReconnectDue { ticket: u64 },
}

impl std::fmt::Debug for ManagerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Protocol { session, event } => f
                .debug_struct("Protocol")
                .field("session", session)
                .field("event", event)
                .finish(),
            Self::Opened { session, result } => f
                .debug_struct("Opened")
                .field("session", session)
                .field("ok", &result.is_ok())
                .finish(),
            Self::LoginTimeout { session } => f
                .debug_struct("LoginTimeout")
                .field("session", session)
                .finish(),
            Self::ReconnectDue { ticket } => f
                .debug_struct("ReconnectDue")
                .field("ticket", ticket)
                .finish(),
        }
    }
}

/// Per-session event sender handed to [`crate::protocol::ProtocolClient::open`]
///
/// Tags every event with the session it belongs to. Once that session has
/// been superseded the manager drops whatever arrives through this sink.
#[derive(Clone)]
pub struct EventSink {
    session: SessionId,
    tx: mpsc::UnboundedSender<ManagerEvent>,
}

impl EventSink {
    pub(crate) const fn new(session: SessionId, tx: mpsc::UnboundedSender<ManagerEvent>) -> Self {
        Self { session, tx }
    }

    /// Session this sink reports for
    #[must_use]
    pub const fn session(&self) -> SessionId {
        self.session
    }

    /// Post an event to the manager
    ///
    /// Returns `false` once the manager has stopped.
    pub fn emit(&self, event: ProtocolEvent) -> bool {
        self.tx
            .send(ManagerEvent::Protocol {
                session: self.session,
                event,
            })
            .is_ok()
    }

    /// Whether the manager has stopped listening
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("session", &self.session)
            .finish()
    }
}
