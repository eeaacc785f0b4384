//! Per-attempt session record owned by the manager

use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::protocol::ProtocolSession;
use crate::types::{ProtocolEvent, SessionId};

use super::link::SessionLink;

/// State established by a successful login
pub(crate) struct LoginInfo {
    /// Name the server assigned
    pub username: String,
    /// Capability handed to the dispatcher, scheduler and chat timers
    pub link: SessionLink,
}

/// One connect attempt
///
/// A fresh record is created for every attempt and dropped on teardown, so
/// nothing from an earlier attempt can be mistaken for the current one.
pub(crate) struct Session {
    pub id: SessionId,
    /// Cancelled on teardown; revokes links and stops the attempt's tasks
    pub lifetime: CancellationToken,
    pub started_at: Instant,
    /// Set once `open` has returned
    pub handle: Option<Arc<dyn ProtocolSession>>,
    /// Login reported before `open` returned
    pub pending_login: Option<String>,
    /// Events that followed a pending login, replayed once login completes
    pub deferred: Vec<ProtocolEvent>,
    pub login: Option<LoginInfo>,
}

impl Session {
    pub(crate) fn new(id: SessionId, lifetime: CancellationToken) -> Self {
        Self {
            id,
            lifetime,
            started_at: Instant::now(),
            handle: None,
            pending_login: None,
            deferred: Vec::new(),
            login: None,
        }
    }

    pub(crate) const fn is_logged_in(&self) -> bool {
        self.login.is_some()
    }

    /// Revoke every link and close the protocol session
    pub(crate) fn close(self, reason: &str) {
        self.lifetime.cancel();
        if let Some(handle) = self.handle {
            handle.close(reason);
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("opened", &self.handle.is_some())
            .field("logged_in", &self.is_logged_in())
            .finish_non_exhaustive()
    }
}
