//! Connection states and the status snapshot published to observers

use serde::Serialize;

use crate::types::SessionId;

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No session; initial state, and terminal after shutdown or exhaustion
    #[default]
    Disconnected,
    /// A connect attempt is in flight or a reconnect delay is pending
    Connecting,
    /// Logged in; scheduler running and commands dispatched
    Connected,
    /// Shutdown in progress
    Disconnecting,
}

impl SessionState {
    /// Active states are the ones that own a live or pending session
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
        })
    }
}

/// Snapshot of the manager, published on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStatus {
    /// Current state
    pub state: SessionState,
    /// Reconnect attempts made in the current failure chain
    pub attempt_count: u32,
    /// Session currently owned by the manager, if any
    pub session: Option<SessionId>,
}
