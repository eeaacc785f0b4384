//! Protocol event and world-state types
//!
//! Everything the protocol capability reports back to the session manager,
//! plus the small value types its queries return.

use serde::{Deserialize, Serialize};

use super::identifiers::PlayerName;

// ============================================================================
// Faults
// ============================================================================

/// Classification of a protocol-level failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// The server refused the TCP connection
    ConnectionRefused,
    /// The server host name did not resolve
    HostNotFound,
    /// Anything else, with the protocol's own error code
    Other(String),
}

impl FaultKind {
    /// Map a socket-style error code onto a fault kind
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "ECONNREFUSED" => Self::ConnectionRefused,
            "ENOTFOUND" | "EAI_AGAIN" => Self::HostNotFound,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A protocol error with its classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolFault {
    /// What kind of failure this is
    pub kind: FaultKind,
    /// Human-readable detail
    pub message: String,
}

impl ProtocolFault {
    /// Create a new fault
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Connection refused fault
    pub fn refused(message: impl Into<String>) -> Self {
        Self::new(FaultKind::ConnectionRefused, message)
    }

    /// Unresolvable host fault
    pub fn host_not_found(message: impl Into<String>) -> Self {
        Self::new(FaultKind::HostNotFound, message)
    }

    /// Classify an I/O error raised while connecting
    #[must_use]
    pub fn from_io(err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::ConnectionRefused => Self::refused(err.to_string()),
            std::io::ErrorKind::NotFound => Self::host_not_found(err.to_string()),
            kind => Self::new(FaultKind::Other(format!("{kind:?}")), err.to_string()),
        }
    }

    /// Transient faults are connectivity failures presumed recoverable by retrying
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            FaultKind::ConnectionRefused | FaultKind::HostNotFound
        )
    }
}

impl std::fmt::Display for ProtocolFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            FaultKind::ConnectionRefused => write!(f, "connection refused: {}", self.message),
            FaultKind::HostNotFound => write!(f, "host not found: {}", self.message),
            FaultKind::Other(code) => write!(f, "{code}: {}", self.message),
        }
    }
}

// ============================================================================
// World state
// ============================================================================

/// Block position in the world
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// East/west
    pub x: f64,
    /// Height
    pub y: f64,
    /// North/south
    pub z: f64,
}

impl Position {
    /// Create a new position
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Health, hunger and location of the bot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// Health points, 0-20
    pub health: f32,
    /// Food points, 0-20
    pub food: u32,
    /// Current position
    pub position: Position,
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            health: 20.0,
            food: 20,
            position: Position::default(),
        }
    }
}

/// Health at or below which a warning is logged
pub const LOW_HEALTH_THRESHOLD: f32 = 10.0;

impl Vitals {
    /// Whether health is low enough to warrant a warning
    #[must_use]
    pub fn is_low_health(&self) -> bool {
        self.health <= LOW_HEALTH_THRESHOLD
    }
}

/// In-game clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorldTime {
    /// Days elapsed in the world
    pub day: u64,
    /// Ticks into the current day, 0-23999
    pub time_of_day: u64,
}

/// An online player as seen by the protocol layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    /// Player name
    pub name: PlayerName,
    /// Entity position, if the player is within view distance
    pub position: Option<Position>,
}

// ============================================================================
// Actions
// ============================================================================

/// Low-impact action performed only to avoid idle disconnection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinorAction {
    /// Swing the main arm
    SwingArm,
    /// Nudge the view angle slightly
    LookAround,
    /// A single short jump
    Jump,
}

impl MinorAction {
    /// The fixed set the anti-idle task picks from
    pub const ALL: [Self; 3] = [Self::SwingArm, Self::LookAround, Self::Jump];

    /// Wire name of the action
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SwingArm => "swing_arm",
            Self::LookAround => "look_around",
            Self::Jump => "jump",
        }
    }
}

impl std::fmt::Display for MinorAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination handed to the navigation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NavigationGoal {
    /// Keep within `range` blocks of a moving player
    Follow {
        /// Player to follow
        player: PlayerName,
        /// Distance to keep
        range: u32,
    },
    /// Walk to within `range` blocks of a fixed point
    Near {
        /// Target point
        position: Position,
        /// Acceptable distance
        range: u32,
    },
}

// ============================================================================
// Events
// ============================================================================

/// Events emitted by a protocol session
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolEvent {
    /// Handshake completed; the bot is logged in
    LoginSuccess {
        /// Name the server assigned to the bot
        username: String,
    },
    /// The bot entity spawned in the world
    Spawned,
    /// The session ended (socket closed, server stop, ...)
    SessionEnded {
        /// Reason reported by the protocol layer
        reason: String,
    },
    /// The server kicked the bot
    Kicked {
        /// Kick message
        reason: String,
        /// Whether the bot had completed login before the kick
        logged_in: bool,
    },
    /// A protocol or network error
    Error(ProtocolFault),
    /// A chat line from a player
    ChatReceived {
        /// Sender name
        sender: String,
        /// Raw chat text
        text: String,
    },
    /// Health, food or position changed
    VitalsChanged(Vitals),
    /// A player joined the server
    PlayerJoined {
        /// Player name
        username: PlayerName,
    },
    /// A player left the server
    PlayerLeft {
        /// Player name
        username: PlayerName,
    },
    /// The bot died
    Died,
}

impl ProtocolEvent {
    /// Short name for log lines
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LoginSuccess { .. } => "login",
            Self::Spawned => "spawn",
            Self::SessionEnded { .. } => "end",
            Self::Kicked { .. } => "kicked",
            Self::Error(_) => "error",
            Self::ChatReceived { .. } => "chat",
            Self::VitalsChanged(_) => "vitals",
            Self::PlayerJoined { .. } => "player_joined",
            Self::PlayerLeft { .. } => "player_left",
            Self::Died => "death",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_codes_classify_as_transient() {
        assert!(ProtocolFault::new(FaultKind::from_code("ECONNREFUSED"), "x").is_transient());
        assert!(ProtocolFault::new(FaultKind::from_code("ENOTFOUND"), "x").is_transient());
        assert!(!ProtocolFault::new(FaultKind::from_code("EPIPE"), "x").is_transient());
    }

    #[test]
    fn io_refused_is_transient() {
        let err = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
        assert!(ProtocolFault::from_io(&err).is_transient());

        let err = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(!ProtocolFault::from_io(&err).is_transient());
    }

    #[test]
    fn low_health_boundary() {
        let mut vitals = Vitals::default();
        assert!(!vitals.is_low_health());
        vitals.health = 10.0;
        assert!(vitals.is_low_health());
    }
}
