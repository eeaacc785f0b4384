//! Error types for the tether client

use thiserror::Error;

use crate::types::events::ProtocolFault;
use crate::types::identifiers::SessionId;

/// Main error type for the tether client
#[derive(Error, Debug)]
pub enum BotError {
    /// A connect attempt was rejected by the protocol layer
    #[error("Connect failed: {0}")]
    Connect(ProtocolFault),

    /// Transport layer error (bridge socket, writer task)
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error on the bridge wire
    #[error("JSON decode error: {0}")]
    JsonDecode(#[from] serde_json::Error),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A command with the same (case-folded) name is already registered
    #[error("Command already registered: {0}")]
    DuplicateCommand(String),

    /// No command registered under this name
    #[error("Unknown command: {0}")]
    CommandNotFound(String),

    /// A command handler reported a failure
    #[error("Command '{command}' failed: {message}")]
    CommandFailed {
        /// Command name
        command: String,
        /// Failure description
        message: String,
    },

    /// The session behind a capability handle has been superseded or closed
    #[error("Session {0} is no longer active")]
    SessionRevoked(SessionId),

    /// The protocol layer has no navigation support
    #[error("Pathfinding not available")]
    NavigationUnavailable,

    /// The named player is not online
    #[error("Player {0} not found")]
    PlayerNotFound(String),
}

/// Result type alias for tether operations
pub type Result<T> = std::result::Result<T, BotError>;

impl BotError {
    /// Create a connect error from a protocol fault
    #[must_use]
    pub fn connect(fault: ProtocolFault) -> Self {
        Self::Connect(fault)
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a command failure error
    pub fn command_failed(command: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            message: msg.into(),
        }
    }

    /// Create a player not found error
    pub fn player_not_found(name: impl Into<String>) -> Self {
        Self::PlayerNotFound(name.into())
    }

    /// Whether this error represents a connectivity failure worth retrying
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connect(fault) => fault.is_transient(),
            Self::Timeout(_) => true,
            _ => false,
        }
    }
}
