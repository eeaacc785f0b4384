//! Protocol capability consumed by the session manager
//!
//! The game protocol (handshake, packets, world model) and the navigation
//! engine live outside this crate. They are reached only through the narrow
//! surface defined here:
//!
//! - [`ProtocolClient::open`] starts one session and returns a handle
//! - [`ProtocolSession`] exposes the outbound actions and cached queries
//! - [`EventSink`] carries lifecycle and chat events back to the manager
//!
//! [`bridge`] implements the capability over a JSON-lines TCP bridge.

pub mod bridge;

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{MinorAction, NavigationGoal, PlayerInfo, Vitals, WorldTime};

pub use crate::session::EventSink;
pub use bridge::BridgeClient;

/// Authentication mode used for login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// No account verification (cracked/offline-mode servers)
    #[default]
    Offline,
    /// Microsoft account authentication
    Microsoft,
    /// Legacy Mojang account authentication
    Mojang,
}

impl AuthMode {
    /// Wire name of the mode
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Microsoft => "microsoft",
            Self::Mojang => "mojang",
        }
    }
}

/// Everything needed to open one session
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectParams {
    /// Game server host
    pub host: String,
    /// Game server port
    pub port: u16,
    /// Bot identity (username)
    pub username: String,
    /// Account password, for premium authentication
    pub password: Option<String>,
    /// Authentication mode
    pub auth: AuthMode,
    /// Protocol version; `None` lets the protocol layer auto-detect
    pub version: Option<String>,
}

impl std::fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("auth", &self.auth)
            .field("version", &self.version)
            .finish()
    }
}

/// Factory for protocol sessions
///
/// One `open` call corresponds to one connect attempt. The returned future
/// resolves once the underlying connection exists; login completion is
/// reported later through the [`EventSink`].
pub trait ProtocolClient: Send + Sync + 'static {
    /// Open a new session
    ///
    /// # Errors
    /// Returns [`crate::BotError::Connect`] when the connection is rejected
    /// (classified so transient faults can be told apart), or a transport
    /// error for anything else.
    fn open(
        &self,
        params: ConnectParams,
        events: EventSink,
    ) -> impl Future<Output = Result<Arc<dyn ProtocolSession>>> + Send;
}

/// A live protocol session
///
/// All methods are synchronous and must not block: actions are queued for
/// the protocol layer, queries read locally cached world state.
pub trait ProtocolSession: Send + Sync {
    /// Name the bot is logged in as
    fn username(&self) -> String;

    /// Send a chat line
    ///
    /// # Errors
    /// Returns error if the session can no longer accept outbound traffic
    fn send_chat(&self, text: &str) -> Result<()>;

    /// Perform one anti-idle action
    ///
    /// # Errors
    /// Returns error if the action could not be issued
    fn perform_minor_action(&self, action: MinorAction) -> Result<()>;

    /// Current health, food and position
    ///
    /// # Errors
    /// Returns error if the bot has not spawned yet
    fn vitals(&self) -> Result<Vitals>;

    /// Current in-game time
    ///
    /// # Errors
    /// Returns error if no time update has been received
    fn world_time(&self) -> Result<WorldTime>;

    /// Players currently online
    ///
    /// # Errors
    /// Returns error if the player list is unavailable
    fn online_players(&self) -> Result<Vec<PlayerInfo>>;

    /// Hand a goal to the navigation engine
    ///
    /// # Errors
    /// Returns [`crate::BotError::NavigationUnavailable`] when there is no
    /// navigation support
    fn move_to(&self, goal: NavigationGoal) -> Result<()>;

    /// Clear the current navigation goal
    ///
    /// # Errors
    /// Returns [`crate::BotError::NavigationUnavailable`] when there is no
    /// navigation support
    fn stop_moving(&self) -> Result<()>;

    /// Request a respawn after death
    ///
    /// # Errors
    /// Returns error if the request could not be issued
    fn respawn(&self) -> Result<()>;

    /// Close the session. Must be idempotent.
    fn close(&self, reason: &str);
}
