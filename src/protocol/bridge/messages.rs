//! Wire messages exchanged with the protocol bridge
//!
//! One JSON object per line. Requests to the bridge are tagged by `type`,
//! notifications from the bridge are tagged by `event`.

use serde::{Deserialize, Serialize};

use crate::protocol::{AuthMode, ConnectParams};
use crate::types::{MinorAction, NavigationGoal, Position};

/// Requests written to the bridge
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum Outbound {
    /// Start a game session
    Open {
        host: String,
        port: u16,
        username: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        password: Option<String>,
        auth: AuthMode,
        #[serde(skip_serializing_if = "Option::is_none")]
        version: Option<String>,
    },
    /// Send a chat line
    Chat { message: String },
    /// Perform an anti-idle action
    Action { action: MinorAction },
    /// Set (or clear, with `null`) the navigation goal
    Goal { goal: Option<NavigationGoal> },
    /// Respawn after death
    Respawn,
    /// Leave the server and close the bridge session
    Quit { reason: String },
}

impl Outbound {
    /// Build the open request for a connect attempt
    pub(crate) fn open(params: &ConnectParams) -> Self {
        Self::Open {
            host: params.host.clone(),
            port: params.port,
            username: params.username.clone(),
            password: params.password.clone(),
            auth: params.auth,
            version: params.version.clone(),
        }
    }
}

/// Notifications read from the bridge
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub(crate) enum Inbound {
    /// Features the bridge offers for this session
    Capabilities {
        #[serde(default)]
        navigation: bool,
    },
    Login {
        username: String,
    },
    Spawn {
        #[serde(default)]
        position: Option<Position>,
    },
    End {
        #[serde(default)]
        reason: Option<String>,
    },
    Kicked {
        reason: String,
        #[serde(default)]
        logged_in: bool,
    },
    Error {
        code: String,
        #[serde(default)]
        message: String,
    },
    Chat {
        username: String,
        message: String,
    },
    Health {
        health: f32,
        food: u32,
    },
    #[serde(rename = "position")]
    Moved {
        x: f64,
        y: f64,
        z: f64,
    },
    Time {
        day: u64,
        time_of_day: u64,
    },
    PlayerJoined {
        username: String,
        #[serde(default)]
        position: Option<Position>,
    },
    PlayerLeft {
        username: String,
    },
    /// Another player's entity moved, or went out of view (`null`)
    PlayerMoved {
        username: String,
        #[serde(default)]
        position: Option<Position>,
    },
    Death,
}
