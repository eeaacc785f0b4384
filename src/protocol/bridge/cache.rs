//! Locally cached world state for a bridge session
//!
//! The bridge pushes state changes; queries on the session read this cache
//! so they never wait on the network.

use std::collections::BTreeMap;

use crate::types::{
    FaultKind, PlayerInfo, PlayerName, Position, ProtocolEvent, ProtocolFault, Vitals, WorldTime,
};

use super::messages::Inbound;

/// World state as last reported by the bridge
#[derive(Debug, Default)]
pub(crate) struct WorldCache {
    /// Name the server assigned at login
    pub username: Option<String>,
    /// `None` until the bot has spawned or received a health update
    pub vitals: Option<Vitals>,
    /// `None` until the first time update
    pub time: Option<WorldTime>,
    /// Online players keyed by lowercase name
    pub players: BTreeMap<String, PlayerInfo>,
    /// Whether the bridge has a navigation engine loaded
    pub navigation: bool,
    /// Set once the session reported its own end
    pub ended: bool,
}

impl WorldCache {
    /// Fold a bridge notification into the cache
    ///
    /// Returns the protocol event to forward to the session manager, if any.
    pub(crate) fn apply(&mut self, message: Inbound) -> Option<ProtocolEvent> {
        match message {
            Inbound::Capabilities { navigation } => {
                self.navigation = navigation;
                None
            }
            Inbound::Login { username } => {
                self.username = Some(username.clone());
                Some(ProtocolEvent::LoginSuccess { username })
            }
            Inbound::Spawn { position } => {
                let vitals = self.vitals.get_or_insert_with(Vitals::default);
                if let Some(position) = position {
                    vitals.position = position;
                }
                Some(ProtocolEvent::Spawned)
            }
            Inbound::End { reason } => {
                self.ended = true;
                Some(ProtocolEvent::SessionEnded {
                    reason: reason.unwrap_or_else(|| "session ended".to_string()),
                })
            }
            Inbound::Kicked { reason, logged_in } => {
                self.ended = true;
                Some(ProtocolEvent::Kicked { reason, logged_in })
            }
            Inbound::Error { code, message } => Some(ProtocolEvent::Error(ProtocolFault::new(
                FaultKind::from_code(&code),
                message,
            ))),
            Inbound::Chat { username, message } => Some(ProtocolEvent::ChatReceived {
                sender: username,
                text: message,
            }),
            Inbound::Health { health, food } => {
                let vitals = self.vitals.get_or_insert_with(Vitals::default);
                vitals.health = health;
                vitals.food = food;
                Some(ProtocolEvent::VitalsChanged(*vitals))
            }
            Inbound::Moved { x, y, z } => {
                let vitals = self.vitals.get_or_insert_with(Vitals::default);
                vitals.position = Position::new(x, y, z);
                None
            }
            Inbound::Time { day, time_of_day } => {
                self.time = Some(WorldTime { day, time_of_day });
                None
            }
            Inbound::PlayerJoined { username, position } => {
                let name = PlayerName::new(username);
                self.players.insert(
                    name.as_str().to_ascii_lowercase(),
                    PlayerInfo {
                        name: name.clone(),
                        position,
                    },
                );
                Some(ProtocolEvent::PlayerJoined { username: name })
            }
            Inbound::PlayerLeft { username } => {
                let removed = self.players.remove(&username.to_ascii_lowercase());
                let name = removed.map_or_else(|| PlayerName::new(username), |info| info.name);
                Some(ProtocolEvent::PlayerLeft { username: name })
            }
            Inbound::PlayerMoved { username, position } => {
                if let Some(info) = self.players.get_mut(&username.to_ascii_lowercase()) {
                    info.position = position;
                }
                None
            }
            Inbound::Death => Some(ProtocolEvent::Died),
        }
    }
}
