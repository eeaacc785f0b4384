//! Chat-side behaviour of a connected session
//!
//! Delayed messages are sent through the session's [`SessionLink`]; if the
//! session is torn down before the delay elapses they are dropped.

use std::time::Duration;

use crate::protocol::ProtocolClient;
use crate::types::PlayerName;

use super::super::link::SessionLink;
use super::super::state::SessionState;
use super::core::SessionManager;

/// Delay before the join message
pub const JOIN_MESSAGE_DELAY: Duration = Duration::from_secs(3);

/// Delay before welcoming a joining player
pub const WELCOME_DELAY: Duration = Duration::from_secs(2);

/// Delay before answering a mention
pub const MENTION_REPLY_DELAY: Duration = Duration::from_secs(1);

/// Default join message
pub const DEFAULT_JOIN_MESSAGE: &str = "Bot connected! Type !help for commands.";

/// Join message and welcome behaviour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatterConfig {
    /// Sent after spawning; `None` or empty disables it
    pub join_message: Option<String>,
    /// Greet players as they join
    pub welcome_messages: bool,
}

impl Default for ChatterConfig {
    fn default() -> Self {
        Self {
            join_message: Some(DEFAULT_JOIN_MESSAGE.to_string()),
            welcome_messages: true,
        }
    }
}

fn mention_replies(username: &str) -> [String; 4] {
    [
        format!("Hello {username}! How can I help you?"),
        format!("Hi there {username}! 👋"),
        format!("{username}, I'm here and active!"),
        format!("What's up, {username}?"),
    ]
}

/// Send `text` through `link` after `delay`, unless the link is revoked first
fn say_later(link: SessionLink, delay: Duration, text: String) {
    tokio::spawn(async move {
        tokio::select! {
            biased;
            () = link.revoked() => {
                log::debug!("Dropped delayed message for session {}", link.id());
            }
            () = tokio::time::sleep(delay) => {
                if let Err(e) = link.send_chat(&text) {
                    log::warn!("Failed to send delayed message: {e}");
                }
            }
        }
    });
}

impl<C: ProtocolClient> SessionManager<C> {
    fn connected_link(&self) -> Option<(&SessionLink, &str)> {
        if self.state != SessionState::Connected {
            return None;
        }
        let login = self.session.as_ref()?.login.as_ref()?;
        Some((&login.link, login.username.as_str()))
    }

    /// Chat from another player: activity, commands, mentions
    pub(super) fn on_chat(&self, sender: &str, text: &str) {
        let Some((link, own_name)) = self.connected_link() else {
            return;
        };
        if sender == own_name {
            return;
        }

        log::info!("<{sender}> {text}");
        self.scheduler.activity().touch();

        let invoker = PlayerName::new(sender);
        self.dispatcher.dispatch(&invoker, text);

        if text.to_lowercase().contains(&own_name.to_lowercase())
            && let Some(reply) = self.rng.choose(&mention_replies(sender))
        {
            say_later(link.clone(), MENTION_REPLY_DELAY, reply.clone());
        }
    }

    pub(super) fn on_spawned(&self) {
        log::info!("Bot spawned in world");
        let Some((link, _)) = self.connected_link() else {
            return;
        };
        if let Some(message) = self
            .chatter
            .join_message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
        {
            say_later(link.clone(), JOIN_MESSAGE_DELAY, message.to_string());
        }
    }

    pub(super) fn on_player_joined(&self, player: &PlayerName) {
        if !self.chatter.welcome_messages {
            return;
        }
        let Some((link, own_name)) = self.connected_link() else {
            return;
        };
        if player.matches(own_name) {
            return;
        }
        say_later(link.clone(), WELCOME_DELAY, format!("Welcome {player}! 👋"));
    }

    pub(super) fn on_died(&self) {
        log::warn!("Bot died! Respawning...");
        let Some((link, _)) = self.connected_link() else {
            return;
        };
        if let Err(e) = link.respawn() {
            log::error!("Respawn failed: {e}");
        }
    }
}
