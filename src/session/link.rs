//! Revocable capability handle onto the active protocol session
//!
//! The dispatcher, the idle scheduler and delayed chat tasks never hold the
//! protocol session directly. They get a [`SessionLink`] issued for one
//! session; once that session is torn down or superseded the link is revoked
//! and every call through it fails with [`BotError::SessionRevoked`].

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::{BotError, Result};
use crate::protocol::ProtocolSession;
use crate::types::{MinorAction, NavigationGoal, PlayerInfo, SessionId, Vitals, WorldTime};
use crate::utils::sanitize_chat_message;

/// Capability handle for one session
#[derive(Clone)]
pub struct SessionLink {
    id: SessionId,
    session: Arc<dyn ProtocolSession>,
    revoked: CancellationToken,
}

impl SessionLink {
    /// Issue a link for `session`, revoked when `lifetime` is cancelled
    pub fn new(id: SessionId, session: Arc<dyn ProtocolSession>, lifetime: CancellationToken) -> Self {
        Self {
            id,
            session,
            revoked: lifetime,
        }
    }

    /// Session this link was issued for
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Whether the session behind this link is gone
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.revoked.is_cancelled()
    }

    /// Resolves once the link is revoked
    pub async fn revoked(&self) {
        self.revoked.cancelled().await;
    }

    fn live(&self) -> Result<&dyn ProtocolSession> {
        if self.is_revoked() {
            Err(BotError::SessionRevoked(self.id))
        } else {
            Ok(self.session.as_ref())
        }
    }

    /// Name the bot is logged in as
    ///
    /// # Errors
    /// Returns [`BotError::SessionRevoked`] if the session is gone
    pub fn username(&self) -> Result<String> {
        Ok(self.live()?.username())
    }

    /// Send a sanitised chat line
    ///
    /// # Errors
    /// Returns [`BotError::SessionRevoked`] if the session is gone, or the
    /// protocol layer's error
    pub fn send_chat(&self, text: &str) -> Result<()> {
        let session = self.live()?;
        let text = sanitize_chat_message(text);
        if text.is_empty() {
            return Ok(());
        }
        session.send_chat(&text)
    }

    /// Perform one anti-idle action
    ///
    /// # Errors
    /// Returns [`BotError::SessionRevoked`] if the session is gone, or the
    /// protocol layer's error
    pub fn perform_minor_action(&self, action: MinorAction) -> Result<()> {
        self.live()?.perform_minor_action(action)
    }

    /// Current vitals
    ///
    /// # Errors
    /// Returns [`BotError::SessionRevoked`] if the session is gone, or the
    /// protocol layer's error
    pub fn vitals(&self) -> Result<Vitals> {
        self.live()?.vitals()
    }

    /// Current in-game time
    ///
    /// # Errors
    /// Returns [`BotError::SessionRevoked`] if the session is gone, or the
    /// protocol layer's error
    pub fn world_time(&self) -> Result<WorldTime> {
        self.live()?.world_time()
    }

    /// Players currently online
    ///
    /// # Errors
    /// Returns [`BotError::SessionRevoked`] if the session is gone, or the
    /// protocol layer's error
    pub fn online_players(&self) -> Result<Vec<PlayerInfo>> {
        self.live()?.online_players()
    }

    /// Look up one online player by name, ignoring case
    ///
    /// # Errors
    /// Returns [`BotError::PlayerNotFound`] if nobody by that name is online
    pub fn find_player(&self, name: &str) -> Result<PlayerInfo> {
        self.online_players()?
            .into_iter()
            .find(|player| player.name.matches(name))
            .ok_or_else(|| BotError::player_not_found(name))
    }

    /// Hand a goal to the navigation engine
    ///
    /// # Errors
    /// Returns [`BotError::SessionRevoked`] if the session is gone, or
    /// [`BotError::NavigationUnavailable`]
    pub fn move_to(&self, goal: NavigationGoal) -> Result<()> {
        self.live()?.move_to(goal)
    }

    /// Clear the navigation goal
    ///
    /// # Errors
    /// Returns [`BotError::SessionRevoked`] if the session is gone, or
    /// [`BotError::NavigationUnavailable`]
    pub fn stop_moving(&self) -> Result<()> {
        self.live()?.stop_moving()
    }

    /// Request a respawn
    ///
    /// # Errors
    /// Returns [`BotError::SessionRevoked`] if the session is gone, or the
    /// protocol layer's error
    pub fn respawn(&self) -> Result<()> {
        self.live()?.respawn()
    }
}

impl std::fmt::Debug for SessionLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLink")
            .field("id", &self.id)
            .field("revoked", &self.is_revoked())
            .finish()
    }
}
