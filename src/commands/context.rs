//! Invocation context handed to command handlers

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::Result;
use crate::random::SharedRng;
use crate::session::SessionLink;
use crate::types::PlayerName;

use super::registry::CommandRegistry;

/// One parsed command invocation
#[derive(Clone)]
pub struct CommandContext {
    /// Player who typed the command
    pub invoker: PlayerName,
    /// Command name as typed, lowercased
    pub command: String,
    /// Arguments after the command name
    pub args: Vec<String>,
    /// Link to the session the command arrived on
    pub link: SessionLink,
    /// Registry the command was resolved from
    pub registry: Arc<CommandRegistry>,
    /// Configured command prefix
    pub prefix: Arc<str>,
    /// Shared random source
    pub rng: SharedRng,
    /// When the current session logged in
    pub connected_at: Instant,
}

impl CommandContext {
    /// Send a chat reply through the session link
    ///
    /// # Errors
    /// Returns error if the session is gone or rejects the message
    pub fn reply(&self, text: impl AsRef<str>) -> Result<()> {
        self.link.send_chat(text.as_ref())
    }

    /// Time since the current session logged in
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.connected_at.elapsed()
    }

    /// Argument at `index`, if present
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("invoker", &self.invoker)
            .field("command", &self.command)
            .field("args", &self.args)
            .field("session", &self.link.id())
            .finish_non_exhaustive()
    }
}
