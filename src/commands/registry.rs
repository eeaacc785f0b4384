//! Command registry
//!
//! Commands are registered once at startup and never change afterwards.
//! Lookup is a case-insensitive exact match; listing keeps registration
//! order so help output is stable.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::{BotError, Result};

use super::context::CommandContext;

/// Boxed future returned by a command handler
pub type CommandFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// Async command handler
pub type CommandHandler = Arc<dyn Fn(CommandContext) -> CommandFuture + Send + Sync>;

/// Create a command handler from a closure
pub fn handler<F, Fut>(f: F) -> CommandHandler
where
    F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// An immutable command definition
#[derive(Clone)]
pub struct CommandSpec {
    /// Unique name, matched case-insensitively
    pub name: String,
    /// One-line description for help output
    pub description: String,
    /// Usage text without the command prefix, e.g. `follow [player]`
    pub usage: String,
    /// Handler invoked with the parsed invocation
    pub handler: CommandHandler,
}

impl CommandSpec {
    /// Create a command definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        usage: impl Into<String>,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            usage: usage.into(),
            handler,
        }
    }
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

/// Name-indexed set of commands
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<CommandSpec>>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command
    ///
    /// # Errors
    /// Returns [`BotError::DuplicateCommand`] if a command with the same
    /// name, ignoring case, is already registered
    pub fn register(&mut self, spec: CommandSpec) -> Result<()> {
        let key = spec.name.to_lowercase();
        if self.index.contains_key(&key) {
            return Err(BotError::DuplicateCommand(spec.name));
        }
        self.index.insert(key, self.commands.len());
        self.commands.push(Arc::new(spec));
        Ok(())
    }

    /// Find a command by name, ignoring case
    ///
    /// # Errors
    /// Returns [`BotError::CommandNotFound`] if nothing matches
    pub fn lookup(&self, name: &str) -> Result<Arc<CommandSpec>> {
        self.index
            .get(&name.to_lowercase())
            .and_then(|&i| self.commands.get(i))
            .cloned()
            .ok_or_else(|| BotError::CommandNotFound(name.to_string()))
    }

    /// All commands in registration order
    #[must_use]
    pub fn list(&self) -> &[Arc<CommandSpec>] {
        &self.commands
    }

    /// Number of registered commands
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no commands are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
