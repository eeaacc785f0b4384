//! Chat command dispatcher
//!
//! Turns chat lines into command invocations. Every reply goes out through
//! the session's chat capability. Handlers run on their own task, so a slow
//! handler never blocks the session manager and a failing or panicking one
//! is reported in chat instead of taking the session down.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::{BotError, Result};
use crate::random::SharedRng;
use crate::session::SessionLink;
use crate::types::PlayerName;

use super::context::CommandContext;
use super::registry::CommandRegistry;
use super::tokenizer::tokenize;

/// Result of feeding one chat line to the dispatcher
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Not a command, a bare prefix, or no session bound
    Ignored,
    /// The name did not resolve; the unknown-command reply was sent
    UnknownCommand(String),
    /// The handler was started
    Invoked {
        /// Resolved command name
        command: String,
        /// Handler task; resolves to whether the handler succeeded
        task: JoinHandle<bool>,
    },
}

impl DispatchOutcome {
    /// Wait for an invoked handler to finish
    ///
    /// Returns `None` when no handler was started.
    pub async fn finished(self) -> Option<bool> {
        match self {
            Self::Invoked { task, .. } => Some(task.await.unwrap_or(false)),
            _ => None,
        }
    }
}

struct Binding {
    link: SessionLink,
    connected_at: Instant,
}

/// Resolves chat lines against a [`CommandRegistry`]
pub struct CommandDispatcher {
    registry: Arc<CommandRegistry>,
    prefix: Arc<str>,
    rng: SharedRng,
    binding: Option<Binding>,
}

impl CommandDispatcher {
    /// Create an unbound dispatcher
    pub fn new(registry: Arc<CommandRegistry>, prefix: impl Into<Arc<str>>, rng: SharedRng) -> Self {
        Self {
            registry,
            prefix: prefix.into(),
            rng,
            binding: None,
        }
    }

    /// Command prefix
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Registry commands are resolved from
    #[must_use]
    pub const fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Route commands to `link` from now on
    pub fn bind(&mut self, link: SessionLink, connected_at: Instant) {
        log::debug!("Dispatcher bound to session {}", link.id());
        self.binding = Some(Binding { link, connected_at });
    }

    /// Stop routing commands. Idempotent.
    pub fn unbind(&mut self) {
        if let Some(binding) = self.binding.take() {
            log::debug!("Dispatcher unbound from session {}", binding.link.id());
        }
    }

    /// Whether a session is bound
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Handle one chat line from `sender`
    pub fn dispatch(&self, sender: &PlayerName, line: &str) -> DispatchOutcome {
        let Some(rest) = line.strip_prefix(&*self.prefix) else {
            return DispatchOutcome::Ignored;
        };
        let mut tokens = tokenize(rest).into_iter();
        let Some(name) = tokens.next() else {
            return DispatchOutcome::Ignored;
        };
        let Some(binding) = &self.binding else {
            log::debug!("Ignoring command {name} from {sender}: no session bound");
            return DispatchOutcome::Ignored;
        };
        let name = name.to_lowercase();

        let spec = match self.registry.lookup(&name) {
            Ok(spec) => spec,
            Err(_) => {
                log::debug!("Unknown command {name} from {sender}");
                let reply = format!(
                    "Unknown command: {name}. Type {}help for available commands.",
                    self.prefix
                );
                if let Err(e) = binding.link.send_chat(&reply) {
                    log::warn!("Failed to send unknown-command reply: {e}");
                }
                return DispatchOutcome::UnknownCommand(name);
            }
        };

        log::info!("Command executed by {sender}: {line}");
        let ctx = CommandContext {
            invoker: sender.clone(),
            command: name.clone(),
            args: tokens.collect(),
            link: binding.link.clone(),
            registry: Arc::clone(&self.registry),
            prefix: Arc::clone(&self.prefix),
            rng: self.rng.clone(),
            connected_at: binding.connected_at,
        };
        let link = binding.link.clone();
        let command = spec.name.clone();

        let task = tokio::spawn(async move {
            let command = &spec.name;
            // Panics while building the future count the same as panics inside it
            let result: Result<()> =
                match std::panic::catch_unwind(AssertUnwindSafe(|| (spec.handler)(ctx))) {
                    Ok(fut) => match AssertUnwindSafe(fut).catch_unwind().await {
                        Ok(result) => result,
                        Err(_) => Err(BotError::command_failed(command, "handler panicked")),
                    },
                    Err(_) => Err(BotError::command_failed(command, "handler panicked")),
                };
            match result {
                Ok(()) => true,
                Err(e) => {
                    log::error!("Error executing command {command}: {e}");
                    if !matches!(e, BotError::SessionRevoked(_))
                        && let Err(send_err) =
                            link.send_chat(&format!("Error executing command: {command}"))
                    {
                        log::warn!("Failed to report command error: {send_err}");
                    }
                    false
                }
            }
        });

        DispatchOutcome::Invoked { command, task }
    }
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("prefix", &self.prefix)
            .field("commands", &self.registry.len())
            .field("bound", &self.binding.as_ref().map(|b| b.link.id()))
            .finish()
    }
}
