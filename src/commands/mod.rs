//! Chat commands
//!
//! - `registry` - [`CommandRegistry`] and [`CommandSpec`]
//! - `dispatcher` - [`CommandDispatcher`], chat line to handler invocation
//! - `tokenizer` - quote-aware argument splitting
//! - `context` - [`CommandContext`] handed to handlers
//! - `builtin` - the stock command set

pub mod builtin;
mod context;
mod dispatcher;
mod registry;
mod tokenizer;

pub use builtin::{builtin_registry, register_builtin_commands};
pub use context::CommandContext;
pub use dispatcher::{CommandDispatcher, DispatchOutcome};
pub use registry::{CommandFuture, CommandHandler, CommandRegistry, CommandSpec, handler};
pub use tokenizer::tokenize;
