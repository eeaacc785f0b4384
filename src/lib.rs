//! # tether
//!
//! A persistent game-server chat client. It keeps one session alive against
//! a server, reconnects with a bounded linear backoff when the session drops,
//! keeps the bot from being kicked for idling, and answers chat commands.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tether::commands::builtin_registry;
//! use tether::protocol::BridgeClient;
//! use tether::{BotConfig, SessionManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BotConfig::default();
//!     let registry = Arc::new(builtin_registry()?);
//!     let client = BridgeClient::new(config.bridge_addr.clone());
//!
//!     let manager = SessionManager::new(client, config.manager_config(), registry);
//!     let shutdown = manager.shutdown_handle();
//!     tokio::spawn(async move {
//!         let _ = tokio::signal::ctrl_c().await;
//!         shutdown.shutdown();
//!     });
//!
//!     let outcome = manager.run().await;
//!     std::process::exit(i32::from(outcome.exit_status()));
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`session`] - the [`SessionManager`] state machine. It owns the only
//!   live session and consumes every asynchronous input from one queue.
//! - [`scheduler`] - anti-idle and health report tasks, running only while
//!   connected
//! - [`commands`] - registry, quote-aware tokenizer, dispatcher and the
//!   built-in command set
//! - [`protocol`] - the capability the manager drives ([`ProtocolClient`],
//!   [`ProtocolSession`]) and a JSON-lines bridge implementation
//! - [`config`] - layered configuration (defaults, TOML, flags/env)
//! - [`testing`] - scripted protocol doubles for tests
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`], an alias for
//! `std::result::Result<T, BotError>`. Only session terminations and
//! transient connectivity faults change the manager's state; command and
//! scheduler failures are absorbed where they happen.

pub mod commands;
pub mod config;
pub mod error;
pub mod protocol;
pub mod random;
pub mod scheduler;
pub mod session;
pub mod testing;
pub mod types;
pub mod utils;

pub use config::{BotConfig, Cli};
pub use error::{BotError, Result};
pub use protocol::{AuthMode, BridgeClient, ConnectParams, ProtocolClient, ProtocolSession};
pub use session::{
    EventSink, ManagerConfig, RetryPolicy, RunOutcome, SessionLink, SessionManager,
    SessionState, SessionStatus, ShutdownHandle,
};
pub use types::{
    FaultKind, MinorAction, NavigationGoal, PlayerInfo, PlayerName, Position, ProtocolEvent,
    ProtocolFault, SessionId, Vitals, WorldTime,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
