//! Session manager
//!
//! Split by concern:
//! - `core`: struct, configuration, run loop and observers
//! - `connect`: opening attempts and completing login
//! - `events`: routing of queued events by state
//! - `reconnect`: teardown, retry budget and backoff timers
//! - `shutdown`: explicit shutdown
//! - `chatter`: chat-side behaviour (mentions, welcomes, join message)

mod chatter;
mod connect;
mod core;
mod events;
mod reconnect;
mod shutdown;

pub use chatter::ChatterConfig;
pub use self::core::{ManagerConfig, RunOutcome, SessionManager, ShutdownHandle};
