//! Session lifecycle
//!
//! - `manager` - [`SessionManager`], the single owner of the connection
//!   state machine, retry policy and scheduler/dispatcher wiring
//! - `link` - [`SessionLink`], the revocable handle other components use
//! - `retry` - [`RetryPolicy`] with linear backoff
//! - `state` - [`SessionState`] and the published [`SessionStatus`]
//! - `events` - the manager's internal event queue and [`EventSink`]

pub(crate) mod events;
pub mod link;
mod manager;
mod record;
pub mod retry;
pub mod state;

pub use events::EventSink;
pub use link::SessionLink;
pub use manager::{ChatterConfig, ManagerConfig, RunOutcome, SessionManager, ShutdownHandle};
pub use retry::RetryPolicy;
pub use state::{SessionState, SessionStatus};
