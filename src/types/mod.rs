//! Type definitions shared across the client
//!
//! - [`identifiers`] - Type-safe ID wrappers (`SessionId`, `PlayerName`)
//! - [`events`] - Protocol events, faults, world state and action types

pub mod events;
pub mod identifiers;

// Re-export commonly used types
pub use events::{
    FaultKind, MinorAction, NavigationGoal, PlayerInfo, Position, ProtocolEvent, ProtocolFault,
    Vitals, WorldTime,
};
pub use identifiers::{PlayerName, SessionId};
