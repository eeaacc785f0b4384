//! Newtype wrappers for type safety
//!
//! Identifiers that would otherwise be bare strings or UUIDs get their own
//! types so a session id can never be confused with a player name.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Newtype Wrappers for Type Safety
// ============================================================================

/// Identity of one connect attempt
///
/// A fresh id is minted for every attempt; events tagged with an id other
/// than the current one are from a superseded session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Mint a new random session id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The short form is enough to tell attempts apart in logs
        let full = self.0.simple().to_string();
        f.write_str(&full[..8])
    }
}

/// Player name newtype
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerName(String);

impl PlayerName {
    /// Create a new player name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the player name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison, as the server treats names
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl std::fmt::Display for PlayerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PlayerName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PlayerName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
