//! Basic type definitions for the chat server
//!
//! Provides:
//! - `ClientId`: UUID-based connection handle
//! - `Phase`: where a session sits in the nick/room state machine

use uuid::Uuid;

/// Unique connection handle (newtype pattern)
///
/// Wraps a UUID v4 for type-safe identification of a transport connection.
/// Implements Hash and Eq for use as HashMap keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Create a new random client ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session phase
///
/// `Init` → `Outside` on the first successful `/nick`,
/// `Outside` ↔ `Inside` through `/join` and `/leave`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Connected, no nickname yet
    #[default]
    Init,
    /// Has a nickname, not in a room
    Outside,
    /// Has a nickname, in exactly one room
    Inside,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::Outside => "outside",
            Phase::Inside => "inside",
        };
        f.write_str(name)
    }
}
