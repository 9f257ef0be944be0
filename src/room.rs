//! Room struct definition
//!
//! A room is a named, dynamically-membered broadcast group. It exists
//! only while at least one session is inside it; the registry keys rooms
//! by name.

use std::collections::HashSet;

use crate::types::ClientId;

/// Room membership index entry
#[derive(Debug)]
pub struct Room {
    /// Sessions currently inside
    members: HashSet<ClientId>,
}

impl Room {
    /// Create a room whose only member is `first`
    pub fn new(first: ClientId) -> Self {
        Self {
            members: HashSet::from([first]),
        }
    }

    /// Add a member
    ///
    /// Returns false if the client was already inside.
    pub fn add_member(&mut self, client_id: ClientId) -> bool {
        self.members.insert(client_id)
    }

    /// Remove a member
    ///
    /// Returns true if the room should be deleted (no members left).
    pub fn remove_member(&mut self, client_id: ClientId) -> bool {
        self.members.remove(&client_id);
        self.members.is_empty()
    }

    /// Iterate over current members
    pub fn members(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.members.iter().copied()
    }

    /// Get the number of members in the room
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}
