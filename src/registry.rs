//! Session registry
//!
//! Single-owner mapping from connection handle to session, with a nickname
//! index for uniqueness checks and a room index for fan-out. Only the
//! `ChatServer` actor holds one, so no locking is involved.

use std::collections::HashMap;

use tracing::debug;

use crate::error::CommandError;
use crate::room::Room;
use crate::session::Session;
use crate::types::ClientId;

/// Live sessions and derived indexes
#[derive(Debug, Default)]
pub struct Registry {
    /// All connected sessions: ClientId -> Session
    sessions: HashMap<ClientId, Session>,
    /// Nickname -> owning session
    nicknames: HashMap<String, ClientId>,
    /// Occupied rooms: name -> Room
    rooms: HashMap<String, Room>,
    /// Recipients whose delivery failed, awaiting teardown
    pub(crate) failed: Vec<ClientId>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly accepted session
    pub fn insert(&mut self, session: Session) {
        self.sessions.insert(session.id, session);
    }

    /// Remove a session and drop it from every index
    pub fn remove(&mut self, client_id: ClientId) -> Option<Session> {
        self.leave(client_id);
        let session = self.sessions.remove(&client_id)?;
        if let Some(nick) = session.nickname() {
            self.nicknames.remove(nick);
        }
        Some(session)
    }

    /// Check whether a connection is still registered
    pub fn contains(&self, client_id: ClientId) -> bool {
        self.sessions.contains_key(&client_id)
    }

    /// Look up a session
    pub fn get(&self, client_id: ClientId) -> Option<&Session> {
        self.sessions.get(&client_id)
    }

    /// Look up a session for input framing
    pub fn get_mut(&mut self, client_id: ClientId) -> Option<&mut Session> {
        self.sessions.get_mut(&client_id)
    }

    /// Find the session holding a nickname
    pub fn find_by_nickname(&self, nick: &str) -> Option<ClientId> {
        self.nicknames.get(nick).copied()
    }

    /// Assign a nickname, moving `Init` sessions to `Outside`
    ///
    /// Returns the previous nickname. Fails if another session holds `nick`.
    pub fn set_nickname(
        &mut self,
        client_id: ClientId,
        nick: &str,
    ) -> Result<Option<String>, CommandError> {
        if let Some(owner) = self.find_by_nickname(nick) {
            if owner != client_id {
                return Err(CommandError::NicknameInUse(nick.to_string()));
            }
        }
        let Some(session) = self.sessions.get_mut(&client_id) else {
            return Ok(None);
        };

        let previous = session.set_nickname(nick.to_string());
        if let Some(old) = &previous {
            self.nicknames.remove(old);
        }
        self.nicknames.insert(nick.to_string(), client_id);
        Ok(previous)
    }

    /// Move a session into `room`, leaving its current room if any
    ///
    /// Returns the room it was in before.
    pub fn join(&mut self, client_id: ClientId, room: &str) -> Option<String> {
        let previous = self.leave(client_id);
        let session = self.sessions.get_mut(&client_id)?;
        session.enter_room(room.to_string());

        match self.rooms.get_mut(room) {
            Some(existing) => {
                existing.add_member(client_id);
                debug!("Room {} now has {} members", room, existing.member_count());
            }
            None => {
                debug!("Room {} created", room);
                self.rooms.insert(room.to_string(), Room::new(client_id));
            }
        }
        previous
    }

    /// Take a session out of its room
    ///
    /// Returns the room it left, or None if it was not inside one.
    pub fn leave(&mut self, client_id: ClientId) -> Option<String> {
        let room = self.sessions.get_mut(&client_id)?.exit_room()?;
        if let Some(entry) = self.rooms.get_mut(&room) {
            if entry.remove_member(client_id) {
                self.rooms.remove(&room);
                debug!("Room {} deleted (empty)", room);
            }
        }
        Some(room)
    }

    /// Members of a room at this moment
    pub fn room_members(&self, room: &str) -> Vec<ClientId> {
        self.rooms
            .get(room)
            .map(|r| r.members().collect())
            .unwrap_or_default()
    }

    /// Number of registered sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when no session is registered
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Number of occupied rooms
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Drain recipients whose delivery failed since the last call
    pub fn take_failed(&mut self) -> Vec<ClientId> {
        std::mem::take(&mut self.failed)
    }

    #[cfg(test)]
    fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }
}
