//! Room broadcaster
//!
//! Fan-out of protocol lines to room members and single recipients.
//! A failed delivery never stops delivery to others; the recipient is
//! queued on the registry for teardown once the current command is done.

use tracing::{debug, warn};

use crate::message::ServerMessage;
use crate::registry::Registry;
use crate::types::ClientId;

impl Registry {
    /// Deliver `msg` to every session currently inside `room`
    pub fn broadcast(&mut self, room: &str, msg: &ServerMessage) {
        let members = self.room_members(room);
        debug!("Broadcast to {} ({} members): {}", room, members.len(), msg);
        for client_id in members {
            self.deliver(client_id, msg.clone());
        }
    }

    /// Deliver `msg` to one session
    ///
    /// Returns false when the session is gone or its queue rejected the message.
    pub fn deliver(&mut self, client_id: ClientId, msg: ServerMessage) -> bool {
        let Some(session) = self.get(client_id) else {
            return false;
        };
        match session.send(msg) {
            Ok(()) => true,
            Err(e) => {
                warn!("Delivery to {} failed: {}", client_id, e);
                self.failed.push(client_id);
                false
            }
        }
    }
}
