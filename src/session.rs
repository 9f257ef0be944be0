//! Session struct definition
//!
//! Server-side state for one connected client: identity, phase, room,
//! partial input and the outbound message queue.

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::error::SendError;
use crate::framer::LineFramer;
use crate::message::ServerMessage;
use crate::types::{ClientId, Phase};

/// Connected client session
///
/// `nickname`, `phase` and `room` are only changed through the
/// [`Registry`](crate::registry::Registry), which keeps its indexes in step.
#[derive(Debug)]
pub struct Session {
    /// Connection handle
    pub id: ClientId,
    /// Server → Client message queue
    sender: mpsc::Sender<ServerMessage>,
    /// Partial input for this connection
    pub framer: LineFramer,
    nickname: Option<String>,
    phase: Phase,
    room: String,
}

impl Session {
    /// Create a new session in `Init` phase
    pub fn new(id: ClientId, sender: mpsc::Sender<ServerMessage>, framer: LineFramer) -> Self {
        Self {
            id,
            sender,
            framer,
            nickname: None,
            phase: Phase::Init,
            room: String::new(),
        }
    }

    /// Queue a message for this client without waiting
    ///
    /// A full queue counts as a failed write, same as a closed one.
    pub fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => SendError::QueueFull,
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }

    /// Current nickname, if one was ever set
    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    /// Nickname for log lines
    pub fn display_name(&self) -> &str {
        self.nickname().unwrap_or("-")
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current room, or "" unless `Inside`
    pub fn room(&self) -> &str {
        &self.room
    }

    pub(crate) fn set_nickname(&mut self, nickname: String) -> Option<String> {
        if self.phase == Phase::Init {
            self.phase = Phase::Outside;
        }
        self.nickname.replace(nickname)
    }

    pub(crate) fn enter_room(&mut self, room: String) -> Option<String> {
        let previous = self.exit_room();
        self.phase = Phase::Inside;
        self.room = room;
        previous
    }

    pub(crate) fn exit_room(&mut self) -> Option<String> {
        if self.phase != Phase::Inside {
            return None;
        }
        self.phase = Phase::Outside;
        Some(std::mem::take(&mut self.room))
    }
}
