//! Server → client protocol lines
//!
//! Every message is a single line of UTF-8 text terminated by `\n`.

use std::fmt;

use crate::error::CommandError;

/// Server → Client message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Command succeeded
    Ok,
    /// Command rejected
    Error,
    /// Reply to `/bye`, sent right before the connection closes
    Bye,
    /// A member joined the room
    Joined { nick: String },
    /// A member left the room (including disconnects)
    Left { nick: String },
    /// A member renamed
    NewNick { old: String, new: String },
    /// Chat text from a room member
    Message { nick: String, text: String },
    /// Private text addressed to the recipient only
    Private { nick: String, text: String },
}

impl ServerMessage {
    /// Encode as wire bytes, including the trailing newline
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Ok => f.write_str("OK"),
            ServerMessage::Error => f.write_str("ERROR"),
            ServerMessage::Bye => f.write_str("BYE"),
            ServerMessage::Joined { nick } => write!(f, "JOINED {nick}"),
            ServerMessage::Left { nick } => write!(f, "LEFT {nick}"),
            ServerMessage::NewNick { old, new } => write!(f, "NEWNICK {old} {new}"),
            ServerMessage::Message { nick, text } => write!(f, "MESSAGE {nick} {text}"),
            ServerMessage::Private { nick, text } => write!(f, "PRIVATE {nick} {text}"),
        }
    }
}

/// Every rejected command surfaces to the client as a bare `ERROR`
impl From<CommandError> for ServerMessage {
    fn from(_: CommandError) -> Self {
        ServerMessage::Error
    }
}
