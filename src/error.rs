//! Error types for the chat server
//!
//! Defines transport/startup errors, per-command protocol errors,
//! framing errors and outbound delivery errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Transport failures end a single connection; startup failures end the process.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (fatal for the connection)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error (fatal - internal channel broken)
    #[error("Channel send error")]
    ChannelSend,

    /// Invalid command-line configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Listening socket could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Command rejections
///
/// All of these are recovered locally: the offending client gets `ERROR`
/// and its connection stays open.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Wrong number of space-separated arguments
    #[error("Wrong number of arguments for {0}")]
    WrongArity(&'static str),

    /// Command requires a nickname first
    #[error("Nickname required")]
    NicknameRequired,

    /// Command requires being in a room
    #[error("Not in room")]
    NotInRoom,

    /// Nickname already held by another session
    #[error("Nickname in use: {0}")]
    NicknameInUse(String),

    /// `/priv` target does not exist
    #[error("Unknown recipient: {0}")]
    UnknownRecipient(String),

    /// Line is not valid UTF-8
    #[error("Line is not valid UTF-8")]
    InvalidUtf8,
}

impl CommandError {
    /// Whether this is a nickname conflict rather than a malformed or misplaced command
    pub fn is_name_conflict(&self) -> bool {
        matches!(self, CommandError::NicknameInUse(_))
    }
}

/// Line framing errors (fatal for the connection)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Buffered line exceeds the configured maximum
    #[error("Line exceeds {max} bytes")]
    LineTooLong { max: usize },
}

/// Message send errors
///
/// Occurs when a session's outbound queue cannot accept a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The client is not draining its queue fast enough
    #[error("Outbound queue full")]
    QueueFull,
}

/// Command-line configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No port argument
    #[error("missing port argument")]
    MissingPort,

    /// Port is not an integer in 0..=65535
    #[error("invalid port: {0}")]
    InvalidPort(String),

    /// Unexpected trailing arguments
    #[error("too many arguments")]
    TooManyArguments,
}
