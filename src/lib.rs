//! Line-oriented Chat Server Library
//!
//! A multi-room TCP chat server speaking a newline-delimited text protocol.
//!
//! # Features
//! - Nicknames, unique across all connections
//! - Implicit rooms created by the first `/join`
//! - Room chat, private messages and rename notices
//! - Departure notices on `/leave`, `/bye` and dropped connections
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the single owner of the session `Registry`
//! - Each connection has a `handler` task forwarding raw bytes to the server
//!   and writing the server's replies back to the socket
//! - No locks needed - all state access goes through message passing
//!
//! # Example
//! ```ignore
//! use line_chat::{listener, Config};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let config = Config::new(8000);
//!     let socket = listener::bind(&config).await.unwrap();
//!     listener::serve(socket, config).await.unwrap();
//! }
//! ```

pub mod broadcast;
pub mod command;
pub mod config;
pub mod error;
pub mod framer;
pub mod handler;
pub mod interpreter;
pub mod listener;
pub mod message;
pub mod registry;
pub mod room;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use command::Command;
pub use config::Config;
pub use error::{AppError, CommandError, ConfigError, FrameError, SendError};
pub use framer::{Frames, LineFramer};
pub use handler::handle_connection;
pub use interpreter::Flow;
pub use message::ServerMessage;
pub use registry::Registry;
pub use room::Room;
pub use server::{ChatServer, ServerCommand};
pub use session::Session;
pub use types::{ClientId, Phase};
