//! Runtime configuration
//!
//! The listening port comes from the command line (`line_chat <port> [host]`);
//! buffer sizes use fixed defaults.

use crate::error::ConfigError;

/// Default bind host (all interfaces)
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default cap on a single line, in bytes
pub const DEFAULT_MAX_LINE_LENGTH: usize = 16 * 1024;

/// Default socket read buffer size
pub const DEFAULT_READ_BUFFER_SIZE: usize = 16 * 1024;

/// Default per-client outbound queue depth
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

/// Default handler → server command channel depth
pub const DEFAULT_COMMAND_CAPACITY: usize = 256;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Interface to bind
    pub host: String,
    /// TCP port to listen on
    pub port: u16,
    /// Longest accepted line; longer input closes the connection
    pub max_line_length: usize,
    /// Accept `\r\n` line endings by dropping the `\r`
    pub strip_carriage_return: bool,
    /// Bytes requested per socket read
    pub read_buffer_size: usize,
    /// Messages a slow client may have queued before it is dropped
    pub outbound_capacity: usize,
    /// Buffered connection events awaiting the server actor
    pub command_capacity: usize,
}

impl Config {
    /// Configuration with defaults for everything but the port
    pub fn new(port: u16) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            strip_carriage_return: true,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
        }
    }

    /// Parse `<port> [host]` (program name already skipped)
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();

        let port = args.next().ok_or(ConfigError::MissingPort)?;
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(port.clone()))?;

        let mut config = Self::new(port);
        if let Some(host) = args.next() {
            config.host = host;
        }
        if args.next().is_some() {
            return Err(ConfigError::TooManyArguments);
        }
        Ok(config)
    }

    /// `host:port` for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
