//! Line Chat Server - Entry Point
//!
//! Parses the listening port, binds the socket and runs the accept loop.

use std::env;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use line_chat::{listener, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=line_chat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("line_chat=info")),
        )
        .init();

    let config = match Config::from_args(env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            error!("usage: line_chat <port> [host]");
            return ExitCode::FAILURE;
        }
    };

    // Start TCP listener
    let socket = match listener::bind(&config).await {
        Ok(socket) => socket,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("Line chat server listening on {}", config.bind_addr());

    if let Err(e) = listener::serve(socket, config).await {
        error!("{}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
