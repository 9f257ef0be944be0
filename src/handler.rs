//! TCP connection handler
//!
//! Handles one client connection: registers it with the ChatServer,
//! forwards socket reads as raw bytes, and writes queued server lines back.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::AppError;
use crate::message::ServerMessage;
use crate::server::ServerCommand;
use crate::types::ClientId;

/// Handle a new TCP connection
///
/// Returns once either side of the connection is finished. A zero-length
/// read is end of stream: tokio only completes a read once the socket is
/// readable, so "no data yet" never shows up as `Ok(0)`.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
    config: &Config,
) -> Result<(), AppError> {
    let peer = stream.peer_addr().ok();
    let client_id = ClientId::new();
    let (mut reader, mut writer) = stream.into_split();

    // Create channel for server -> client messages
    let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(config.outbound_capacity);

    // Register with ChatServer before any data is forwarded
    cmd_tx
        .send(ServerCommand::Connect {
            client_id,
            sender: msg_tx,
            peer,
        })
        .await
        .map_err(|_| AppError::ChannelSend)?;

    // Spawn read task (socket -> ServerCommand)
    let cmd_tx_read = cmd_tx.clone();
    let read_buffer_size = config.read_buffer_size;
    let mut read_task = tokio::spawn(async move {
        let mut buf = vec![0u8; read_buffer_size];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => {
                    debug!("Client {} closed its end", client_id);
                    break;
                }
                Ok(n) => {
                    let cmd = ServerCommand::Data {
                        client_id,
                        bytes: buf[..n].to_vec(),
                    };
                    if cmd_tx_read.send(cmd).await.is_err() {
                        debug!("Server closed, ending read task for {}", client_id);
                        break;
                    }
                }
                Err(e) => {
                    debug!("Read error for {}: {}", client_id, e);
                    break;
                }
            }
        }
    });

    // Spawn write task (ServerMessage -> socket)
    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = msg_rx.recv().await {
            if let Err(e) = writer.write_all(msg.to_line().as_bytes()).await {
                debug!("Write to {} failed: {}", client_id, e);
                break;
            }
        }
        // Queue closed: the server dropped this session
        let _ = writer.shutdown().await;
        debug!("Write task ended for {}", client_id);
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut read_task => {
            debug!("Read task completed for {}", client_id);
            let _ = cmd_tx.send(ServerCommand::Disconnect { client_id }).await;
            // The server drops the session; the writer flushes what is queued and exits
            let _ = write_task.await;
        }
        _ = &mut write_task => {
            debug!("Write task completed for {}", client_id);
            read_task.abort();
            // No-op if the server already removed the session
            let _ = cmd_tx.send(ServerCommand::Disconnect { client_id }).await;
        }
    }

    info!("Client {} connection closed", client_id);

    Ok(())
}
