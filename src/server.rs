//! ChatServer Actor implementation
//!
//! The event loop: a single actor that owns the session registry and
//! processes connection events one at a time. Handlers forward raw socket
//! bytes; framing, interpretation and fan-out all happen here, so every
//! event runs to completion before the next is received.

use std::net::SocketAddr;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::framer::LineFramer;
use crate::interpreter::{self, Flow};
use crate::message::ServerMessage;
use crate::registry::Registry;
use crate::session::Session;
use crate::types::ClientId;

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New client connected
    Connect {
        client_id: ClientId,
        sender: mpsc::Sender<ServerMessage>,
        peer: Option<SocketAddr>,
    },
    /// Bytes read from a client
    Data { client_id: ClientId, bytes: Vec<u8> },
    /// Client disconnected (EOF or read error)
    Disconnect { client_id: ClientId },
}

/// The main ChatServer actor
pub struct ChatServer {
    /// Live sessions and room membership
    registry: Registry,
    /// Maximum line length handed to each session's framer
    max_line_length: usize,
    /// Whether framers drop a `\r` before `\n`
    strip_carriage_return: bool,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>, config: &Config) -> Self {
        Self {
            registry: Registry::new(),
            max_line_length: config.max_line_length,
            strip_carriage_return: config.strip_carriage_return,
            receiver,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Current registry state
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Process a single command
    pub fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect {
                client_id,
                sender,
                peer,
            } => {
                self.handle_connect(client_id, sender, peer);
            }
            ServerCommand::Data { client_id, bytes } => {
                self.handle_data(client_id, &bytes);
            }
            ServerCommand::Disconnect { client_id } => {
                if self.registry.contains(client_id) {
                    info!("Client {} disconnected", client_id);
                    self.teardown(client_id);
                }
            }
        }
    }

    /// Handle new client connection
    fn handle_connect(
        &mut self,
        client_id: ClientId,
        sender: mpsc::Sender<ServerMessage>,
        peer: Option<SocketAddr>,
    ) {
        match peer {
            Some(peer) => info!("Client {} connected from {}", client_id, peer),
            None => info!("Client {} connected", client_id),
        }
        let framer = LineFramer::new(self.max_line_length)
            .strip_carriage_return(self.strip_carriage_return);
        self.registry.insert(Session::new(client_id, sender, framer));
        debug!(
            "Total clients: {}, Total rooms: {}",
            self.registry.len(),
            self.registry.room_count()
        );
    }

    /// Handle bytes read from a client
    fn handle_data(&mut self, client_id: ClientId, bytes: &[u8]) {
        let Some(session) = self.registry.get_mut(client_id) else {
            return;
        };

        let frames = session.framer.feed(bytes);

        for line in frames.lines {
            let flow = interpreter::process_line(&mut self.registry, client_id, &line);
            self.reap_failed();

            if flow == Flow::Close {
                info!("Client {} said bye", client_id);
                self.teardown(client_id);
                return;
            }
            if !self.registry.contains(client_id) {
                return;
            }
        }

        if let Some(e) = frames.overflow {
            warn!("Closing client {}: {}", client_id, e);
            self.teardown(client_id);
        }
    }

    /// Tear down every session whose delivery failed
    fn reap_failed(&mut self) {
        for client_id in self.registry.take_failed() {
            self.teardown(client_id);
        }
    }

    /// Remove a session, announcing its departure to the room it was in
    ///
    /// Dropping the session drops its outbound sender, which lets the
    /// handler flush what is queued and close the socket.
    fn teardown(&mut self, client_id: ClientId) {
        let mut pending = vec![client_id];

        while let Some(client_id) = pending.pop() {
            let nick = self
                .registry
                .get(client_id)
                .and_then(|s| s.nickname())
                .map(str::to_string);

            if let (Some(room), Some(nick)) = (self.registry.leave(client_id), nick) {
                self.registry.broadcast(&room, &ServerMessage::Left { nick });
            }

            if let Some(session) = self.registry.remove(client_id) {
                debug!("Session {} ('{}') removed", client_id, session.display_name());
            }
            pending.extend(self.registry.take_failed());
        }

        debug!(
            "Total clients: {}, Total rooms: {}",
            self.registry.len(),
            self.registry.room_count()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Phase;

    struct Harness {
        server: ChatServer,
        _tx: mpsc::Sender<ServerCommand>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_max_line(1024)
        }

        fn with_max_line(max: usize) -> Self {
            let (tx, rx) = mpsc::channel(16);
            let mut config = Config::new(0);
            config.max_line_length = max;
            Self {
                server: ChatServer::new(rx, &config),
                _tx: tx,
            }
        }

        fn connect(&mut self, capacity: usize) -> (ClientId, mpsc::Receiver<ServerMessage>) {
            let (sender, rx) = mpsc::channel(capacity);
            let client_id = ClientId::new();
            self.server.handle_command(ServerCommand::Connect {
                client_id,
                sender,
                peer: None,
            });
            (client_id, rx)
        }

        fn data(&mut self, client_id: ClientId, bytes: &str) {
            self.server.handle_command(ServerCommand::Data {
                client_id,
                bytes: bytes.as_bytes().to_vec(),
            });
        }

        fn disconnect(&mut self, client_id: ClientId) {
            self.server
                .handle_command(ServerCommand::Disconnect { client_id });
        }
    }

    fn drain(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            lines.push(msg.to_line());
        }
        lines
    }

    #[tokio::test]
    async fn test_lines_split_across_reads() {
        let mut h = Harness::new();
        let (a, mut rx) = h.connect(16);

        h.data(a, "/ni");
        assert!(drain(&mut rx).is_empty());
        h.data(a, "ck alice\n/join lob");
        h.data(a, "by\n");

        assert_eq!(drain(&mut rx), vec!["OK\n", "OK\n", "JOINED alice\n"]);
        let session = h.server.registry().get(a).unwrap();
        assert_eq!(session.phase(), Phase::Inside);
        assert_eq!(session.room(), "lobby");
    }

    #[tokio::test]
    async fn test_empty_read_keeps_connection() {
        let mut h = Harness::new();
        let (a, mut rx) = h.connect(16);

        h.data(a, "");
        assert!(h.server.registry().contains(a));
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_join_then_disconnect_notifies_once_each() {
        let mut h = Harness::new();
        let (b, mut rx_b) = h.connect(16);
        h.data(b, "/nick bob\n/join r\n");
        drain(&mut rx_b);

        let (a, _rx_a) = h.connect(16);
        h.data(a, "/nick alice\n/join r\n");
        h.disconnect(a);

        assert_eq!(drain(&mut rx_b), vec!["JOINED alice\n", "LEFT alice\n"]);
        assert!(!h.server.registry().contains(a));
        assert_eq!(h.server.registry().find_by_nickname("alice"), None);

        // A second disconnect for the same connection is ignored
        h.disconnect(a);
        assert!(drain(&mut rx_b).is_empty());
    }

    #[tokio::test]
    async fn test_bye_closes_and_skips_remaining_lines() {
        let mut h = Harness::new();
        let (b, mut rx_b) = h.connect(16);
        h.data(b, "/nick bob\n/join x\n");
        drain(&mut rx_b);

        let (a, mut rx_a) = h.connect(16);
        h.data(a, "/nick alice\n/join x\n");
        drain(&mut rx_a);
        drain(&mut rx_b);

        h.data(a, "/bye\nhello\n");

        assert_eq!(drain(&mut rx_b), vec!["LEFT alice\n"]);
        assert_eq!(drain(&mut rx_a), vec!["BYE\n"]);
        assert!(!h.server.registry().contains(a));
        // Sender dropped: the handler's writer sees the queue close
        assert!(rx_a.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_oversized_line_disconnects() {
        let mut h = Harness::with_max_line(12);
        let (b, mut rx_b) = h.connect(16);
        h.data(b, "/nick bob\n/join x\n");
        let (a, mut rx_a) = h.connect(16);
        h.data(a, "/nick al\n/join x\n");
        drain(&mut rx_b);
        drain(&mut rx_a);

        h.data(a, "0123456789abcdef");

        assert!(!h.server.registry().contains(a));
        assert_eq!(drain(&mut rx_b), vec!["LEFT al\n"]);
    }

    #[tokio::test]
    async fn test_lines_before_oversized_line_are_processed() {
        let mut h = Harness::with_max_line(12);
        let (b, mut rx_b) = h.connect(16);
        h.data(b, "/nick bob\n/join x\n");
        drain(&mut rx_b);

        let (a, mut rx_a) = h.connect(16);
        h.data(a, "/nick al\n/join x\nhello\n0123456789abcdefghij\n/leave\n");

        assert_eq!(
            drain(&mut rx_a),
            vec!["OK\n", "OK\n", "JOINED al\n", "MESSAGE al hello\n"]
        );
        assert_eq!(
            drain(&mut rx_b),
            vec!["JOINED al\n", "MESSAGE al hello\n", "LEFT al\n"]
        );
        assert!(!h.server.registry().contains(a));
    }

    #[tokio::test]
    async fn test_failed_recipient_is_torn_down() {
        let mut h = Harness::new();
        let (a, mut rx_a) = h.connect(16);
        h.data(a, "/nick alice\n/join x\n");
        let (b, rx_b) = h.connect(16);
        h.data(b, "/nick bob\n/join x\n");
        let (c, mut rx_c) = h.connect(16);
        h.data(c, "/nick carol\n/join x\n");
        drain(&mut rx_a);
        drain(&mut rx_c);

        drop(rx_b);
        h.data(a, "hi\n");

        assert!(!h.server.registry().contains(b));
        assert_eq!(drain(&mut rx_a), vec!["MESSAGE alice hi\n", "LEFT bob\n"]);
        assert_eq!(drain(&mut rx_c), vec!["MESSAGE alice hi\n", "LEFT bob\n"]);
        assert!(h.server.registry().contains(c));
    }

    #[tokio::test]
    async fn test_data_for_unknown_client_is_ignored() {
        let mut h = Harness::new();
        h.data(ClientId::new(), "/nick ghost\n");
        assert!(h.server.registry().is_empty());
    }

    #[tokio::test]
    async fn test_run_processes_until_senders_drop() {
        let (tx, rx) = mpsc::channel(16);
        let server = tokio::spawn(ChatServer::new(rx, &Config::new(0)).run());

        let (sender, mut out) = mpsc::channel(16);
        let client_id = ClientId::new();
        tx.send(ServerCommand::Connect {
            client_id,
            sender,
            peer: None,
        })
        .await
        .unwrap();
        tx.send(ServerCommand::Data {
            client_id,
            bytes: b"hello\n".to_vec(),
        })
        .await
        .unwrap();

        assert_eq!(out.recv().await, Some(ServerMessage::Error));

        drop(tx);
        server.await.unwrap();
        assert!(out.recv().await.is_none());
    }
}
