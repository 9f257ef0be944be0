//! Command interpreter
//!
//! Applies one parsed line to the issuing session: validates the phase,
//! performs the transition, and sends the replies and room notices.

use tracing::{debug, info};

use crate::command::Command;
use crate::error::CommandError;
use crate::message::ServerMessage;
use crate::registry::Registry;
use crate::types::{ClientId, Phase};

/// What the event loop should do with the connection afterwards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading
    Continue,
    /// Close the connection (after `/bye`)
    Close,
}

/// Decode, parse and execute one line from `client_id`
///
/// Rejected commands are answered with `ERROR` and leave state untouched.
pub fn process_line(registry: &mut Registry, client_id: ClientId, line: &[u8]) -> Flow {
    let result = std::str::from_utf8(line)
        .map_err(|_| CommandError::InvalidUtf8)
        .and_then(Command::parse)
        .and_then(|command| execute(registry, client_id, command));

    match result {
        Ok(flow) => flow,
        Err(e) => {
            if e.is_name_conflict() {
                info!("Rejected nickname for {}: {}", client_id, e);
            } else {
                debug!("Rejected command from {}: {}", client_id, e);
            }
            registry.deliver(client_id, e.into());
            Flow::Continue
        }
    }
}

/// Execute a parsed command on behalf of `client_id`
pub fn execute(
    registry: &mut Registry,
    client_id: ClientId,
    command: Command,
) -> Result<Flow, CommandError> {
    let Some(session) = registry.get(client_id) else {
        return Ok(Flow::Close);
    };
    let phase = session.phase();
    let nick = session.nickname().unwrap_or_default().to_string();
    let room = session.room().to_string();

    match command {
        Command::Nick(new) => {
            if registry.find_by_nickname(&new) == Some(client_id) {
                registry.deliver(client_id, ServerMessage::Ok);
                return Ok(Flow::Continue);
            }
            registry.set_nickname(client_id, &new)?;
            info!("Client {} is now known as '{}'", client_id, new);
            if phase == Phase::Inside {
                registry.broadcast(&room, &ServerMessage::NewNick { old: nick, new });
            }
            registry.deliver(client_id, ServerMessage::Ok);
        }
        Command::Join(target) => {
            if phase == Phase::Init {
                return Err(CommandError::NicknameRequired);
            }
            if phase == Phase::Inside && room == target {
                registry.deliver(client_id, ServerMessage::Ok);
                return Ok(Flow::Continue);
            }
            let previous = registry.join(client_id, &target);
            info!("Client {} ('{}') joined room {}", client_id, nick, target);
            registry.deliver(client_id, ServerMessage::Ok);
            registry.broadcast(&target, &ServerMessage::Joined { nick: nick.clone() });
            if let Some(previous) = previous {
                registry.broadcast(&previous, &ServerMessage::Left { nick });
            }
        }
        Command::Leave => {
            if phase != Phase::Inside {
                return Err(CommandError::NotInRoom);
            }
            registry.leave(client_id);
            info!("Client {} ('{}') left room {}", client_id, nick, room);
            registry.deliver(client_id, ServerMessage::Ok);
            registry.broadcast(&room, &ServerMessage::Left { nick });
        }
        Command::Bye => {
            if let Some(room) = registry.leave(client_id) {
                registry.broadcast(&room, &ServerMessage::Left { nick });
            }
            registry.deliver(client_id, ServerMessage::Bye);
            return Ok(Flow::Close);
        }
        Command::Priv { to, text } => {
            if phase == Phase::Init {
                return Err(CommandError::NicknameRequired);
            }
            let recipient = registry
                .find_by_nickname(&to)
                .ok_or(CommandError::UnknownRecipient(to))?;
            registry.deliver(client_id, ServerMessage::Ok);
            registry.deliver(recipient, ServerMessage::Private { nick, text });
        }
        Command::Text(text) => {
            if phase != Phase::Inside {
                return Err(CommandError::NotInRoom);
            }
            registry.broadcast(&room, &ServerMessage::Message { nick, text });
        }
    }
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::framer::LineFramer;
    use crate::session::Session;

    struct Client {
        id: ClientId,
        rx: mpsc::Receiver<ServerMessage>,
    }

    impl Client {
        fn connect(registry: &mut Registry) -> Self {
            let (tx, rx) = mpsc::channel(64);
            let id = ClientId::new();
            registry.insert(Session::new(id, tx, LineFramer::new(1024)));
            Self { id, rx }
        }

        fn send(&self, registry: &mut Registry, line: &str) -> Flow {
            process_line(registry, self.id, line.as_bytes())
        }

        fn received(&mut self) -> Vec<String> {
            let mut lines = Vec::new();
            while let Ok(msg) = self.rx.try_recv() {
                lines.push(msg.to_string());
            }
            lines
        }
    }

    fn named(registry: &mut Registry, nick: &str) -> Client {
        let mut client = Client::connect(registry);
        client.send(registry, &format!("/nick {nick}"));
        assert_eq!(client.received(), vec!["OK"]);
        client
    }

    fn in_room(registry: &mut Registry, nick: &str, room: &str) -> Client {
        let mut client = named(registry, nick);
        client.send(registry, &format!("/join {room}"));
        client.received();
        client
    }

    #[test]
    fn test_init_rejects_everything_but_nick_and_bye() {
        let mut registry = Registry::new();
        let mut a = Client::connect(&mut registry);

        for line in ["hello", "/join lobby", "/priv bob hi", "/leave", "//hi"] {
            assert_eq!(a.send(&mut registry, line), Flow::Continue);
        }
        assert_eq!(a.received(), vec!["ERROR"; 5]);
        assert_eq!(registry.get(a.id).unwrap().phase(), Phase::Init);
    }

    #[test]
    fn test_join_then_chat_round_trip() {
        let mut registry = Registry::new();
        let mut b = in_room(&mut registry, "bob", "lobby");
        let mut a = Client::connect(&mut registry);

        a.send(&mut registry, "/nick alice");
        a.send(&mut registry, "/join lobby");
        a.send(&mut registry, "hello");

        assert_eq!(b.received(), vec!["JOINED alice", "MESSAGE alice hello"]);
        assert_eq!(
            a.received(),
            vec!["OK", "OK", "JOINED alice", "MESSAGE alice hello"]
        );
    }

    #[test]
    fn test_nick_arity_errors_keep_state() {
        let mut registry = Registry::new();
        let mut a = named(&mut registry, "alice");

        a.send(&mut registry, "/nick");
        a.send(&mut registry, "/nick a b");
        assert_eq!(a.received(), vec!["ERROR", "ERROR"]);
        assert_eq!(registry.get(a.id).unwrap().nickname(), Some("alice"));
    }

    #[test]
    fn test_nick_conflict() {
        let mut registry = Registry::new();
        let _a = named(&mut registry, "alice");
        let mut b = Client::connect(&mut registry);

        b.send(&mut registry, "/nick alice");
        assert_eq!(b.received(), vec!["ERROR"]);
        assert_eq!(registry.get(b.id).unwrap().phase(), Phase::Init);
    }

    #[test]
    fn test_nick_same_name_is_noop() {
        let mut registry = Registry::new();
        let mut a = in_room(&mut registry, "alice", "lobby");
        let mut b = in_room(&mut registry, "bob", "lobby");
        a.received();

        a.send(&mut registry, "/nick alice");
        assert_eq!(a.received(), vec!["OK"]);
        assert!(b.received().is_empty());
    }

    #[test]
    fn test_rename_inside_room_broadcasts() {
        let mut registry = Registry::new();
        let mut a = in_room(&mut registry, "alice", "lobby");
        let mut b = in_room(&mut registry, "bob", "lobby");
        a.received();

        a.send(&mut registry, "/nick alicia");
        assert_eq!(b.received(), vec!["NEWNICK alice alicia"]);
        assert_eq!(a.received(), vec!["NEWNICK alice alicia", "OK"]);
    }

    #[test]
    fn test_rename_outside_is_silent() {
        let mut registry = Registry::new();
        let mut a = named(&mut registry, "alice");
        let mut b = in_room(&mut registry, "bob", "lobby");

        a.send(&mut registry, "/nick alicia");
        assert_eq!(a.received(), vec!["OK"]);
        assert!(b.received().is_empty());
        assert_eq!(registry.find_by_nickname("alicia"), Some(a.id));
    }

    #[test]
    fn test_room_switch_joined_before_left() {
        let mut registry = Registry::new();
        let mut a = in_room(&mut registry, "alice", "lobby");
        let mut b = in_room(&mut registry, "bob", "lobby");
        let mut c = in_room(&mut registry, "carol", "den");
        a.received();

        b.send(&mut registry, "/join den");

        assert_eq!(b.received(), vec!["OK", "JOINED bob"]);
        assert_eq!(c.received(), vec!["JOINED bob"]);
        assert_eq!(a.received(), vec!["LEFT bob"]);
        assert_eq!(registry.get(b.id).unwrap().room(), "den");
    }

    #[test]
    fn test_rejoin_current_room_is_silent() {
        let mut registry = Registry::new();
        let mut a = in_room(&mut registry, "alice", "lobby");
        let mut b = in_room(&mut registry, "bob", "lobby");
        a.received();

        b.send(&mut registry, "/join lobby");
        assert_eq!(b.received(), vec!["OK"]);
        assert!(a.received().is_empty());
    }

    #[test]
    fn test_leave() {
        let mut registry = Registry::new();
        let mut a = in_room(&mut registry, "alice", "lobby");
        let mut b = in_room(&mut registry, "bob", "lobby");
        a.received();

        b.send(&mut registry, "/leave");
        assert_eq!(b.received(), vec!["OK"]);
        assert_eq!(a.received(), vec!["LEFT bob"]);
        assert_eq!(registry.get(b.id).unwrap().phase(), Phase::Outside);
        assert_eq!(registry.get(b.id).unwrap().room(), "");

        b.send(&mut registry, "/leave");
        b.send(&mut registry, "hello");
        assert_eq!(b.received(), vec!["ERROR", "ERROR"]);
    }

    #[test]
    fn test_priv() {
        let mut registry = Registry::new();
        let mut a = named(&mut registry, "alice");
        let mut b = named(&mut registry, "bob");
        let mut c = named(&mut registry, "carol");

        a.send(&mut registry, "/priv bob hi there");
        assert_eq!(a.received(), vec!["OK"]);
        assert_eq!(b.received(), vec!["PRIVATE alice hi there"]);

        a.send(&mut registry, "/priv ghost hi");
        assert_eq!(a.received(), vec!["ERROR"]);
        assert!(b.received().is_empty());
        assert!(c.received().is_empty());
    }

    #[test]
    fn test_bye_inside_room() {
        let mut registry = Registry::new();
        let mut a = in_room(&mut registry, "alice", "x");
        let mut b = in_room(&mut registry, "bob", "x");
        a.received();

        assert_eq!(b.send(&mut registry, "/bye"), Flow::Close);
        assert_eq!(a.received(), vec!["LEFT bob"]);
        assert_eq!(b.received(), vec!["BYE"]);
    }

    #[test]
    fn test_bye_from_init() {
        let mut registry = Registry::new();
        let mut a = Client::connect(&mut registry);

        assert_eq!(a.send(&mut registry, "/bye"), Flow::Close);
        assert_eq!(a.received(), vec!["BYE"]);
    }

    #[test]
    fn test_escaped_and_unknown_commands_are_chat() {
        let mut registry = Registry::new();
        let mut a = in_room(&mut registry, "alice", "lobby");

        a.send(&mut registry, "//hello");
        a.send(&mut registry, "/shrug ok");
        a.send(&mut registry, "/");
        assert_eq!(
            a.received(),
            vec!["MESSAGE alice /hello", "MESSAGE alice shrug ok", "MESSAGE alice "]
        );
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let mut registry = Registry::new();
        let mut a = in_room(&mut registry, "alice", "lobby");

        let flow = process_line(&mut registry, a.id, &[0xff, 0xfe, b'a']);
        assert_eq!(flow, Flow::Continue);
        assert_eq!(a.received(), vec!["ERROR"]);
    }
}
