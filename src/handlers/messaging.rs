//! PRIVMSG delivery to channels and to individual users.

use crate::error::{HandlerError, HandlerResult};
use crate::state::{ConnId, Registry};

/// Relay a message to a channel (fan-out, sender excluded) or to a single
/// user by nickname.
pub fn privmsg(registry: &Registry, id: ConnId, target: &str, text: &str) -> HandlerResult {
    let text = text.strip_prefix(':').unwrap_or(text);
    let Some(nick) = registry.nickname_of(id) else {
        return Ok(());
    };
    let line = format!(":{nick} PRIVMSG {target} :{text}");

    if target.starts_with('#') {
        let channel = registry
            .get_channel(target)
            .ok_or_else(|| HandlerError::NoSuchChannel(target.to_string()))?;
        let chan = channel.lock();
        if !chan.is_member(id) {
            return Err(HandlerError::CannotSendToChannel(target.to_string()));
        }
        chan.broadcast(registry, &line, Some(id));
    } else {
        let target_id = registry
            .find_by_nickname(target)
            .ok_or_else(|| HandlerError::NoSuchNick(target.to_string()))?;
        registry.send_to(target_id, &line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::channel::join;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn addr() -> std::net::SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    fn authed(reg: &Registry, nick: &str) -> (ConnId, UnboundedReceiver<String>) {
        let (id, rx) = reg.register_session(addr());
        if let Some(mut s) = reg.sessions.get_mut(&id) {
            s.nickname = Some(nick.to_string());
            s.has_password = true;
            s.has_nickname = true;
            s.has_username = true;
        }
        (id, rx)
    }

    #[test]
    fn channel_message_excludes_sender() {
        let reg = Registry::new("test.server", "pw");
        let (a, mut ra) = authed(&reg, "alice");
        let (b, mut rb) = authed(&reg, "bob");
        join(&reg, a, "#g").unwrap();
        join(&reg, b, "#g").unwrap();
        while ra.try_recv().is_ok() {}
        while rb.try_recv().is_ok() {}

        privmsg(&reg, a, "#g", ":hello there").unwrap();
        let line = rb.try_recv().unwrap();
        assert_eq!(line.trim_end(), ":alice PRIVMSG #g :hello there");
        assert!(ra.try_recv().is_err(), "sender must not hear the echo");
    }

    #[test]
    fn message_to_channel_requires_membership() {
        let reg = Registry::new("test.server", "pw");
        let (a, _ra) = authed(&reg, "alice");
        let (b, _rb) = authed(&reg, "bob");
        join(&reg, a, "#g").unwrap();
        assert_eq!(
            privmsg(&reg, b, "#g", ":psst"),
            Err(HandlerError::CannotSendToChannel("#g".into()))
        );
    }

    #[test]
    fn direct_message_reaches_target() {
        let reg = Registry::new("test.server", "pw");
        let (a, _ra) = authed(&reg, "alice");
        let (_b, mut rb) = authed(&reg, "bob");
        privmsg(&reg, a, "bob", ":hi bob").unwrap();
        let line = rb.try_recv().unwrap();
        assert_eq!(line.trim_end(), ":alice PRIVMSG bob :hi bob");
    }

    #[test]
    fn unknown_targets_are_errors() {
        let reg = Registry::new("test.server", "pw");
        let (a, _ra) = authed(&reg, "alice");
        assert_eq!(
            privmsg(&reg, a, "#nowhere", ":x"),
            Err(HandlerError::NoSuchChannel("#nowhere".into()))
        );
        assert_eq!(
            privmsg(&reg, a, "nobody", ":x"),
            Err(HandlerError::NoSuchNick("nobody".into()))
        );
    }
}
