//! Command dispatch: parse a framed line, enforce the authentication gate,
//! and route to the handler table.

mod channel;
mod connection;
mod messaging;
mod oper;
mod server_query;

use crate::error::{HandlerError, HandlerResult};
use crate::state::{ConnId, Registry};
use std::sync::Arc;

/// Parse one framed line into (command, params).
///
/// An optional leading `:`-prefixed source token is consumed and discarded;
/// the next token, upper-cased, is the command; the remainder after the
/// first space is the parameter string, truncated at the first carriage
/// return.
fn parse_line(line: &str) -> (String, String) {
    let mut rest = line;
    if rest.starts_with(':') {
        rest = rest.split_once(' ').map_or("", |(_, r)| r);
    }
    let rest = rest.trim_start();
    let (command, params) = match rest.split_once(' ') {
        Some((c, p)) => (c, p),
        None => (rest, ""),
    };
    let params = params.split('\r').next().unwrap_or("");
    (command.to_ascii_uppercase(), params.to_string())
}

/// Dispatch one complete line from a connection.
///
/// Gating: `CAP` and `WHO` are silently ignored; `QUIT` and `HELP` are
/// always permitted; `PASS`, `NICK`, `USER` are exempt from the gate since
/// they are the means of satisfying it; every other command requires a
/// fully authenticated session and otherwise yields a 451. Matching is
/// exact after upper-casing - no abbreviations.
pub fn dispatch(registry: &Arc<Registry>, id: ConnId, line: &str) -> HandlerResult {
    let (command, params) = parse_line(line);
    let cmd = command.as_str();
    let params = params.as_str();

    if cmd.is_empty() {
        return Ok(());
    }

    match cmd {
        "CAP" | "WHO" => return Ok(()),
        "QUIT" => return connection::quit(params),
        "HELP" => return server_query::help(registry, id),
        _ => {}
    }

    if !registry.registered(id) && !matches!(cmd, "PASS" | "NICK" | "USER") {
        return Err(HandlerError::NotAuthenticated(cmd.to_string()));
    }

    match cmd {
        "PASS" => connection::pass(registry, id, params),
        "NICK" => connection::nick(registry, id, params),
        "USER" => connection::user(registry, id, params),
        "LIST" => channel::list(registry, id),
        "JOIN" => channel::join(registry, id, params),
        "INVITE" => channel::invite(registry, id, params),
        "TOPIC" => channel::topic(registry, id, params),
        "KICK" => channel::kick(registry, id, params),
        "NAMES" => channel::names(registry, id, params),
        "MODE" => channel::mode(registry, id, params),
        "DIE" => oper::die(registry, id),
        "PRIVMSG" => match params.split_once(' ') {
            Some((target, text)) => messaging::privmsg(registry, id, target, text),
            None => Err(HandlerError::NeedMoreParams("PRIVMSG".to_string())),
        },
        other => Err(HandlerError::UnknownCommand(other.to_string())),
    }
}
