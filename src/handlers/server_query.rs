//! Informational queries available to any connection.

use crate::error::HandlerResult;
use crate::reply;
use crate::state::{ConnId, Registry};

/// List the commands the server understands. Available before
/// authentication so a client can discover the registration sequence.
pub fn help(registry: &Registry, id: ConnId) -> HandlerResult {
    registry.send_to(
        id,
        &reply::notice(
            &registry.server_name,
            ":Available commands: PASS NICK USER JOIN NAMES LIST TOPIC INVITE KICK MODE PRIVMSG HELP QUIT DIE",
        ),
    );
    Ok(())
}
