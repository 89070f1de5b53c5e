//! Outbound wire formatting.
//!
//! All server-sourced lines follow the numeric-reply convention:
//! `:<server> <code> <target> <detail>` for numerics and
//! `:<server> NOTICE * <text>` for notices. The trailing CRLF is appended
//! by the send path, not here.

/// A server-sourced numeric reply addressed to a specific nickname.
pub fn numeric(server_name: &str, code: &str, target: &str, detail: &str) -> String {
    format!(":{server_name} {code} {target} {detail}")
}

/// A numeric error reply; errors are addressed to `*`.
pub fn error(server_name: &str, code: &str, detail: &str) -> String {
    format!(":{server_name} {code} * {detail}")
}

/// A server notice. `text` is carried verbatim, including any leading colon.
pub fn notice(server_name: &str, text: &str) -> String {
    format!(":{server_name} NOTICE * {text}")
}

/// The 001 welcome emitted once registration completes.
pub fn welcome(server_name: &str, nick: &str) -> String {
    numeric(server_name, "001", nick, ":Welcome to the chat server")
}

/// RPL_NAMREPLY (353) carrying a channel member list.
pub fn names(server_name: &str, nick: &str, channel: &str, members: &str) -> String {
    numeric(server_name, "353", nick, &format!("= {channel} :{members}"))
}

/// RPL_ENDOFNAMES (366).
pub fn end_of_names(server_name: &str, nick: &str, channel: &str) -> String {
    numeric(server_name, "366", nick, &format!("{channel} :End of /NAMES list"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_reply_format() {
        assert_eq!(
            numeric("lantern.local", "001", "alice", ":Welcome to the chat server"),
            ":lantern.local 001 alice :Welcome to the chat server"
        );
    }

    #[test]
    fn names_reply_format() {
        assert_eq!(
            names("lantern.local", "carol", "#general", "@alice bob carol"),
            ":lantern.local 353 carol = #general :@alice bob carol"
        );
    }
}
