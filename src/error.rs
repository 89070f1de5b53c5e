//! Unified error handling for lanternd.
//!
//! Command handlers return [`HandlerError`] values; the connection task maps
//! them to numeric replies on the offending connection. Protocol-level
//! failures never terminate the connection or the event loop - only `Quit`
//! triggers the disconnect sequence, and it is special-cased by the caller.

use crate::reply;
use thiserror::Error;

/// Errors that can occur during command handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("not enough parameters: {0}")]
    NeedMoreParams(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("not authenticated: {0}")]
    NotAuthenticated(String),

    #[error("no nickname given")]
    NoNicknameGiven,

    #[error("nickname in use: {0}")]
    NicknameInUse(String),

    #[error("password incorrect")]
    PasswordMismatch,

    #[error("no such nick: {0}")]
    NoSuchNick(String),

    #[error("no such channel: {0}")]
    NoSuchChannel(String),

    #[error("cannot send to channel: {0}")]
    CannotSendToChannel(String),

    #[error("user {0} is not on that channel")]
    UserNotInChannel(String),

    #[error("not on channel: {0}")]
    NotOnChannel(String),

    #[error("user {0} is already on that channel")]
    UserOnChannel(String),

    #[error("you're not channel operator: {0}")]
    ChanOpPrivsNeeded(String),

    #[error("cannot join channel (+i): {0}")]
    InviteOnlyChan(String),

    #[error("cannot join channel (+k): {0}")]
    BadChannelKey(String),

    #[error("cannot join channel (+l): {0}")]
    ChannelIsFull(String),

    #[error("unknown mode char: {0}")]
    UnknownMode(char),

    #[error("client quit: {0:?}")]
    Quit(Option<String>),
}

impl HandlerError {
    /// Convert to a numeric error reply line.
    ///
    /// Returns `None` for errors that don't warrant a client-visible reply
    /// (`Quit` is handled by the disconnect sequence instead).
    pub fn to_reply(&self, server_name: &str) -> Option<String> {
        let (code, detail) = match self {
            Self::NeedMoreParams(cmd) => ("461", format!("{cmd} :Not enough parameters")),
            Self::UnknownCommand(cmd) => ("421", format!("{cmd} :Unknown command")),
            Self::NotAuthenticated(cmd) => (
                "451",
                format!("{cmd} :You must authenticate before using this command"),
            ),
            Self::NoNicknameGiven => ("431", "NICK :No nickname given".to_string()),
            Self::NicknameInUse(nick) => ("433", format!("{nick} :Nickname is already in use")),
            Self::PasswordMismatch => ("464", "PASS :Password incorrect".to_string()),
            Self::NoSuchNick(nick) => ("401", format!("{nick} :No such nick")),
            Self::NoSuchChannel(chan) => ("403", format!("{chan} :No such channel")),
            Self::CannotSendToChannel(chan) => ("404", format!("{chan} :Cannot send to channel")),
            Self::UserNotInChannel(nick) => ("441", format!("{nick} :They aren't on that channel")),
            Self::NotOnChannel(chan) => ("442", format!("{chan} :You're not on that channel")),
            Self::UserOnChannel(nick) => ("443", format!("{nick} :is already on channel")),
            Self::ChanOpPrivsNeeded(chan) => ("482", format!("{chan} :You're not channel operator")),
            Self::InviteOnlyChan(chan) => ("473", format!("{chan} :Cannot join channel (+i)")),
            Self::BadChannelKey(chan) => ("475", format!("{chan} :Cannot join channel (+k)")),
            Self::ChannelIsFull(chan) => ("471", format!("{chan} :Cannot join channel (+l)")),
            Self::UnknownMode(c) => ("472", format!("{c} :is unknown mode char to me")),
            Self::Quit(_) => return None,
        };
        Some(reply::error(server_name, code, &detail))
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;
