//! Registration handlers: PASS, NICK, USER, QUIT.

use crate::error::{HandlerError, HandlerResult};
use crate::reply;
use crate::state::{ConnId, Registry};
use tracing::info;

pub fn pass(registry: &Registry, id: ConnId, params: &str) -> HandlerResult {
    let supplied = params.trim();
    if supplied.is_empty() {
        return Err(HandlerError::NeedMoreParams("PASS".to_string()));
    }
    let supplied = supplied.strip_prefix(':').unwrap_or(supplied);
    if supplied != registry.password() {
        return Err(HandlerError::PasswordMismatch);
    }
    if let Some(mut session) = registry.sessions.get_mut(&id) {
        session.has_password = true;
    }
    complete_registration(registry, id);
    Ok(())
}

pub fn nick(registry: &Registry, id: ConnId, params: &str) -> HandlerResult {
    let nick = params.split_whitespace().next().unwrap_or("");
    if nick.is_empty() {
        return Err(HandlerError::NoNicknameGiven);
    }
    if !registry.is_nickname_unique(nick) {
        // Re-asserting one's own nickname is not a collision.
        if registry.nickname_of(id).as_deref() == Some(nick) {
            return Ok(());
        }
        return Err(HandlerError::NicknameInUse(nick.to_string()));
    }
    if let Some(mut session) = registry.sessions.get_mut(&id) {
        session.nickname = Some(nick.to_string());
        session.has_nickname = true;
    }
    info!(id, %nick, "nickname set");
    complete_registration(registry, id);
    Ok(())
}

pub fn user(registry: &Registry, id: ConnId, params: &str) -> HandlerResult {
    let username = params
        .split_whitespace()
        .next()
        .ok_or_else(|| HandlerError::NeedMoreParams("USER".to_string()))?;
    if let Some(mut session) = registry.sessions.get_mut(&id) {
        session.username = Some(username.to_string());
        session.has_username = true;
    }
    complete_registration(registry, id);
    Ok(())
}

pub fn quit(params: &str) -> HandlerResult {
    let reason = params.strip_prefix(':').unwrap_or(params).trim();
    let reason = if reason.is_empty() {
        None
    } else {
        Some(reason.to_string())
    };
    Err(HandlerError::Quit(reason))
}

/// Emit the 001 welcome exactly once, when the third auth flag lands.
fn complete_registration(registry: &Registry, id: ConnId) {
    let newly_registered = registry.sessions.get_mut(&id).and_then(|mut session| {
        if session.registered() && !session.welcomed {
            session.welcomed = true;
            session.nickname.clone()
        } else {
            None
        }
    });
    if let Some(nick) = newly_registered {
        registry.send_to(id, &reply::welcome(&registry.server_name, &nick));
        info!(id, %nick, "registration complete");
    }
}
