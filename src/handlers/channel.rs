//! Channel handlers: JOIN, NAMES, LIST, TOPIC, INVITE, KICK, MODE.

use crate::error::{HandlerError, HandlerResult};
use crate::reply;
use crate::state::{ConnId, Registry};
use tracing::info;

pub fn join(registry: &Registry, id: ConnId, params: &str) -> HandlerResult {
    let mut args = params.split_whitespace();
    let name = args
        .next()
        .ok_or_else(|| HandlerError::NeedMoreParams("JOIN".to_string()))?;
    let key = args.next();

    if !name.starts_with('#') {
        return Err(HandlerError::NoSuchChannel(name.to_string()));
    }
    let Some(nick) = registry.nickname_of(id) else {
        return Ok(());
    };

    // Create-on-first-join; an existing channel enforces its access modes.
    // Lookup and creation are one map entry acquisition, and the checks
    // below share one channel lock with the insert, so concurrent joins can
    // neither split a new channel nor slip past the limit.
    let channel = registry.get_or_create_channel(name);

    let list = {
        let mut chan = channel.lock();
        if chan.is_member(id) {
            return Ok(());
        }
        if chan.is_invite_only() && !chan.is_invited(&nick) {
            return Err(HandlerError::InviteOnlyChan(name.to_string()));
        }
        if chan.has_key() && chan.key() != key {
            return Err(HandlerError::BadChannelKey(name.to_string()));
        }
        if let Some(limit) = chan.user_limit() {
            if chan.member_count() >= limit {
                return Err(HandlerError::ChannelIsFull(name.to_string()));
            }
        }

        chan.add_member(id, &nick);
        chan.broadcast(registry, &format!(":{nick} JOIN :{name}"), None);
        if chan.has_topic() {
            registry.send_to(
                id,
                &reply::numeric(
                    &registry.server_name,
                    "332",
                    &nick,
                    &format!("{name} :{}", chan.topic()),
                ),
            );
        }
        chan.member_list(registry)
    };
    registry.send_to(id, &reply::names(&registry.server_name, &nick, name, &list));
    registry.send_to(id, &reply::end_of_names(&registry.server_name, &nick, name));
    info!(id, %nick, channel = %name, "joined channel");
    Ok(())
}

pub fn names(registry: &Registry, id: ConnId, params: &str) -> HandlerResult {
    let name = params
        .split_whitespace()
        .next()
        .ok_or_else(|| HandlerError::NeedMoreParams("NAMES".to_string()))?;
    let channel = registry
        .get_channel(name)
        .ok_or_else(|| HandlerError::NoSuchChannel(name.to_string()))?;
    let Some(nick) = registry.nickname_of(id) else {
        return Ok(());
    };
    let list = channel.lock().member_list(registry);
    registry.send_to(id, &reply::names(&registry.server_name, &nick, name, &list));
    registry.send_to(id, &reply::end_of_names(&registry.server_name, &nick, name));
    Ok(())
}

pub fn list(registry: &Registry, id: ConnId) -> HandlerResult {
    let Some(nick) = registry.nickname_of(id) else {
        return Ok(());
    };
    let server_name = &registry.server_name;
    registry.send_to(
        id,
        &reply::numeric(server_name, "321", &nick, "Channel :Users Name"),
    );
    for name in registry.channel_names() {
        if let Some(channel) = registry.get_channel(&name) {
            let (count, topic) = {
                let chan = channel.lock();
                (chan.member_count(), chan.topic().to_string())
            };
            registry.send_to(
                id,
                &reply::numeric(server_name, "322", &nick, &format!("{name} {count} :{topic}")),
            );
        }
    }
    registry.send_to(id, &reply::numeric(server_name, "323", &nick, ":End of /LIST"));
    Ok(())
}

pub fn topic(registry: &Registry, id: ConnId, params: &str) -> HandlerResult {
    let (name, rest) = match params.split_once(' ') {
        Some((n, r)) => (n, r),
        None => (params.trim(), ""),
    };
    if name.is_empty() {
        return Err(HandlerError::NeedMoreParams("TOPIC".to_string()));
    }
    let channel = registry
        .get_channel(name)
        .ok_or_else(|| HandlerError::NoSuchChannel(name.to_string()))?;
    let Some(nick) = registry.nickname_of(id) else {
        return Ok(());
    };

    if rest.is_empty() {
        // Topic query.
        let chan = channel.lock();
        let line = if chan.has_topic() {
            reply::numeric(
                &registry.server_name,
                "332",
                &nick,
                &format!("{name} :{}", chan.topic()),
            )
        } else {
            reply::numeric(
                &registry.server_name,
                "331",
                &nick,
                &format!("{name} :No topic is set"),
            )
        };
        drop(chan);
        registry.send_to(id, &line);
        return Ok(());
    }

    let text = rest.strip_prefix(':').unwrap_or(rest);
    let mut chan = channel.lock();
    if !chan.is_member(id) {
        return Err(HandlerError::NotOnChannel(name.to_string()));
    }
    if chan.is_topic_restricted() && !chan.is_operator(id) {
        return Err(HandlerError::ChanOpPrivsNeeded(name.to_string()));
    }
    chan.set_topic(text);
    chan.broadcast(registry, &format!(":{nick} TOPIC {name} :{text}"), None);
    info!(id, channel = %name, "topic changed");
    Ok(())
}

pub fn invite(registry: &Registry, id: ConnId, params: &str) -> HandlerResult {
    let mut args = params.split_whitespace();
    let (Some(target_nick), Some(name)) = (args.next(), args.next()) else {
        return Err(HandlerError::NeedMoreParams("INVITE".to_string()));
    };
    let channel = registry
        .get_channel(name)
        .ok_or_else(|| HandlerError::NoSuchChannel(name.to_string()))?;
    let Some(nick) = registry.nickname_of(id) else {
        return Ok(());
    };
    let target_id = registry
        .find_by_nickname(target_nick)
        .ok_or_else(|| HandlerError::NoSuchNick(target_nick.to_string()))?;

    {
        let mut chan = channel.lock();
        if !chan.is_member(id) {
            return Err(HandlerError::NotOnChannel(name.to_string()));
        }
        if chan.is_invite_only() && !chan.is_operator(id) {
            return Err(HandlerError::ChanOpPrivsNeeded(name.to_string()));
        }
        if chan.is_member(target_id) {
            return Err(HandlerError::UserOnChannel(target_nick.to_string()));
        }
        chan.add_invite(target_nick);
    }

    registry.send_to(
        id,
        &reply::numeric(
            &registry.server_name,
            "341",
            &nick,
            &format!("{target_nick} {name}"),
        ),
    );
    registry.send_to(target_id, &format!(":{nick} INVITE {target_nick} :{name}"));
    info!(id, target = %target_nick, channel = %name, "invite issued");
    Ok(())
}

pub fn kick(registry: &Registry, id: ConnId, params: &str) -> HandlerResult {
    let mut args = params.splitn(3, ' ');
    let (Some(name), Some(target_nick)) = (args.next(), args.next()) else {
        return Err(HandlerError::NeedMoreParams("KICK".to_string()));
    };
    let reason = args
        .next()
        .map(|r| r.strip_prefix(':').unwrap_or(r))
        .filter(|r| !r.is_empty());

    let channel = registry
        .get_channel(name)
        .ok_or_else(|| HandlerError::NoSuchChannel(name.to_string()))?;
    let Some(nick) = registry.nickname_of(id) else {
        return Ok(());
    };
    let target_id = registry
        .find_by_nickname(target_nick)
        .ok_or_else(|| HandlerError::NoSuchNick(target_nick.to_string()))?;

    let empty = {
        let mut chan = channel.lock();
        if !chan.is_member(id) {
            return Err(HandlerError::NotOnChannel(name.to_string()));
        }
        if !chan.is_operator(id) {
            return Err(HandlerError::ChanOpPrivsNeeded(name.to_string()));
        }
        if !chan.is_member(target_id) {
            return Err(HandlerError::UserNotInChannel(target_nick.to_string()));
        }
        let reason = reason.unwrap_or(&nick);
        chan.broadcast(
            registry,
            &format!(":{nick} KICK {name} {target_nick} :{reason}"),
            None,
        );
        chan.remove_member(registry, target_id);
        chan.member_count() == 0
    };
    if empty {
        registry.delete_channel(name);
    }
    info!(id, target = %target_nick, channel = %name, "member kicked");
    Ok(())
}

pub fn mode(registry: &Registry, id: ConnId, params: &str) -> HandlerResult {
    let mut args = params.split_whitespace();
    let name = args
        .next()
        .ok_or_else(|| HandlerError::NeedMoreParams("MODE".to_string()))?;
    let channel = registry
        .get_channel(name)
        .ok_or_else(|| HandlerError::NoSuchChannel(name.to_string()))?;
    let Some(nick) = registry.nickname_of(id) else {
        return Ok(());
    };

    let Some(modestr) = args.next() else {
        // Mode query.
        let modes = channel.lock().modes();
        registry.send_to(
            id,
            &reply::numeric(&registry.server_name, "324", &nick, &format!("{name} {modes}")),
        );
        return Ok(());
    };

    let mut chan = channel.lock();
    if !chan.is_member(id) {
        return Err(HandlerError::NotOnChannel(name.to_string()));
    }
    if !chan.is_operator(id) {
        return Err(HandlerError::ChanOpPrivsNeeded(name.to_string()));
    }

    let mut adding = true;
    for c in modestr.chars() {
        match c {
            '+' => adding = true,
            '-' => adding = false,
            'i' => chan.set_invite_only(adding),
            't' => chan.set_topic_restricted(adding),
            'k' => {
                if adding {
                    let key = args
                        .next()
                        .ok_or_else(|| HandlerError::NeedMoreParams("MODE".to_string()))?;
                    chan.set_key(key);
                } else {
                    chan.remove_key();
                }
            }
            'l' => {
                if adding {
                    let limit: usize = args
                        .next()
                        .and_then(|l| l.parse().ok())
                        .ok_or_else(|| HandlerError::NeedMoreParams("MODE".to_string()))?;
                    chan.set_user_limit(limit);
                } else {
                    chan.remove_user_limit();
                }
            }
            'o' => {
                let target_nick = args
                    .next()
                    .ok_or_else(|| HandlerError::NeedMoreParams("MODE".to_string()))?;
                let target_id = registry
                    .find_by_nickname(target_nick)
                    .ok_or_else(|| HandlerError::NoSuchNick(target_nick.to_string()))?;
                if !chan.is_member(target_id) {
                    return Err(HandlerError::UserNotInChannel(target_nick.to_string()));
                }
                if adding {
                    chan.add_operator(target_id);
                } else {
                    chan.remove_operator(target_id);
                }
            }
            other => return Err(HandlerError::UnknownMode(other)),
        }
    }

    chan.broadcast(registry, &format!(":{nick} MODE {params}"), None);
    info!(id, channel = %name, modes = %modestr, "modes changed");
    Ok(())
}
