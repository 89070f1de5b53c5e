//! Channel entity: membership, operators, topic, and access-control modes.

use std::collections::HashSet;
use tracing::debug;

use super::{ConnId, Registry};
use crate::reply;

/// A named group of sessions.
///
/// Channels hold only connection handles; nickname and sender lookups go
/// through the [`Registry`], which stays the sole owner of sessions.
#[derive(Debug)]
pub struct Channel {
    name: String,
    /// Members in join order. Stable iteration keeps member lists
    /// deterministic, which the operator-succession notification relies on.
    members: Vec<ConnId>,
    /// Operator handles; always a subset of `members`.
    operators: HashSet<ConnId>,
    topic: String,
    invite_only: bool,
    topic_restricted: bool,
    key: Option<String>,
    user_limit: Option<usize>,
    /// Nicknames exempted from the invite-only restriction for one join.
    invites: HashSet<String>,
}

impl Channel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            members: Vec::new(),
            operators: HashSet::new(),
            topic: String::new(),
            invite_only: false,
            topic_restricted: false,
            key: None,
            user_limit: None,
            invites: HashSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a member. The first member is simultaneously promoted to
    /// operator; a pending invite for the joining nickname is consumed.
    pub fn add_member(&mut self, id: ConnId, nickname: &str) {
        if self.members.is_empty() {
            self.operators.insert(id);
        }
        self.members.push(id);
        self.remove_invite(nickname);
        debug!(channel = %self.name, nick = %nickname, "member joined");
    }

    /// Remove a member, demoting it first and running operator succession.
    ///
    /// If the departure leaves the channel with no operators but more than
    /// one remaining member, the first remaining member is promoted, and
    /// every other remaining member is sent a refreshed member list (so
    /// clients observe the new `@` marker) before the leaver is erased.
    pub fn remove_member(&mut self, registry: &Registry, id: ConnId) {
        self.operators.remove(&id);

        if self.operators.is_empty() && self.members.len() > 1 {
            if let Some(&heir) = self.members.iter().find(|&&m| m != id) {
                self.operators.insert(heir);
                debug!(channel = %self.name, heir, "operator succession");

                // Member list built from the live set with the leaver already
                // excluded; the leaver must vanish by exact token, not by
                // substring excision of a rendered list.
                let list = self.member_list_without(registry, Some(id));
                let server_name = &registry.server_name;
                for &m in self.members.iter().filter(|&&m| m != id) {
                    if let Some(target) = registry.nickname_of(m) {
                        registry.send_to(m, &reply::names(server_name, &target, &self.name, &list));
                        registry.send_to(m, &reply::end_of_names(server_name, &target, &self.name));
                    }
                }
            }
        }

        self.members.retain(|&m| m != id);
    }

    /// Deliver `message` to every current member except `exclude`.
    ///
    /// Delivery is fire-and-forget per member; a closed queue on one member
    /// never blocks or aborts delivery to the rest.
    pub fn broadcast(&self, registry: &Registry, message: &str, exclude: Option<ConnId>) {
        for &m in &self.members {
            if Some(m) == exclude {
                continue;
            }
            registry.send_to(m, message);
        }
    }

    pub fn add_operator(&mut self, id: ConnId) {
        self.operators.insert(id);
    }

    pub fn remove_operator(&mut self, id: ConnId) {
        self.operators.remove(&id);
    }

    pub fn is_operator(&self, id: ConnId) -> bool {
        self.operators.contains(&id)
    }

    pub fn is_member(&self, id: ConnId) -> bool {
        self.members.contains(&id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn add_invite(&mut self, nickname: &str) {
        self.invites.insert(nickname.to_string());
    }

    /// No-op if the nickname was never invited.
    pub fn remove_invite(&mut self, nickname: &str) {
        self.invites.remove(nickname);
    }

    pub fn is_invited(&self, nickname: &str) -> bool {
        self.invites.contains(nickname)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn set_topic(&mut self, topic: &str) {
        self.topic = topic.to_string();
    }

    pub fn has_topic(&self) -> bool {
        !self.topic.is_empty()
    }

    pub fn is_invite_only(&self) -> bool {
        self.invite_only
    }

    pub fn set_invite_only(&mut self, on: bool) {
        self.invite_only = on;
    }

    pub fn is_topic_restricted(&self) -> bool {
        self.topic_restricted
    }

    pub fn set_topic_restricted(&mut self, on: bool) {
        self.topic_restricted = on;
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    pub fn set_key(&mut self, key: &str) {
        self.key = Some(key.to_string());
    }

    pub fn remove_key(&mut self) {
        self.key = None;
    }

    pub fn user_limit(&self) -> Option<usize> {
        self.user_limit
    }

    /// A limit of zero means unset.
    pub fn set_user_limit(&mut self, limit: usize) {
        self.user_limit = if limit > 0 { Some(limit) } else { None };
    }

    pub fn remove_user_limit(&mut self) {
        self.user_limit = None;
    }

    /// Space-separated nicknames in join order, operators prefixed with `@`.
    pub fn member_list(&self, registry: &Registry) -> String {
        self.member_list_without(registry, None)
    }

    fn member_list_without(&self, registry: &Registry, skip: Option<ConnId>) -> String {
        let mut out = String::new();
        for &m in &self.members {
            if Some(m) == skip {
                continue;
            }
            let Some(nick) = registry.nickname_of(m) else {
                continue;
            };
            if !out.is_empty() {
                out.push(' ');
            }
            if self.operators.contains(&m) {
                out.push('@');
            }
            out.push_str(&nick);
        }
        out
    }

    /// Active flags rendered as a `+`-prefixed string, fixed order i, t, k, l.
    pub fn modes(&self) -> String {
        let mut out = String::from("+");
        if self.invite_only {
            out.push('i');
        }
        if self.topic_restricted {
            out.push('t');
        }
        if self.key.is_some() {
            out.push('k');
        }
        if self.user_limit.is_some() {
            out.push('l');
        }
        out
    }
}
