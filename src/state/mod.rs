//! Shared server state.
//!
//! The [`Registry`] is the sole owner of live sessions and channels. With
//! one tokio task per connection these maps are shared-mutable, so sessions
//! live in a `DashMap` and each channel sits behind its own mutex; outbound
//! delivery goes through per-connection unbounded queues, so no lock is ever
//! held across a blocking socket write.
//!
//! Lock order: channel mutex before session map, never the reverse.

mod channel;
mod session;

pub use channel::Channel;
pub use session::{LineBuffer, Session};

use dashmap::DashMap;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use crate::reply;

/// Unique handle for one live connection.
pub type ConnId = u64;

/// Owner of all live sessions and channels.
pub struct Registry {
    pub server_name: String,
    password: String,
    /// All live sessions, keyed by connection handle.
    pub sessions: DashMap<ConnId, Session>,
    channels: DashMap<String, Arc<Mutex<Channel>>>,
    next_id: AtomicU64,
    /// Process-wide stop flag: set once, observed by the accept loop and by
    /// every connection task.
    shutdown: broadcast::Sender<()>,
}

impl Registry {
    pub fn new(server_name: &str, password: &str) -> Self {
        let (shutdown, _) = broadcast::channel(8);
        Self {
            server_name: server_name.to_string(),
            password: password.to_string(),
            sessions: DashMap::new(),
            channels: DashMap::new(),
            next_id: AtomicU64::new(1),
            shutdown,
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown.subscribe()
    }

    pub fn trigger_shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    /// Create a session for a freshly accepted connection.
    ///
    /// Returns the new handle and the receiving end of its outbound queue,
    /// which the connection's writer task drains.
    pub fn register_session(&self, addr: SocketAddr) -> (ConnId, mpsc::UnboundedReceiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.sessions.insert(id, Session::new(id, addr, tx));
        debug!(id, %addr, "session registered");
        (id, rx)
    }

    pub fn contains(&self, id: ConnId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn registered(&self, id: ConnId) -> bool {
        self.sessions.get(&id).is_some_and(|s| s.registered())
    }

    pub fn nickname_of(&self, id: ConnId) -> Option<String> {
        self.sessions.get(&id).and_then(|s| s.nickname.clone())
    }

    /// Queue a raw line for one connection. Fire-and-forget: a gone or
    /// closed session is ignored.
    pub fn send_to(&self, id: ConnId, line: &str) {
        if let Some(session) = self.sessions.get(&id) {
            let _ = session.tx.send(format!("{line}\r\n"));
        }
    }

    /// Linear scan over live sessions.
    pub fn is_nickname_unique(&self, nickname: &str) -> bool {
        !self
            .sessions
            .iter()
            .any(|s| s.nickname.as_deref() == Some(nickname))
    }

    pub fn find_by_nickname(&self, nickname: &str) -> Option<ConnId> {
        self.sessions
            .iter()
            .find(|s| s.nickname.as_deref() == Some(nickname))
            .map(|s| s.id)
    }

    /// Remove a session and drop its outbound queue, which ends the
    /// connection's writer task once the queue drains.
    pub fn remove_session(&self, id: ConnId) {
        if let Some((_, session)) = self.sessions.remove(&id) {
            debug!(id, addr = %session.addr, "session released");
        }
    }

    // ------------------------------------------------------------------
    // Channels
    // ------------------------------------------------------------------

    /// Fetch a channel, creating it if absent. One map entry acquisition,
    /// so two racing first joins share a single channel object.
    pub fn get_or_create_channel(&self, name: &str) -> Arc<Mutex<Channel>> {
        Arc::clone(
            &self
                .channels
                .entry(name.to_string())
                .or_insert_with(|| {
                    info!(channel = %name, "channel created");
                    Arc::new(Mutex::new(Channel::new(name)))
                }),
        )
    }

    pub fn get_channel(&self, name: &str) -> Option<Arc<Mutex<Channel>>> {
        self.channels.get(name).map(|c| Arc::clone(&c))
    }

    pub fn delete_channel(&self, name: &str) {
        if self.channels.remove(name).is_some() {
            info!(channel = %name, "channel deleted");
        }
    }

    /// Snapshot of channel names, for disconnect cleanup and LIST.
    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.key().clone()).collect()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// The disconnect sequence, shared by QUIT and by read failure.
    ///
    /// Ordering is the contract: broadcast the QUIT notice to each channel
    /// the client belongs to (excluding the client), remove the member
    /// (operator succession runs here), delete any channel that becomes
    /// empty, echo the notice to the disconnecting client, then release the
    /// session.
    pub fn disconnect(&self, id: ConnId, reason: &str) {
        let Some(nick) = self.nickname_of(id) else {
            // Never authenticated: no memberships to clean up.
            self.remove_session(id);
            return;
        };

        let quit_line = format!(":{nick} QUIT :{reason}");
        for name in self.channel_names() {
            if let Some(channel) = self.get_channel(&name) {
                let mut chan = channel.lock();
                if !chan.is_member(id) {
                    continue;
                }
                chan.broadcast(self, &quit_line, Some(id));
                chan.remove_member(self, id);
                let empty = chan.member_count() == 0;
                drop(chan);
                if empty {
                    self.delete_channel(&name);
                }
            }
        }

        self.send_to(id, &quit_line);
        self.remove_session(id);
        info!(id, nick = %nick, "client disconnected");
    }

    /// Shutdown teardown: notify every live session, then release all
    /// sessions and channels. Safe with zero live connections.
    pub fn close(&self) {
        let notice = reply::notice(&self.server_name, ":Server shutting down");
        let ids: Vec<ConnId> = self.sessions.iter().map(|s| *s.key()).collect();
        for id in ids {
            self.send_to(id, &notice);
        }
        self.sessions.clear();
        self.channels.clear();
        info!("registry closed");
    }
}
