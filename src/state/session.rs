//! Per-connection session state and line framing.

use bytes::BytesMut;
use std::net::SocketAddr;
use tokio::sync::mpsc;

use super::ConnId;

/// Server-side state for one live connection.
///
/// Sessions carry no behavior beyond accessors; the auth flags are mutated by
/// the PASS/NICK/USER handlers and the whole record is destroyed by the
/// disconnect sequence.
#[derive(Debug)]
pub struct Session {
    pub id: ConnId,
    pub addr: SocketAddr,
    /// Outbound line queue, drained by the connection's writer task.
    pub tx: mpsc::UnboundedSender<String>,
    pub has_password: bool,
    pub has_nickname: bool,
    pub has_username: bool,
    pub nickname: Option<String>,
    pub username: Option<String>,
    /// Whether the 001 welcome has been emitted.
    pub welcomed: bool,
}

impl Session {
    pub fn new(id: ConnId, addr: SocketAddr, tx: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id,
            addr,
            tx,
            has_password: false,
            has_nickname: false,
            has_username: false,
            nickname: None,
            username: None,
            welcomed: false,
        }
    }

    /// All three auth flags are set; gated commands are now accepted.
    pub fn registered(&self) -> bool {
        self.has_password && self.has_nickname && self.has_username
    }
}

/// Accumulates received bytes and reframes them into complete lines.
///
/// `\n` ends a line; a `\r` immediately before it is stripped. Bytes after
/// the last terminator stay buffered for the next read, so framing is
/// independent of read-chunk boundaries. Empty lines are dropped.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: BytesMut,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes to the accumulator.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Extract the next complete line, if any.
    pub fn next_line(&mut self) -> Option<String> {
        loop {
            let pos = self.buf.iter().position(|&b| b == b'\n')?;
            let mut line = self.buf.split_to(pos + 1);
            line.truncate(pos);
            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }
            if line.is_empty() {
                continue;
            }
            return Some(String::from_utf8_lossy(&line).into_owned());
        }
    }
}
