//! Per-connection task: bounded reads, line framing, dispatch, teardown.

use crate::error::HandlerError;
use crate::handlers;
use crate::state::{LineBuffer, Registry};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, instrument, warn};

/// Protocol line-length ceiling; one bounded read per readiness.
const READ_BUFFER_SIZE: usize = 512;

/// Drive one client connection to completion.
///
/// The read half feeds the session's line buffer; each complete line goes
/// through the dispatcher. The write half is a separate task draining the
/// session's outbound queue, so any component can send to this connection
/// without blocking. A zero-byte read or read error is the normal
/// termination signal and triggers the disconnect sequence; nothing from
/// per-connection handling escapes as an unhandled failure.
#[instrument(skip(registry, stream), name = "connection", fields(%addr))]
pub(crate) async fn serve(registry: Arc<Registry>, stream: TcpStream, addr: SocketAddr) {
    let (id, mut outgoing_rx) = registry.register_session(addr);
    let (mut read_half, mut write_half) = stream.into_split();

    let writer = tokio::spawn(async move {
        while let Some(line) = outgoing_rx.recv().await {
            if write_half.write_all(line.as_bytes()).await.is_err() {
                break;
            }
        }
        let _ = write_half.shutdown().await;
    });

    let mut shutdown_rx = registry.subscribe_shutdown();
    let mut buffer = LineBuffer::new();
    let mut read_buf = [0u8; READ_BUFFER_SIZE];
    let mut draining = false;
    info!(id, "client connected");

    'outer: loop {
        tokio::select! {
            result = read_half.read(&mut read_buf) => {
                let n = match result {
                    Ok(0) => {
                        registry.disconnect(id, "Client disconnected");
                        break;
                    }
                    Err(e) => {
                        debug!(id, error = %e, "read error");
                        registry.disconnect(id, "Client disconnected");
                        break;
                    }
                    Ok(n) => n,
                };

                buffer.push(&read_buf[..n]);
                while let Some(line) = buffer.next_line() {
                    debug!(id, %line, "received line");
                    if let Err(e) = handlers::dispatch(&registry, id, &line) {
                        match e {
                            HandlerError::Quit(reason) => {
                                registry.disconnect(
                                    id,
                                    reason.as_deref().unwrap_or("Client Quit"),
                                );
                            }
                            other => {
                                if let Some(reply) = other.to_reply(&registry.server_name) {
                                    registry.send_to(id, &reply);
                                }
                            }
                        }
                    }
                    // A handler may have removed this session (QUIT, DIE);
                    // re-resolve before touching further buffered lines.
                    if !registry.contains(id) {
                        break 'outer;
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                // Registry teardown sends the shutdown notice and releases
                // the session; this task only stops reading. Removing the
                // session here would race the notice.
                draining = true;
                break;
            }
        }
    }

    if !draining && registry.contains(id) {
        registry.remove_session(id);
    }
    if let Err(e) = writer.await {
        warn!(id, error = %e, "writer task failed");
    }
    info!(id, "connection closed");
}
