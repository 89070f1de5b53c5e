//! Listener that accepts incoming connections and spawns per-connection
//! tasks.

mod connection;

use crate::config::Config;
use crate::state::Registry;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// The server: one listening socket plus the shared registry.
pub struct Server {
    listener: TcpListener,
    registry: Arc<Registry>,
}

impl Server {
    /// Bind the listening socket. Failures here are fatal at startup.
    pub async fn bind(config: Config) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(config.listen.address).await?;
        let registry = Arc::new(Registry::new(
            &config.server.name,
            &config.server.password,
        ));
        info!(addr = %listener.local_addr()?, "listener bound");
        Ok(Self { listener, registry })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Accept connections until the stop flag is observed, then drain:
    /// notify every live session, release all state, and return.
    ///
    /// Per-connection accept failures are logged and skipped; they never
    /// abort the loop.
    pub async fn run(self) -> anyhow::Result<()> {
        let mut shutdown_rx = self.registry.subscribe_shutdown();

        loop {
            tokio::select! {
                result = self.listener.accept() => match result {
                    Ok((stream, addr)) => {
                        info!(%addr, "connection accepted");
                        let registry = Arc::clone(&self.registry);
                        tokio::spawn(async move {
                            connection::serve(registry, stream, addr).await;
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                    }
                },
                _ = shutdown_rx.recv() => break,
            }
        }

        self.registry.close();
        info!("server shut down");
        Ok(())
    }
}
