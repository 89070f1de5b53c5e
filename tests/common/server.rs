//! Test server management.
//!
//! Spawns in-process lanternd instances for integration testing. Running
//! inside the test's runtime keeps startup instant and gives tests a
//! handle on the registry for shutdown.

use super::TEST_PASSWORD;
use super::client::TestClient;
use lanternd::config::{Config, ListenConfig, ServerConfig};
use lanternd::state::Registry;
use lanternd::Server;
use std::net::SocketAddr;
use std::sync::Arc;

/// A test server instance.
pub struct TestServer {
    address: SocketAddr,
    registry: Arc<Registry>,
}

impl TestServer {
    /// Spawn a new test server on an ephemeral port.
    pub async fn spawn() -> anyhow::Result<Self> {
        let config = Config {
            server: ServerConfig {
                name: "test.server".to_string(),
                password: TEST_PASSWORD.to_string(),
            },
            listen: ListenConfig {
                address: "127.0.0.1:0".parse()?,
            },
        };

        let server = Server::bind(config).await?;
        let address = server.local_addr()?;
        let registry = server.registry();
        tokio::spawn(server.run());

        Ok(Self { address, registry })
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Connect a client and drive it through full registration.
    pub async fn connect(&self, nick: &str) -> anyhow::Result<TestClient> {
        let mut client = TestClient::connect(&self.address.to_string(), nick).await?;
        client.register(TEST_PASSWORD).await?;
        Ok(client)
    }

    /// Connect a raw client without registering.
    #[allow(dead_code)]
    pub async fn connect_raw(&self, nick: &str) -> anyhow::Result<TestClient> {
        TestClient::connect(&self.address.to_string(), nick).await
    }

    /// Raise the stop flag, as Ctrl-C or DIE would.
    #[allow(dead_code)]
    pub fn shutdown(&self) {
        self.registry.trigger_shutdown();
    }
}
