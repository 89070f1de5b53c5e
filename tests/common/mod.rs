//! Integration test common infrastructure.
//!
//! Provides utilities for spawning in-process test servers, creating test
//! clients, and asserting on protocol line flows.

pub mod client;
pub mod server;

#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use server::TestServer;

/// The password every test server is configured with.
pub const TEST_PASSWORD: &str = "hunter2";
