//! lanternd - Lantern chat daemon
//!
//! A small line-protocol chat server: clients authenticate with
//! PASS/NICK/USER, join named channels, and exchange messages that are
//! fanned out to the other members. One tokio task per connection; shared
//! state lives in the [`state::Registry`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod network;
pub mod reply;
pub mod state;

pub use config::Config;
pub use network::Server;
pub use state::Registry;
