//! Operator commands.

use crate::error::HandlerResult;
use crate::state::{ConnId, Registry};
use tracing::info;

/// Request orderly shutdown. The accept loop observes the stop flag and
/// performs the drain; this handler only raises it.
pub fn die(registry: &Registry, id: ConnId) -> HandlerResult {
    info!(id, "shutdown requested");
    registry.trigger_shutdown();
    Ok(())
}
