//! # Validity Oracle
//!
//! A handle is live when the host still knows it, it is not removed, and it
//! is attached to a parent. Detached nodes count as dead even if the host
//! would still answer reads on them.
//!
//! Liveness is never cached. Callers ask again right before every mutation.

use stripout_scene::{HostError, NodeId, SceneHost};
use tracing::trace;

/// The removal flag is read last; it is the answer closest to the caller's next mutation.
fn check_live(host: &dyn SceneHost, node: NodeId) -> Result<bool, HostError> {
    if host.parent(node)?.is_none() {
        return Ok(false);
    }
    Ok(!host.is_removed(node)?)
}

/// Liveness of `node`. Non-fatal host errors read as "not live"; only fatal
/// errors are returned.
pub fn liveness(host: &dyn SceneHost, node: NodeId) -> Result<bool, HostError> {
    match check_live(host, node) {
        Ok(live) => Ok(live),
        Err(err) if err.is_fatal() => Err(err),
        Err(err) => {
            trace!(%node, error = %err, "handle treated as invalid");
            Ok(false)
        }
    }
}

/// Whether `node` can be read or mutated right now. Never fails.
pub fn is_valid(host: &dyn SceneHost, node: NodeId) -> bool {
    liveness(host, node).unwrap_or(false)
}

/// Guard run immediately before a mutation
pub fn ensure_live(host: &dyn SceneHost, node: NodeId) -> Result<(), HostError> {
    if liveness(host, node)? {
        Ok(())
    } else {
        Err(HostError::Stale(node))
    }
}
