//! # Token Unlinker
//!
//! Replaces every variable binding on a node with the literal it currently
//! resolves to. Text nodes go through three extra passes before the generic
//! ones, always in this order:
//!
//! 1. font string variables (`fontFamily`, `fontStyle`)
//! 2. whole-node text properties
//! 3. per-character range bindings
//! 4. generic layout and geometry properties
//! 5. nested markers inside fills, strokes and effects
//!
//! ## Invariant
//!
//! A binding is never cleared without its literal being written back in the
//! same synchronous step, after a fresh liveness check. Nothing suspends
//! between the check, the unbind and the write.

mod fonts;
mod generic;
mod paints;
mod resolve;
mod text;

pub use generic::GENERIC_FIELDS;
pub use paints::PAINT_FIELDS;
pub use resolve::resolve_string_variable;
pub use text::{RANGE_TEXT_FIELDS, WHOLE_TEXT_FIELDS};

use crate::oracle::{ensure_live, liveness};
use crate::outcome::{Outcome, Tally};
use crate::EngineError;
use std::ops::Range;
use stripout_scene::{Field, HostResult, NodeId, NodeType, SceneHost, Value};
use tracing::{info, instrument};

pub struct TokenUnlinker<'a> {
    host: &'a dyn SceneHost,
}

impl<'a> TokenUnlinker<'a> {
    pub fn new(host: &'a dyn SceneHost) -> Self {
        Self { host }
    }

    /// Unlink every binding on every live node. `applied` counts unlink operations.
    #[instrument(skip(self, nodes), fields(nodes = nodes.len()))]
    pub async fn unlink(&self, nodes: &[NodeId]) -> Result<Tally, EngineError> {
        let host = self.host;
        let mut tally = Tally::default();

        for &node in nodes {
            if !liveness(host, node)? {
                continue;
            }
            let Outcome::Done(node_type) = tally.attempt("read node type", node, host.node_type(node))? else {
                continue;
            };
            let is_text = node_type == NodeType::Text;

            if is_text {
                fonts::unlink_font_strings(host, &mut tally, node).await?;
                text::unlink_text_properties(host, &mut tally, node).await?;
                text::unlink_character_ranges(host, &mut tally, node).await?;
                if !liveness(host, node)? {
                    continue;
                }
            }
            generic::unlink_generic(host, &mut tally, node)?;
            paints::unlink_paints(host, &mut tally, node, is_text).await?;
        }

        info!(unlinked = tally.applied, skipped = tally.skipped, "tokens unlinked");
        Ok(tally)
    }
}

/// Clear the binding on `bound` and write `value` to `field`
fn rebind_as(host: &dyn SceneHost, node: NodeId, bound: Field, field: Field, value: Value) -> HostResult<()> {
    ensure_live(host, node)?;
    host.clear_binding(node, bound)?;
    host.set_property(node, field, value)
}

fn rebind(host: &dyn SceneHost, node: NodeId, field: Field, value: Value) -> HostResult<()> {
    rebind_as(host, node, field, field, value)
}

/// Range form of [`rebind_as`]
fn rebind_range_as(
    host: &dyn SceneHost,
    node: NodeId,
    range: Range<usize>,
    bound: Field,
    field: Field,
    value: Value,
) -> HostResult<()> {
    ensure_live(host, node)?;
    host.clear_range_binding(node, range.clone(), bound)?;
    host.set_range_property(node, range, field, value)
}
