//! Nested binding markers inside paint and effect lists.
//!
//! These bindings live on the list entries rather than on the node, so
//! there is nothing to unbind: the list is rewritten as a marker-free copy.

use crate::fonts::load_node_fonts;
use crate::oracle::ensure_live;
use crate::outcome::{Outcome, Tally};
use crate::EngineError;
use stripout_scene::{BindingMarkers, Field, MaybeMixed, NodeId, SceneHost};
use tracing::debug;

pub const PAINT_FIELDS: [Field; 3] = [Field::Fills, Field::Strokes, Field::Effects];

pub(super) async fn unlink_paints(
    host: &dyn SceneHost,
    tally: &mut Tally,
    node: NodeId,
    is_text: bool,
) -> Result<(), EngineError> {
    for field in PAINT_FIELDS {
        let current = host.property(node, field);
        let Outcome::Done(Some(MaybeMixed::Value(value))) = tally.attempt("read paints", node, current)? else {
            continue;
        };
        if !value.has_bindings() {
            continue;
        }
        if is_text && field == Field::Fills && !load_node_fonts(host, tally, node).await? {
            continue;
        }

        debug!(%node, %field, "rewriting without nested bindings");
        let literal = value.without_bindings();
        let result = ensure_live(host, node).and_then(|()| host.set_property(node, field, literal));
        tally.record("strip nested bindings", node, result)?;
    }
    Ok(())
}
