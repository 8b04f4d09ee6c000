//! # Style Stripper
//!
//! Drops every shared-style reference while keeping the values the style
//! applied. Each slot is handled on its own; a failure on one slot never
//! stops the next.
//!
//! The text slot is special: the host only clears it through an async call,
//! and only once every font of the node is loaded.

use crate::fonts::load_node_fonts;
use crate::oracle::{ensure_live, liveness};
use crate::outcome::{Outcome, Tally};
use crate::EngineError;
use stripout_scene::{NodeId, NodeType, SceneHost, StyleSlot};
use tracing::{debug, info, instrument};

pub struct StyleStripper<'a> {
    host: &'a dyn SceneHost,
}

impl<'a> StyleStripper<'a> {
    pub fn new(host: &'a dyn SceneHost) -> Self {
        Self { host }
    }

    /// Clear every set style slot on every live node. `applied` counts slots cleared.
    #[instrument(skip(self, nodes), fields(nodes = nodes.len()))]
    pub async fn strip(&self, nodes: &[NodeId]) -> Result<Tally, EngineError> {
        let mut tally = Tally::default();

        for &node in nodes {
            if !liveness(self.host, node)? {
                continue;
            }
            let Outcome::Done(node_type) = tally.attempt("read node type", node, self.host.node_type(node))? else {
                continue;
            };

            for slot in StyleSlot::ALL {
                if slot == StyleSlot::Text && node_type != NodeType::Text {
                    continue;
                }
                self.strip_slot(node, slot, &mut tally).await?;
            }
        }

        info!(removed = tally.applied, skipped = tally.skipped, "styles removed");
        Ok(tally)
    }

    async fn strip_slot(&self, node: NodeId, slot: StyleSlot, tally: &mut Tally) -> Result<(), EngineError> {
        let Outcome::Done(Some(style)) = tally.attempt("read style", node, self.host.style_id(node, slot))? else {
            return Ok(());
        };
        debug!(%node, %slot, %style, "removing style");

        if slot != StyleSlot::Text {
            let cleared = ensure_live(self.host, node).and_then(|()| self.host.clear_style(node, slot));
            tally.record("clear style", node, cleared)?;
            return Ok(());
        }

        if !load_node_fonts(self.host, tally, node).await? {
            return Ok(());
        }
        if tally.attempt("revalidate", node, ensure_live(self.host, node))?.is_skipped() {
            return Ok(());
        }
        let cleared = self.host.clear_text_style(node).await;
        tally.record("clear text style", node, cleared)?;
        Ok(())
    }
}
