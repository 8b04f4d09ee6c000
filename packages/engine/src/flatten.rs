//! # Instance Flattener
//!
//! Detaches component instances until none are reachable from the roots.
//!
//! Detaching can surface further instances (content nested inside the one
//! just detached gets new handles), so the flattener works in passes: collect,
//! detach everything that is an instance, repeat. It stops at the first pass
//! that detaches nothing, or at the pass cap.

use crate::collector::collect;
use crate::oracle::liveness;
use crate::outcome::{Outcome, Tally};
use crate::EngineError;
use serde::Serialize;
use stripout_scene::{NodeId, NodeType, SceneHost};
use tracing::{debug, info, instrument, warn};

/// Upper bound on flatten passes
pub const MAX_FLATTEN_PASSES: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenReport {
    pub detached: usize,
    pub passes: usize,
    pub skipped: usize,
    pub reached_fixed_point: bool,
}

pub struct Flattener<'a> {
    host: &'a dyn SceneHost,
    max_passes: usize,
}

impl<'a> Flattener<'a> {
    pub fn new(host: &'a dyn SceneHost) -> Self {
        Self {
            host,
            max_passes: MAX_FLATTEN_PASSES,
        }
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }

    /// Detach every reachable instance.
    ///
    /// A root that is itself an instance is replaced in `roots` by the
    /// handles of its detached content.
    #[instrument(skip(self, roots), fields(roots = roots.len()))]
    pub fn flatten(&self, roots: &mut Vec<NodeId>) -> Result<FlattenReport, EngineError> {
        let mut report = FlattenReport::default();
        let mut tally = Tally::default();

        while report.passes < self.max_passes {
            report.passes += 1;
            let nodes = collect(self.host, roots)?;
            debug!(pass = report.passes, nodes = nodes.len(), "flatten pass");

            let mut stuck = 0;
            let mut detached_this_pass = 0;
            for node in nodes {
                if !liveness(self.host, node)? {
                    continue;
                }
                let Outcome::Done(node_type) = tally.attempt("read node type", node, self.host.node_type(node))? else {
                    continue;
                };
                if node_type != NodeType::Instance || !liveness(self.host, node)? {
                    continue;
                }

                match tally.attempt("detach instance", node, self.host.detach_instance(node))? {
                    Outcome::Done(replacements) => {
                        debug!(%node, replacements = replacements.len(), "detached instance");
                        replace_root(roots, node, replacements);
                        detached_this_pass += 1;
                    }
                    // An instance removed under us no longer blocks the fixed point.
                    Outcome::Skipped => {
                        if liveness(self.host, node)? {
                            stuck += 1;
                        }
                    }
                }
            }

            report.detached += detached_this_pass;
            if detached_this_pass == 0 {
                if stuck == 0 {
                    report.reached_fixed_point = true;
                } else {
                    warn!(remaining = stuck, "no instance could be detached");
                }
                break;
            }
        }

        report.skipped = tally.skipped;
        if report.reached_fixed_point {
            info!(detached = report.detached, passes = report.passes, "instances flattened");
        } else if report.passes == self.max_passes {
            warn!(
                detached = report.detached,
                passes = report.passes,
                "instance flattening stopped at the pass cap"
            );
        }
        Ok(report)
    }
}

fn replace_root(roots: &mut Vec<NodeId>, detached: NodeId, replacements: Vec<NodeId>) {
    if let Some(position) = roots.iter().position(|root| *root == detached) {
        roots.splice(position..=position, replacements);
    }
}
