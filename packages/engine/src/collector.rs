//! # Tree Collector
//!
//! Flattens the subtrees under a set of roots into a pre-order list of live
//! handles. Uses an explicit work stack so deep documents cannot overflow.
//!
//! The list is a snapshot. Every phase that can change the tree shape is
//! followed by a fresh collection rather than patching an old list.

use crate::oracle::liveness;
use crate::EngineError;
use stripout_scene::{NodeId, SceneHost};
use tracing::{debug, trace};

/// Pre-order list of every live node reachable from `roots`.
///
/// Dead roots and dead descendants are skipped silently.
pub fn collect(host: &dyn SceneHost, roots: &[NodeId]) -> Result<Vec<NodeId>, EngineError> {
    let mut nodes = Vec::new();
    let mut stack: Vec<NodeId> = roots.iter().rev().copied().collect();

    while let Some(node) = stack.pop() {
        if !liveness(host, node)? {
            trace!(%node, "skipping invalid node");
            continue;
        }
        nodes.push(node);

        match host.children(node) {
            Ok(Some(children)) => stack.extend(children.into_iter().rev()),
            Ok(None) => {}
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => debug!(%node, error = %err, "could not read children"),
        }
    }

    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stripout_scene::{FontName, MemoryScene};

    #[test]
    fn test_collects_in_pre_order() {
        let scene = MemoryScene::new();
        let root = scene.add_frame(scene.page(), "Root").unwrap();
        let a = scene.add_frame(root, "A").unwrap();
        let a1 = scene.add_rectangle(a, "A1").unwrap();
        let b = scene
            .add_text(root, "B", "text", FontName::new("Inter", "Regular"), 12.0)
            .unwrap();
        let other = scene.add_rectangle(scene.page(), "Other").unwrap();

        let nodes = collect(&scene, &[root, other]).unwrap();
        assert_eq!(nodes, vec![root, a, a1, b, other]);
    }

    #[test]
    fn test_skips_dead_roots_and_descendants() {
        let scene = MemoryScene::new();
        let root = scene.add_frame(scene.page(), "Root").unwrap();
        let gone = scene.add_frame(root, "Gone").unwrap();
        scene.add_rectangle(gone, "Inner").unwrap();
        let dead_root = scene.add_frame(scene.page(), "Dead").unwrap();

        scene.remove_node(gone).unwrap();
        scene.remove_node(dead_root).unwrap();

        assert_eq!(collect(&scene, &[dead_root, root]).unwrap(), vec![root]);
    }

    #[test]
    fn test_empty_roots_collect_nothing() {
        let scene = MemoryScene::new();
        assert!(collect(&scene, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_deep_tree_does_not_recurse() {
        let scene = MemoryScene::new();
        let root = scene.add_frame(scene.page(), "Root").unwrap();
        let mut parent = root;
        for depth in 0..5_000 {
            parent = scene.add_frame(parent, &format!("Level {}", depth)).unwrap();
        }

        assert_eq!(collect(&scene, &[root]).unwrap().len(), 5_001);
    }
}
