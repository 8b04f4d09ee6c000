//! Layout and geometry bindings shared by every node kind.

use super::rebind;
use crate::outcome::{Outcome, Tally};
use crate::EngineError;
use stripout_scene::{Field, MaybeMixed, NodeId, SceneHost};

pub const GENERIC_FIELDS: [Field; 20] = [
    Field::Width,
    Field::Height,
    Field::MinWidth,
    Field::MaxWidth,
    Field::MinHeight,
    Field::MaxHeight,
    Field::Opacity,
    Field::CornerRadius,
    Field::TopLeftRadius,
    Field::TopRightRadius,
    Field::BottomLeftRadius,
    Field::BottomRightRadius,
    Field::ItemSpacing,
    Field::PaddingLeft,
    Field::PaddingRight,
    Field::PaddingTop,
    Field::PaddingBottom,
    Field::LayoutAlign,
    Field::LayoutGrow,
    Field::LayoutPositioning,
];

/// Bound fields whose value is concrete get unbound and rewritten; others are left.
pub(super) fn unlink_generic(host: &dyn SceneHost, tally: &mut Tally, node: NodeId) -> Result<(), EngineError> {
    let Outcome::Done(bindings) = tally.attempt("read bindings", node, host.bound_variables(node))? else {
        return Ok(());
    };

    for field in GENERIC_FIELDS {
        if !bindings.contains_key(&field) {
            continue;
        }
        let current = host.property(node, field);
        let Outcome::Done(Some(MaybeMixed::Value(value))) = tally.attempt("read property", node, current)? else {
            continue;
        };
        tally.record("unbind property", node, rebind(host, node, field, value))?;
    }
    Ok(())
}
