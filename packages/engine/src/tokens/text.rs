//! Text-property bindings, whole-node and per character.

use super::{rebind, rebind_range_as};
use crate::fonts::load_node_fonts;
use crate::oracle::liveness;
use crate::outcome::{Outcome, Tally};
use crate::EngineError;
use stripout_scene::{BindingMarkers, Field, MaybeMixed, NodeId, SceneHost, Value};
use tracing::debug;

/// Text properties unlinked on the node as a whole
pub const WHOLE_TEXT_FIELDS: [Field; 5] = [
    Field::FontSize,
    Field::LineHeight,
    Field::LetterSpacing,
    Field::ParagraphSpacing,
    Field::FontName,
];

/// Text properties unlinked one character at a time
pub const RANGE_TEXT_FIELDS: [Field; 5] = [
    Field::FontSize,
    Field::LineHeight,
    Field::LetterSpacing,
    Field::FontName,
    Field::Fills,
];

pub(super) async fn unlink_text_properties(
    host: &dyn SceneHost,
    tally: &mut Tally,
    node: NodeId,
) -> Result<(), EngineError> {
    let Outcome::Done(bindings) = tally.attempt("read bindings", node, host.bound_variables(node))? else {
        return Ok(());
    };
    let bound: Vec<Field> = WHOLE_TEXT_FIELDS
        .into_iter()
        .filter(|field| bindings.contains_key(field))
        .collect();
    if bound.is_empty() || !load_node_fonts(host, tally, node).await? {
        return Ok(());
    }

    for field in bound {
        let Outcome::Done(value) = tally.attempt("read property", node, host.property(node, field))? else {
            continue;
        };
        match value {
            Some(MaybeMixed::Value(value)) => {
                tally.record("unbind text property", node, rebind(host, node, field, value))?;
            }
            Some(MaybeMixed::Mixed) => debug!(%node, %field, "mixed value left to the per-character pass"),
            None => {}
        }
    }
    Ok(())
}

/// Scans one character at a time. Each character's value is read and
/// written back independently, so the result does not depend on how
/// neighbouring characters are styled.
pub(super) async fn unlink_character_ranges(
    host: &dyn SceneHost,
    tally: &mut Tally,
    node: NodeId,
) -> Result<(), EngineError> {
    let Outcome::Done(count) = tally.attempt("read character count", node, host.character_count(node))? else {
        return Ok(());
    };
    if count == 0 || !load_node_fonts(host, tally, node).await? {
        return Ok(());
    }

    for index in 0..count {
        let range = index..index + 1;
        let bindings = host.range_bound_variables(node, range.clone());
        let Outcome::Done(bindings) = tally.attempt("read range bindings", node, bindings)? else {
            if !liveness(host, node)? {
                debug!(%node, index, count, "node gone, abandoning character scan");
                break;
            }
            continue;
        };

        for field in RANGE_TEXT_FIELDS {
            if !bindings.contains_key(&field) {
                continue;
            }
            let current = host.range_property(node, range.clone(), field);
            let Outcome::Done(MaybeMixed::Value(value)) = tally.attempt("read range property", node, current)? else {
                continue;
            };
            if let Value::Font(font) = &value {
                let loaded = host.load_font(font).await;
                if tally.attempt("load font", node, loaded)?.is_skipped() {
                    continue;
                }
            }

            let literal = value.without_bindings();
            let result = rebind_range_as(host, node, range.clone(), field, field, literal);
            tally.record("unbind range property", node, result)?;
        }
    }
    Ok(())
}
