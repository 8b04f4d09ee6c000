//! Font string variables.
//!
//! `fontFamily` and `fontStyle` bindings hold strings, but the host only
//! accepts a whole font name as the literal. Unlinking clears the string
//! binding and writes back the font name currently in effect.

use super::{rebind_as, rebind_range_as, resolve_string_variable};
use crate::outcome::{Outcome, Tally};
use crate::EngineError;
use stripout_scene::{Field, FontName, MaybeMixed, NodeId, SceneHost, Value};
use tracing::{debug, info};

pub(super) const FONT_STRING_FIELDS: [Field; 2] = [Field::FontFamily, Field::FontStyle];

pub(super) async fn unlink_font_strings(
    host: &dyn SceneHost,
    tally: &mut Tally,
    node: NodeId,
) -> Result<(), EngineError> {
    for field in FONT_STRING_FIELDS {
        let Outcome::Done(bindings) = tally.attempt("read bindings", node, host.bound_variables(node))? else {
            return Ok(());
        };
        let Some(alias) = bindings.get(&field) else {
            continue;
        };
        if let Some(value) = resolve_string_variable(host, &alias.id) {
            info!(%node, %field, variable = %alias.id, value = %value, "unlinking font string variable");
        }

        let Outcome::Done(font) = tally.attempt("read font", node, host.property(node, Field::FontName))? else {
            continue;
        };
        match font {
            Some(MaybeMixed::Value(Value::Font(font))) => {
                let loaded = host.load_font(&font).await;
                if tally.attempt("load font", node, loaded)?.is_skipped() {
                    continue;
                }
                let result = rebind_as(host, node, field, Field::FontName, Value::Font(font));
                tally.record("unbind font string", node, result)?;
            }
            Some(MaybeMixed::Mixed) => unlink_font_runs(host, tally, node, field).await?,
            _ => {}
        }
    }
    Ok(())
}

/// Walk maximal runs of characters sharing one font, unlinking each run once
async fn unlink_font_runs(
    host: &dyn SceneHost,
    tally: &mut Tally,
    node: NodeId,
    field: Field,
) -> Result<(), EngineError> {
    let Outcome::Done(count) = tally.attempt("read character count", node, host.character_count(node))? else {
        return Ok(());
    };

    let mut start = 0;
    while start < count {
        let first = host.range_property(node, start..start + 1, Field::FontName);
        let Outcome::Done(MaybeMixed::Value(Value::Font(font))) = tally.attempt("read range font", node, first)? else {
            start += 1;
            continue;
        };
        let end = run_end(host, node, start, count, &font);
        debug!(%node, %field, start, end, font = %font, "font run");

        let loaded = host.load_font(&font).await;
        if tally.attempt("load font", node, loaded)?.is_skipped() {
            start = end;
            continue;
        }

        let bindings = host.range_bound_variables(node, start..end);
        if let Outcome::Done(bindings) = tally.attempt("read range bindings", node, bindings)? {
            if bindings.contains_key(&field) {
                let result = rebind_range_as(host, node, start..end, field, Field::FontName, Value::Font(font));
                tally.record("unbind font string range", node, result)?;
            }
        }
        start = end;
    }
    Ok(())
}

/// End (exclusive) of the run of characters starting at `start` that use `font`
fn run_end(host: &dyn SceneHost, node: NodeId, start: usize, count: usize, font: &FontName) -> usize {
    let mut end = start + 1;
    while end < count {
        match host.range_property(node, end..end + 1, Field::FontName) {
            Ok(MaybeMixed::Value(Value::Font(next))) if next == *font => end += 1,
            _ => break,
        }
    }
    end
}
