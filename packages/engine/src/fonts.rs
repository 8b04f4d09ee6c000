//! Font loading for text mutations.
//!
//! The host refuses text writes until every font involved is loaded. A node
//! with one font needs one load; a node with mixed fonts needs every
//! distinct font across its characters.

use crate::outcome::{Outcome, Tally};
use crate::EngineError;
use stripout_scene::{Field, FontName, MaybeMixed, NodeId, SceneHost, Value};

/// Distinct fonts of a text node, in order of first use
pub(crate) fn fonts_used(
    host: &dyn SceneHost,
    tally: &mut Tally,
    node: NodeId,
) -> Result<Outcome<Vec<FontName>>, EngineError> {
    let Outcome::Done(font) = tally.attempt("read font", node, host.property(node, Field::FontName))? else {
        return Ok(Outcome::Skipped);
    };

    match font {
        Some(MaybeMixed::Value(Value::Font(font))) => Ok(Outcome::Done(vec![font])),
        Some(MaybeMixed::Mixed) => {
            let Outcome::Done(count) = tally.attempt("read character count", node, host.character_count(node))? else {
                return Ok(Outcome::Skipped);
            };

            let mut fonts: Vec<FontName> = Vec::new();
            for index in 0..count {
                let range_font = host.range_property(node, index..index + 1, Field::FontName);
                if let Outcome::Done(MaybeMixed::Value(Value::Font(font))) =
                    tally.attempt("read range font", node, range_font)?
                {
                    if !fonts.contains(&font) {
                        fonts.push(font);
                    }
                }
            }
            Ok(Outcome::Done(fonts))
        }
        _ => Ok(Outcome::Done(Vec::new())),
    }
}

/// Load every font of `node`. False if any could not be loaded.
pub(crate) async fn load_node_fonts(
    host: &dyn SceneHost,
    tally: &mut Tally,
    node: NodeId,
) -> Result<bool, EngineError> {
    let Outcome::Done(fonts) = fonts_used(host, tally, node)? else {
        return Ok(false);
    };

    let mut all_loaded = true;
    for font in &fonts {
        let loaded = host.load_font(font).await;
        if tally.attempt("load font", node, loaded)?.is_skipped() {
            all_loaded = false;
        }
    }
    Ok(all_loaded)
}
