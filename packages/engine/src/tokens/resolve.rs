//! Variable value lookup, used for diagnostics only.

use stripout_scene::{SceneHost, VariableId, VariableType, VariableValue};
use tracing::debug;

/// Value of a STRING variable in the first mode of its collection.
///
/// Returns `None` for unknown or non-string variables and on any host error.
pub fn resolve_string_variable(host: &dyn SceneHost, id: &VariableId) -> Option<String> {
    let variable = match host.variable(id) {
        Ok(variable) => variable?,
        Err(err) => {
            debug!(variable = %id, error = %err, "could not read variable");
            return None;
        }
    };
    if variable.resolved_type != VariableType::String {
        return None;
    }

    let collection = match host.variable_collection(&variable.variable_collection_id) {
        Ok(collection) => collection?,
        Err(err) => {
            debug!(variable = %id, error = %err, "could not read variable collection");
            return None;
        }
    };
    let mode = collection.default_mode()?;

    match variable.value_for_mode(&mode.mode_id)? {
        VariableValue::String(value) => Some(value.clone()),
        _ => None,
    }
}
