//! Variables (design tokens) and the collections that own them.

use crate::ids::{CollectionId, ModeId, VariableId};
use crate::value::{Rgba, VariableAlias};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VariableType {
    Boolean,
    Float,
    String,
    Color,
}

/// Value a variable holds for one mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Boolean(bool),
    Float(f64),
    String(String),
    Color(Rgba),
    Alias(VariableAlias),
}

impl VariableValue {
    pub fn resolved_type(&self) -> Option<VariableType> {
        match self {
            VariableValue::Boolean(_) => Some(VariableType::Boolean),
            VariableValue::Float(_) => Some(VariableType::Float),
            VariableValue::String(_) => Some(VariableType::String),
            VariableValue::Color(_) => Some(VariableType::Color),
            VariableValue::Alias(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mode {
    pub mode_id: ModeId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableCollection {
    pub id: CollectionId,
    pub name: String,
    pub modes: Vec<Mode>,
}

impl VariableCollection {
    /// The first defined mode
    pub fn default_mode(&self) -> Option<&Mode> {
        self.modes.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub id: VariableId,
    pub name: String,
    pub resolved_type: VariableType,
    pub variable_collection_id: CollectionId,
    pub values_by_mode: BTreeMap<ModeId, VariableValue>,
}

impl Variable {
    pub fn value_for_mode(&self, mode: &ModeId) -> Option<&VariableValue> {
        self.values_by_mode.get(mode)
    }
}
