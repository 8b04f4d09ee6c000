//! # Literal Values
//!
//! Everything a node property can hold once indirection is gone.
//!
//! Paints, effects and layout grids are composite: each entry may carry its
//! own `bound_variables` map (a color bound to a token, a gradient stop bound
//! to a token, ...). [`BindingMarkers`] finds and strips those nested markers
//! so a collection can be rewritten as plain literals.

use crate::ids::VariableId;
use crate::node::Field;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A property value that may differ across the parts of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MaybeMixed<T> {
    Value(T),
    Mixed,
}

impl<T> MaybeMixed<T> {
    pub fn is_mixed(&self) -> bool {
        matches!(self, MaybeMixed::Mixed)
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            MaybeMixed::Value(value) => Some(value),
            MaybeMixed::Mixed => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            MaybeMixed::Value(value) => Some(value),
            MaybeMixed::Mixed => None,
        }
    }
}

/// Reference from a property to a variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableAlias {
    pub id: VariableId,
}

impl VariableAlias {
    pub fn new(id: VariableId) -> Self {
        Self { id }
    }
}

/// Node-level bindings, keyed by the bound field
pub type BoundVariables = BTreeMap<Field, VariableAlias>;

/// Bindings nested inside a composite value, keyed by sub-field name
pub type NestedBindings = BTreeMap<String, VariableAlias>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FontName {
    pub family: String,
    pub style: String,
}

impl FontName {
    pub fn new(family: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            style: style.into(),
        }
    }
}

impl fmt::Display for FontName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.family, self.style)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineHeight {
    Auto,
    Pixels(f64),
    Percent(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LetterSpacing {
    Pixels(f64),
    Percent(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorStop {
    pub position: f64,
    pub color: Rgba,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bound_variables: NestedBindings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaintKind {
    Solid { color: Rgba },
    GradientLinear { stops: Vec<ColorStop> },
    Image { image_hash: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paint {
    #[serde(flatten)]
    pub kind: PaintKind,
    pub opacity: f64,
    pub visible: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bound_variables: NestedBindings,
}

impl Paint {
    pub fn solid(color: Rgba) -> Self {
        Self {
            kind: PaintKind::Solid { color },
            opacity: 1.0,
            visible: true,
            bound_variables: NestedBindings::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectKind {
    DropShadow,
    InnerShadow,
    LayerBlur,
    BackgroundBlur,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    pub kind: EffectKind,
    pub visible: bool,
    pub radius: f64,
    pub color: Option<Rgba>,
    pub offset: (f64, f64),
    pub spread: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bound_variables: NestedBindings,
}

impl Effect {
    pub fn drop_shadow(color: Rgba, radius: f64) -> Self {
        Self {
            kind: EffectKind::DropShadow,
            visible: true,
            radius,
            color: Some(color),
            offset: (0.0, 4.0),
            spread: 0.0,
            bound_variables: NestedBindings::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GridPattern {
    Columns,
    Rows,
    Grid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutGrid {
    pub pattern: GridPattern,
    pub section_size: f64,
    pub count: Option<u32>,
    pub gutter_size: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bound_variables: NestedBindings,
}

/// Values that may carry nested variable-binding markers
pub trait BindingMarkers: Sized {
    /// True if this value or anything inside it is bound to a variable
    fn has_bindings(&self) -> bool;

    /// Deep copy with every nested binding marker dropped
    fn without_bindings(&self) -> Self;
}

impl BindingMarkers for ColorStop {
    fn has_bindings(&self) -> bool {
        !self.bound_variables.is_empty()
    }

    fn without_bindings(&self) -> Self {
        Self {
            bound_variables: NestedBindings::new(),
            ..self.clone()
        }
    }
}

impl BindingMarkers for PaintKind {
    fn has_bindings(&self) -> bool {
        match self {
            PaintKind::GradientLinear { stops } => stops.has_bindings(),
            PaintKind::Solid { .. } | PaintKind::Image { .. } => false,
        }
    }

    fn without_bindings(&self) -> Self {
        match self {
            PaintKind::GradientLinear { stops } => PaintKind::GradientLinear {
                stops: stops.without_bindings(),
            },
            other => other.clone(),
        }
    }
}

impl BindingMarkers for Paint {
    fn has_bindings(&self) -> bool {
        !self.bound_variables.is_empty() || self.kind.has_bindings()
    }

    fn without_bindings(&self) -> Self {
        Self {
            kind: self.kind.without_bindings(),
            opacity: self.opacity,
            visible: self.visible,
            bound_variables: NestedBindings::new(),
        }
    }
}

impl BindingMarkers for Effect {
    fn has_bindings(&self) -> bool {
        !self.bound_variables.is_empty()
    }

    fn without_bindings(&self) -> Self {
        Self {
            bound_variables: NestedBindings::new(),
            ..self.clone()
        }
    }
}

impl BindingMarkers for LayoutGrid {
    fn has_bindings(&self) -> bool {
        !self.bound_variables.is_empty()
    }

    fn without_bindings(&self) -> Self {
        Self {
            bound_variables: NestedBindings::new(),
            ..self.clone()
        }
    }
}

impl<T: BindingMarkers> BindingMarkers for Vec<T> {
    fn has_bindings(&self) -> bool {
        self.iter().any(BindingMarkers::has_bindings)
    }

    fn without_bindings(&self) -> Self {
        self.iter().map(BindingMarkers::without_bindings).collect()
    }
}

/// A concrete property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Value {
    Number(f64),
    /// Enumerated values such as `layoutAlign: "STRETCH"`
    Keyword(String),
    Font(FontName),
    LineHeight(LineHeight),
    LetterSpacing(LetterSpacing),
    Paints(Vec<Paint>),
    Effects(Vec<Effect>),
    Grids(Vec<LayoutGrid>),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Keyword(_) => "keyword",
            Value::Font(_) => "font",
            Value::LineHeight(_) => "lineHeight",
            Value::LetterSpacing(_) => "letterSpacing",
            Value::Paints(_) => "paints",
            Value::Effects(_) => "effects",
            Value::Grids(_) => "grids",
        }
    }
}

impl BindingMarkers for Value {
    fn has_bindings(&self) -> bool {
        match self {
            Value::Paints(paints) => paints.has_bindings(),
            Value::Effects(effects) => effects.has_bindings(),
            Value::Grids(grids) => grids.has_bindings(),
            _ => false,
        }
    }

    fn without_bindings(&self) -> Self {
        match self {
            Value::Paints(paints) => Value::Paints(paints.without_bindings()),
            Value::Effects(effects) => Value::Effects(effects.without_bindings()),
            Value::Grids(grids) => Value::Grids(grids.without_bindings()),
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alias(id: &str) -> VariableAlias {
        VariableAlias::new(VariableId::new(id))
    }

    #[test]
    fn test_gradient_stop_binding_is_detected_and_stripped() {
        let mut stop = ColorStop {
            position: 0.5,
            color: Rgba::new(1.0, 0.0, 0.0, 1.0),
            bound_variables: NestedBindings::new(),
        };
        stop.bound_variables.insert("color".into(), alias("v1"));

        let paint = Paint {
            kind: PaintKind::GradientLinear { stops: vec![stop] },
            opacity: 0.8,
            visible: true,
            bound_variables: NestedBindings::new(),
        };
        let paints = vec![Paint::solid(Rgba::new(0.0, 0.0, 0.0, 1.0)), paint];

        assert!(paints.has_bindings());
        let stripped = paints.without_bindings();
        assert!(!stripped.has_bindings());

        match &stripped[1].kind {
            PaintKind::GradientLinear { stops } => {
                assert_eq!(stops[0].color, Rgba::new(1.0, 0.0, 0.0, 1.0));
                assert_eq!(stops[0].position, 0.5);
            }
            other => panic!("unexpected paint {:?}", other),
        }
        assert_eq!(stripped[1].opacity, 0.8);
    }

    #[test]
    fn test_scalar_values_never_carry_markers() {
        let value = Value::Number(12.0);
        assert!(!value.has_bindings());
        assert_eq!(value.without_bindings(), value);
    }

    #[test]
    fn test_paint_serializes_with_type_tag() {
        let paint = Paint::solid(Rgba::new(0.0, 0.5, 1.0, 1.0));
        let json = serde_json::to_value(&paint).unwrap();
        assert_eq!(json["type"], "SOLID");
        assert!(json.get("boundVariables").is_none());
    }

    #[test]
    fn test_maybe_mixed_accessors() {
        let mixed: MaybeMixed<Value> = MaybeMixed::Mixed;
        assert!(mixed.is_mixed());
        assert!(mixed.as_value().is_none());

        let value = MaybeMixed::Value(Value::Number(4.0));
        assert_eq!(value.into_value(), Some(Value::Number(4.0)));
    }
}
