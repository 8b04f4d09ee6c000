//! # Scene
//!
//! Host boundary for the strip engine: opaque handles, the literal value
//! model, variables, and the [`SceneHost`] trait through which the engine
//! reads and mutates a document it does not own.
//!
//! [`MemoryScene`] is a complete in-process host used by tests, benches and
//! the demo binary.

pub mod host;
pub mod ids;
pub mod memory;
pub mod node;
pub mod value;
pub mod variables;

pub use host::{HostError, HostResult, SceneHost};
pub use ids::{CollectionId, ModeId, NodeId, StyleId, VariableId};
pub use memory::{MemoryScene, StyleDefinition, StyleValue, TextStyle};
pub use node::{Field, NodeType, StyleSlot};
pub use value::{
    BindingMarkers, BoundVariables, ColorStop, Effect, EffectKind, FontName, GridPattern,
    LayoutGrid, LetterSpacing, LineHeight, MaybeMixed, NestedBindings, Paint, PaintKind, Rgba,
    Value, VariableAlias,
};
pub use variables::{Mode, Variable, VariableCollection, VariableType, VariableValue};
