//! # Host Boundary
//!
//! The scene graph, fonts and variables all belong to the host application.
//! [`SceneHost`] is the narrow surface the engine is allowed to use.
//!
//! ## Contract
//!
//! - Every call may fail. A failure on one node never implies anything about
//!   another node.
//! - Handles go stale without notice: a node can be removed or detached by
//!   the host between any two calls that suspend.
//! - `load_font` and `clear_text_style` are the suspension points. After
//!   awaiting either, callers must revalidate before mutating.
//! - Only [`HostError::SessionClosed`] is fatal; everything else is local to
//!   the node or property it was raised for.

use crate::ids::{CollectionId, NodeId, StyleId, VariableId};
use crate::node::{Field, NodeType, StyleSlot};
use crate::value::{BoundVariables, FontName, MaybeMixed, Value};
use crate::variables::{Variable, VariableCollection};
use async_trait::async_trait;
use std::ops::Range;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node has been removed: {0}")]
    NodeRemoved(NodeId),

    #[error("Node is no longer attached to the document: {0}")]
    Stale(NodeId),

    #[error("Node {node} does not support {field}")]
    UnsupportedField { node: NodeId, field: Field },

    #[error("Node {node} has no {slot} slot")]
    UnsupportedSlot { node: NodeId, slot: StyleSlot },

    #[error("Font not loaded: {0}")]
    FontNotLoaded(FontName),

    #[error("Font unavailable: {0}")]
    FontUnavailable(FontName),

    #[error("Property {field} on {node} is read-only")]
    ReadOnly { node: NodeId, field: Field },

    #[error("Invalid character range {start}..{end} on {node}")]
    InvalidRange { node: NodeId, start: usize, end: usize },

    #[error("Expected a {expected} value for {field}, got {actual}")]
    TypeMismatch {
        field: Field,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Node {0} is not an instance")]
    NotAnInstance(NodeId),

    #[error("Node {0} is not a text node")]
    NotText(NodeId),

    #[error("Variable not found: {0}")]
    VariableNotFound(VariableId),

    #[error("Style not found: {0}")]
    StyleNotFound(StyleId),

    #[error("Node is locked: {0}")]
    Locked(NodeId),

    #[error("Plugin session is closed")]
    SessionClosed,
}

impl HostError {
    /// Errors that end the whole run rather than one operation
    pub fn is_fatal(&self) -> bool {
        matches!(self, HostError::SessionClosed)
    }
}

pub type HostResult<T> = Result<T, HostError>;

/// Access to the host document, fonts and variables
#[async_trait]
pub trait SceneHost: Send + Sync {
    /// Root handles currently selected by the user
    fn selection(&self) -> HostResult<Vec<NodeId>>;

    fn node_type(&self, node: NodeId) -> HostResult<NodeType>;

    fn name(&self, node: NodeId) -> HostResult<String>;

    fn is_removed(&self, node: NodeId) -> HostResult<bool>;

    /// `None` once the node is detached from the document tree
    fn parent(&self, node: NodeId) -> HostResult<Option<NodeId>>;

    /// Current children, `None` for leaf node kinds
    fn children(&self, node: NodeId) -> HostResult<Option<Vec<NodeId>>>;

    /// Replace an instance with its expanded literal content.
    ///
    /// Returns the handles now occupying the instance's place. The instance
    /// handle itself is invalid afterwards.
    fn detach_instance(&self, node: NodeId) -> HostResult<Vec<NodeId>>;

    /// Style referenced through `slot`, `None` if unset or unsupported
    fn style_id(&self, node: NodeId, slot: StyleSlot) -> HostResult<Option<StyleId>>;

    /// Drop a style reference, keeping its values baked into the node.
    /// The text slot must go through [`SceneHost::clear_text_style`].
    fn clear_style(&self, node: NodeId, slot: StyleSlot) -> HostResult<()>;

    /// Drop the text style reference. Every font used by the node must be loaded.
    async fn clear_text_style(&self, node: NodeId) -> HostResult<()>;

    async fn load_font(&self, font: &FontName) -> HostResult<()>;

    /// Whole-node value, `None` if the node has no such property
    fn property(&self, node: NodeId, field: Field) -> HostResult<Option<MaybeMixed<Value>>>;

    fn set_property(&self, node: NodeId, field: Field, value: Value) -> HostResult<()>;

    fn bound_variables(&self, node: NodeId) -> HostResult<BoundVariables>;

    /// Remove the binding without touching the current literal
    fn clear_binding(&self, node: NodeId, field: Field) -> HostResult<()>;

    fn character_count(&self, node: NodeId) -> HostResult<usize>;

    fn range_property(
        &self,
        node: NodeId,
        range: Range<usize>,
        field: Field,
    ) -> HostResult<MaybeMixed<Value>>;

    fn set_range_property(
        &self,
        node: NodeId,
        range: Range<usize>,
        field: Field,
        value: Value,
    ) -> HostResult<()>;

    fn range_bound_variables(&self, node: NodeId, range: Range<usize>) -> HostResult<BoundVariables>;

    fn clear_range_binding(&self, node: NodeId, range: Range<usize>, field: Field) -> HostResult<()>;

    fn variable(&self, id: &VariableId) -> HostResult<Option<Variable>>;

    fn variable_collection(&self, id: &CollectionId) -> HostResult<Option<VariableCollection>>;

    /// End the plugin session. Later calls fail with `SessionClosed`.
    fn close_plugin(&self);
}
