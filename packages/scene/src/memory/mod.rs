//! # In-Memory Scene
//!
//! A [`SceneHost`] that keeps the whole document in process. Used by tests,
//! benches and the demo in place of a real design tool.
//!
//! ## Behaviour worth knowing
//!
//! - The tree is `document → page → nodes`. Nodes under the page are live;
//!   removed or detached nodes answer `is_removed`/`parent` but reject every
//!   other call.
//! - Text is styled per character. Any text mutation requires every font it
//!   touches to have been loaded through [`SceneHost::load_font`].
//! - Applying a style or binding a variable writes the resolved value into
//!   the node, so unlinking only has to drop the reference.
//! - Detaching an instance puts fresh copies of its content in the
//!   instance's place. Handles into the old content go stale, so nested
//!   instances are only reachable again after re-collecting.
//! - Removals scheduled with [`MemoryScene::schedule_removal`] fire at the
//!   start of a read call, which is where a real host can interleave UI
//!   actions. A mutation attempted on a stale handle is counted in
//!   [`MemoryScene::stale_mutations`].

mod text;

use crate::host::{HostError, HostResult, SceneHost};
use crate::ids::{CollectionId, ModeId, NodeId, StyleId, VariableId};
use crate::node::{Field, NodeType, StyleSlot};
use crate::value::{
    BoundVariables, Effect, FontName, LayoutGrid, LetterSpacing, LineHeight, MaybeMixed, Paint,
    PaintKind, Rgba, Value, VariableAlias,
};
use crate::variables::{Mode, Variable, VariableCollection, VariableValue};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Range;
use text::{fonts_of, read_uniform, union_bindings, CharStyle, TextContent};

/// Shared style definition
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDefinition {
    pub id: StyleId,
    pub name: String,
    pub value: StyleValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    Paints(Vec<Paint>),
    Effects(Vec<Effect>),
    Text(TextStyle),
    Grids(Vec<LayoutGrid>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font: FontName,
    pub font_size: f64,
    pub line_height: LineHeight,
    pub letter_spacing: LetterSpacing,
}

#[derive(Debug, Clone)]
struct NodeRecord {
    name: String,
    node_type: NodeType,
    removed: bool,
    parent: Option<NodeId>,
    children: Option<Vec<NodeId>>,
    styles: BTreeMap<StyleSlot, StyleId>,
    bindings: BoundVariables,
    properties: BTreeMap<Field, Value>,
    text: Option<TextContent>,
}

impl NodeRecord {
    fn new(name: &str, node_type: NodeType, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            node_type,
            removed: false,
            parent,
            children: node_type.is_container().then(Vec::new),
            styles: BTreeMap::new(),
            bindings: BoundVariables::new(),
            properties: default_properties(node_type),
            text: None,
        }
    }
}

fn default_properties(node_type: NodeType) -> BTreeMap<Field, Value> {
    let mut properties = BTreeMap::new();
    if matches!(node_type, NodeType::Document | NodeType::Page) {
        return properties;
    }

    properties.insert(Field::Width, Value::Number(100.0));
    properties.insert(Field::Height, Value::Number(100.0));
    properties.insert(Field::Opacity, Value::Number(1.0));
    properties.insert(Field::Strokes, Value::Paints(Vec::new()));
    properties.insert(Field::Effects, Value::Effects(Vec::new()));

    match node_type {
        NodeType::Text => {
            properties.insert(Field::ParagraphSpacing, Value::Number(0.0));
        }
        NodeType::Frame | NodeType::Component | NodeType::Instance | NodeType::Section => {
            properties.insert(Field::Fills, Value::Paints(Vec::new()));
            properties.insert(Field::CornerRadius, Value::Number(0.0));
            properties.insert(Field::ItemSpacing, Value::Number(0.0));
            properties.insert(Field::PaddingLeft, Value::Number(0.0));
            properties.insert(Field::PaddingRight, Value::Number(0.0));
            properties.insert(Field::PaddingTop, Value::Number(0.0));
            properties.insert(Field::PaddingBottom, Value::Number(0.0));
            properties.insert(Field::LayoutGrids, Value::Grids(Vec::new()));
        }
        NodeType::Rectangle => {
            properties.insert(Field::Fills, Value::Paints(Vec::new()));
            properties.insert(Field::CornerRadius, Value::Number(0.0));
        }
        _ => {
            properties.insert(Field::Fills, Value::Paints(Vec::new()));
        }
    }
    properties
}

#[derive(Debug, Clone, Copy)]
struct ScheduledRemoval {
    at_read: usize,
    node: NodeId,
}

#[derive(Debug)]
struct SceneState {
    nodes: HashMap<NodeId, NodeRecord>,
    next_id: u64,
    document: NodeId,
    page: NodeId,
    selection: Vec<NodeId>,
    styles: HashMap<StyleId, StyleDefinition>,
    variables: BTreeMap<VariableId, Variable>,
    collections: BTreeMap<CollectionId, VariableCollection>,
    available_fonts: HashSet<FontName>,
    loaded_fonts: HashSet<FontName>,
    read_only: HashSet<(NodeId, Field)>,
    locked: HashSet<NodeId>,
    removals: Vec<ScheduledRemoval>,
    reads: usize,
    mutations: usize,
    stale_mutations: usize,
    closed: bool,
    next_key: u64,
}

impl SceneState {
    fn new() -> Self {
        let document = NodeId(0);
        let page = NodeId(1);
        let mut nodes = HashMap::new();

        let mut document_record = NodeRecord::new("Document", NodeType::Document, None);
        document_record.children = Some(vec![page]);
        nodes.insert(document, document_record);
        nodes.insert(page, NodeRecord::new("Page 1", NodeType::Page, Some(document)));

        Self {
            nodes,
            next_id: 2,
            document,
            page,
            selection: Vec::new(),
            styles: HashMap::new(),
            variables: BTreeMap::new(),
            collections: BTreeMap::new(),
            available_fonts: HashSet::new(),
            loaded_fonts: HashSet::new(),
            read_only: HashSet::new(),
            locked: HashSet::new(),
            removals: Vec::new(),
            reads: 0,
            mutations: 0,
            stale_mutations: 0,
            closed: false,
            next_key: 1,
        }
    }

    fn next_key(&mut self, prefix: &str) -> String {
        let key = format!("{}:{}", prefix, self.next_key);
        self.next_key += 1;
        key
    }

    fn get(&self, node: NodeId) -> HostResult<&NodeRecord> {
        self.nodes.get(&node).ok_or(HostError::NodeNotFound(node))
    }

    fn get_mut(&mut self, node: NodeId) -> HostResult<&mut NodeRecord> {
        self.nodes.get_mut(&node).ok_or(HostError::NodeNotFound(node))
    }

    fn insert_child(&mut self, parent: NodeId, record: NodeRecord) -> HostResult<NodeId> {
        let id = NodeId(self.next_id);
        let parent_record = self.get_mut(parent)?;
        match parent_record.children.as_mut() {
            Some(children) => children.push(id),
            None => {
                return Err(HostError::UnsupportedField {
                    node: parent,
                    field: Field::Width,
                })
            }
        }
        self.next_id += 1;
        self.nodes.insert(id, record);
        Ok(id)
    }

    /// Entry point of every read call
    fn begin_read(&mut self) -> HostResult<()> {
        if self.closed {
            return Err(HostError::SessionClosed);
        }
        self.reads += 1;

        let reads = self.reads;
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.removals)
            .into_iter()
            .partition(|removal| removal.at_read <= reads);
        self.removals = pending;
        for removal in due {
            self.remove_node(removal.node);
        }
        Ok(())
    }

    fn readable(&self, node: NodeId) -> HostResult<&NodeRecord> {
        let record = self.get(node)?;
        if record.removed {
            return Err(HostError::NodeRemoved(node));
        }
        Ok(record)
    }

    /// Entry point of every mutation call
    fn begin_mutation(&mut self, node: NodeId) -> HostResult<()> {
        if self.closed {
            return Err(HostError::SessionClosed);
        }
        let record = self.get(node)?;
        if record.removed || record.parent.is_none() {
            self.stale_mutations += 1;
            tracing::debug!(%node, "mutation attempted on stale handle");
            return Err(HostError::Stale(node));
        }
        if self.locked.contains(&node) {
            return Err(HostError::Locked(node));
        }
        self.mutations += 1;
        Ok(())
    }

    fn check_writable(&self, node: NodeId, field: Field) -> HostResult<()> {
        if self.read_only.contains(&(node, field)) {
            return Err(HostError::ReadOnly { node, field });
        }
        Ok(())
    }

    fn require_loaded<'a>(&self, fonts: impl IntoIterator<Item = &'a FontName>) -> HostResult<()> {
        for font in fonts {
            if !self.loaded_fonts.contains(font) {
                return Err(HostError::FontNotLoaded(font.clone()));
            }
        }
        Ok(())
    }

    fn remove_node(&mut self, node: NodeId) {
        let parent = match self.nodes.get_mut(&node) {
            Some(record) if !record.removed => record.parent.take(),
            _ => return,
        };
        if let Some(parent) = parent {
            if let Some(children) = self.nodes.get_mut(&parent).and_then(|p| p.children.as_mut()) {
                children.retain(|child| *child != node);
            }
        }

        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(record) = self.nodes.get_mut(&current) {
                record.removed = true;
                if let Some(children) = &record.children {
                    stack.extend(children.iter().copied());
                }
            }
        }
    }

    fn text(&self, node: NodeId) -> HostResult<&TextContent> {
        self.readable(node)?.text.as_ref().ok_or(HostError::NotText(node))
    }

    fn text_mut(&mut self, node: NodeId) -> HostResult<&mut TextContent> {
        self.get_mut(node)?.text.as_mut().ok_or(HostError::NotText(node))
    }

    fn resolve_first_mode(&self, id: &VariableId) -> HostResult<(VariableValue, VariableAlias)> {
        let mut current = id.clone();
        for _ in 0..8 {
            let variable = self
                .variables
                .get(&current)
                .ok_or_else(|| HostError::VariableNotFound(current.clone()))?;
            let value = self
                .collections
                .get(&variable.variable_collection_id)
                .and_then(VariableCollection::default_mode)
                .and_then(|mode| variable.value_for_mode(&mode.mode_id))
                .ok_or_else(|| HostError::VariableNotFound(current.clone()))?;
            match value {
                VariableValue::Alias(alias) => current = alias.id.clone(),
                other => return Ok((other.clone(), VariableAlias::new(id.clone()))),
            }
        }
        Err(HostError::VariableNotFound(id.clone()))
    }

    /// Copy `source` and its descendants under `parent` with fresh handles
    fn clone_subtree(&mut self, source: NodeId, parent: NodeId) -> Option<NodeId> {
        let mut record = self.nodes.get(&source)?.clone();
        let id = NodeId(self.next_id);
        self.next_id += 1;

        record.parent = Some(parent);
        if let Some(children) = record.children.take() {
            record.children = Some(
                children
                    .into_iter()
                    .filter_map(|child| self.clone_subtree(child, id))
                    .collect(),
            );
        }
        self.nodes.insert(id, record);
        Some(id)
    }

    fn detach_instance(&mut self, node: NodeId) -> HostResult<Vec<NodeId>> {
        self.begin_mutation(node)?;
        let record = self.get(node)?;
        if record.node_type != NodeType::Instance {
            return Err(HostError::NotAnInstance(node));
        }
        let parent = record.parent.ok_or(HostError::Stale(node))?;
        let content = record.children.clone().unwrap_or_default();

        let replacements: Vec<NodeId> = content
            .into_iter()
            .filter_map(|child| self.clone_subtree(child, parent))
            .collect();
        let position = self
            .get(parent)?
            .children
            .as_ref()
            .and_then(|siblings| siblings.iter().position(|sibling| *sibling == node));

        self.remove_node(node);
        if let (Some(position), Some(siblings)) = (position, self.get_mut(parent)?.children.as_mut()) {
            siblings.splice(position..position, replacements.iter().copied());
        }
        Ok(replacements)
    }

    fn clear_style(&mut self, node: NodeId, slot: StyleSlot) -> HostResult<()> {
        if slot == StyleSlot::Text {
            return Err(HostError::UnsupportedSlot { node, slot });
        }
        self.begin_mutation(node)?;
        self.get_mut(node)?.styles.remove(&slot);
        Ok(())
    }

    fn clear_text_style(&mut self, node: NodeId) -> HostResult<()> {
        self.begin_mutation(node)?;
        let text = self.get(node)?.text.as_ref().ok_or(HostError::NotText(node))?;
        self.require_loaded(&fonts_of(text.whole()))?;
        self.get_mut(node)?.styles.remove(&StyleSlot::Text);
        Ok(())
    }

    fn load_font(&mut self, font: &FontName) -> HostResult<()> {
        self.begin_read()?;
        if !self.available_fonts.contains(font) {
            return Err(HostError::FontUnavailable(font.clone()));
        }
        self.loaded_fonts.insert(font.clone());
        Ok(())
    }

    fn property(&mut self, node: NodeId, field: Field) -> HostResult<Option<MaybeMixed<Value>>> {
        self.begin_read()?;
        let record = self.readable(node)?;
        match &record.text {
            Some(text) if field.is_character_field() => Ok(read_uniform(text.whole(), field)),
            _ => Ok(record.properties.get(&field).cloned().map(MaybeMixed::Value)),
        }
    }

    fn set_property(&mut self, node: NodeId, field: Field, value: Value) -> HostResult<()> {
        self.begin_mutation(node)?;
        self.check_writable(node, field)?;
        let record = self.get(node)?;

        if let Some(text) = &record.text {
            if field.is_character_field() || field == Field::ParagraphSpacing {
                let mut fonts = fonts_of(text.whole());
                if let Value::Font(font) = &value {
                    fonts.insert(font.clone());
                }
                self.require_loaded(&fonts)?;
            }
            if field.is_character_field() {
                let mut scratch = text.base.clone();
                scratch.write(field, &value)?;
                for style in self.text_mut(node)?.whole_mut() {
                    style.write(field, &value)?;
                }
                return Ok(());
            }
        }

        let record = self.get_mut(node)?;
        match record.properties.get_mut(&field) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(HostError::UnsupportedField { node, field }),
        }
    }

    fn bound_variables(&mut self, node: NodeId) -> HostResult<BoundVariables> {
        self.begin_read()?;
        let record = self.readable(node)?;
        let mut bindings = record.bindings.clone();
        if let Some(text) = &record.text {
            for (field, alias) in union_bindings(text.whole()) {
                bindings.entry(field).or_insert(alias);
            }
        }
        Ok(bindings)
    }

    fn clear_binding(&mut self, node: NodeId, field: Field) -> HostResult<()> {
        self.begin_mutation(node)?;
        let record = self.get_mut(node)?;
        match record.text.as_mut() {
            Some(text) if field.is_character_field() => {
                for style in text.whole_mut() {
                    style.bindings.remove(&field);
                }
            }
            _ => {
                record.bindings.remove(&field);
            }
        }
        Ok(())
    }

    fn character_count(&mut self, node: NodeId) -> HostResult<usize> {
        self.begin_read()?;
        Ok(self.text(node)?.len())
    }

    fn range_property(&mut self, node: NodeId, range: Range<usize>, field: Field) -> HostResult<MaybeMixed<Value>> {
        self.begin_read()?;
        let text = self.text(node)?;
        text.check_range(node, &range)?;
        read_uniform(text.range(range), field).ok_or(HostError::UnsupportedField { node, field })
    }

    fn set_range_property(&mut self, node: NodeId, range: Range<usize>, field: Field, value: Value) -> HostResult<()> {
        self.begin_mutation(node)?;
        self.check_writable(node, field)?;
        let text = self.text(node)?;
        text.check_range(node, &range)?;

        let mut fonts = fonts_of(text.range(range.clone()));
        if let Value::Font(font) = &value {
            fonts.insert(font.clone());
        }
        self.require_loaded(&fonts)?;

        let mut scratch = text.base.clone();
        scratch.write(field, &value)?;
        for style in self.text_mut(node)?.range_mut(range) {
            style.write(field, &value)?;
        }
        Ok(())
    }

    fn range_bound_variables(&mut self, node: NodeId, range: Range<usize>) -> HostResult<BoundVariables> {
        self.begin_read()?;
        let text = self.text(node)?;
        text.check_range(node, &range)?;
        Ok(union_bindings(text.range(range)))
    }

    fn clear_range_binding(&mut self, node: NodeId, range: Range<usize>, field: Field) -> HostResult<()> {
        self.begin_mutation(node)?;
        let text = self.text_mut(node)?;
        text.check_range(node, &range)?;
        for style in text.range_mut(range) {
            style.bindings.remove(&field);
        }
        Ok(())
    }
}

/// In-process scene graph implementing [`SceneHost`]
#[derive(Debug)]
pub struct MemoryScene {
    state: Mutex<SceneState>,
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryScene {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SceneState::new()),
        }
    }

    pub fn document(&self) -> NodeId {
        self.state.lock().document
    }

    pub fn page(&self) -> NodeId {
        self.state.lock().page
    }

    /// Add a node of any kind under `parent`
    pub fn add_node(&self, parent: NodeId, node_type: NodeType, name: &str) -> HostResult<NodeId> {
        let mut state = self.state.lock();
        state.insert_child(parent, NodeRecord::new(name, node_type, Some(parent)))
    }

    pub fn add_frame(&self, parent: NodeId, name: &str) -> HostResult<NodeId> {
        self.add_node(parent, NodeType::Frame, name)
    }

    pub fn add_instance(&self, parent: NodeId, name: &str) -> HostResult<NodeId> {
        self.add_node(parent, NodeType::Instance, name)
    }

    pub fn add_rectangle(&self, parent: NodeId, name: &str) -> HostResult<NodeId> {
        self.add_node(parent, NodeType::Rectangle, name)
    }

    /// Add a text node; the font becomes available (not loaded)
    pub fn add_text(
        &self,
        parent: NodeId,
        name: &str,
        characters: &str,
        font: FontName,
        font_size: f64,
    ) -> HostResult<NodeId> {
        let mut state = self.state.lock();
        state.available_fonts.insert(font.clone());

        let mut base = CharStyle::new(font, font_size);
        base.fills = vec![Paint::solid(Rgba::new(0.0, 0.0, 0.0, 1.0))];

        let mut record = NodeRecord::new(name, NodeType::Text, Some(parent));
        record.text = Some(TextContent::new(characters, base));
        state.insert_child(parent, record)
    }

    /// Make a font loadable
    pub fn add_font(&self, font: FontName) {
        self.state.lock().available_fonts.insert(font);
    }

    /// Make a font fail to load from now on
    pub fn remove_font(&self, font: &FontName) {
        let mut state = self.state.lock();
        state.available_fonts.remove(font);
        state.loaded_fonts.remove(font);
    }

    pub fn is_font_loaded(&self, font: &FontName) -> bool {
        self.state.lock().loaded_fonts.contains(font)
    }

    pub fn characters(&self, node: NodeId) -> HostResult<String> {
        let state = self.state.lock();
        Ok(state.text(node)?.characters.clone())
    }

    /// Write a literal without host checks (fonts, read-only, validity)
    pub fn set_literal(&self, node: NodeId, field: Field, value: Value) -> HostResult<()> {
        let mut state = self.state.lock();
        let record = state.get_mut(node)?;
        match record.text.as_mut() {
            Some(text) if field.is_character_field() => {
                for style in text.whole_mut() {
                    style.write(field, &value)?;
                }
            }
            _ => {
                record.properties.insert(field, value);
            }
        }
        Ok(())
    }

    /// Write a literal over a character range without host checks
    pub fn set_range_literal(&self, node: NodeId, range: Range<usize>, field: Field, value: Value) -> HostResult<()> {
        let mut state = self.state.lock();
        let text = state.text_mut(node)?;
        text.check_range(node, &range)?;
        for style in text.range_mut(range) {
            style.write(field, &value)?;
        }
        if let Value::Font(font) = value {
            state.available_fonts.insert(font);
        }
        Ok(())
    }

    pub fn set_selection(&self, selection: Vec<NodeId>) {
        self.state.lock().selection = selection;
    }

    pub fn add_collection(&self, name: &str, modes: &[&str]) -> CollectionId {
        let mut state = self.state.lock();
        let id = CollectionId::new(state.next_key("VariableCollectionId"));
        let modes = modes
            .iter()
            .map(|mode| Mode {
                mode_id: ModeId::new(state.next_key("Mode")),
                name: mode.to_string(),
            })
            .collect();
        state.collections.insert(
            id.clone(),
            VariableCollection {
                id: id.clone(),
                name: name.to_string(),
                modes,
            },
        );
        id
    }

    /// Add a variable with one value per mode, in mode order
    pub fn add_variable(
        &self,
        collection: &CollectionId,
        name: &str,
        values: Vec<VariableValue>,
    ) -> HostResult<VariableId> {
        let mut state = self.state.lock();
        let id = VariableId::new(state.next_key("VariableID"));
        let modes = state
            .collections
            .get(collection)
            .map(|c| c.modes.clone())
            .unwrap_or_default();
        let resolved_type = match values.first() {
            Some(VariableValue::Alias(alias)) => state.variables.get(&alias.id).map(|v| v.resolved_type),
            Some(value) => value.resolved_type(),
            None => None,
        }
        .ok_or_else(|| HostError::VariableNotFound(id.clone()))?;
        let values_by_mode = modes.into_iter().map(|mode| mode.mode_id).zip(values).collect();

        state.variables.insert(
            id.clone(),
            Variable {
                id: id.clone(),
                name: name.to_string(),
                resolved_type,
                variable_collection_id: collection.clone(),
                values_by_mode,
            },
        );
        Ok(id)
    }

    /// Bind a whole-node field, writing the first-mode value as its literal
    pub fn bind(&self, node: NodeId, field: Field, variable: &VariableId) -> HostResult<()> {
        let mut state = self.state.lock();
        let (resolved, alias) = state.resolve_first_mode(variable)?;
        let record = state.get_mut(node)?;

        match record.text.as_mut() {
            Some(text) if field.is_character_field() => {
                let mut fonts = Vec::new();
                for style in text.whole_mut() {
                    apply_to_char(style, field, &resolved, &alias)?;
                    style.bindings.insert(field, alias.clone());
                    fonts.push(style.font.clone());
                }
                state.available_fonts.extend(fonts);
            }
            _ => {
                let literal = literal_for(field, &resolved)?;
                record.properties.insert(field, literal);
                record.bindings.insert(field, alias);
            }
        }
        Ok(())
    }

    /// Bind a field over a character range of a text node
    pub fn bind_range(&self, node: NodeId, range: Range<usize>, field: Field, variable: &VariableId) -> HostResult<()> {
        let mut state = self.state.lock();
        let (resolved, alias) = state.resolve_first_mode(variable)?;
        let text = state.text_mut(node)?;
        text.check_range(node, &range)?;

        let mut fonts = Vec::new();
        for style in text.range_mut(range) {
            apply_to_char(style, field, &resolved, &alias)?;
            style.bindings.insert(field, alias.clone());
            fonts.push(style.font.clone());
        }
        state.available_fonts.extend(fonts);
        Ok(())
    }

    /// Bind a character range to `variable`, with `value` as the literal it
    /// resolves to. Covers fields no variable type maps onto, such as `fontName`.
    pub fn bind_range_value(
        &self,
        node: NodeId,
        range: Range<usize>,
        field: Field,
        value: Value,
        variable: &VariableId,
    ) -> HostResult<()> {
        let mut state = self.state.lock();
        let (_, alias) = state.resolve_first_mode(variable)?;
        let text = state.text_mut(node)?;
        text.check_range(node, &range)?;
        for style in text.range_mut(range) {
            style.write(field, &value)?;
            style.bindings.insert(field, alias.clone());
        }
        if let Value::Font(font) = value {
            state.available_fonts.insert(font);
        }
        Ok(())
    }

    /// Bind the color of one entry of a paint or effect list
    pub fn bind_paint(&self, node: NodeId, field: Field, index: usize, variable: &VariableId) -> HostResult<()> {
        let mut state = self.state.lock();
        let (resolved, alias) = state.resolve_first_mode(variable)?;
        let color = match resolved {
            VariableValue::Color(color) => color,
            other => {
                return Err(HostError::TypeMismatch {
                    field,
                    expected: "color",
                    actual: variable_kind(&other),
                })
            }
        };

        let record = state.get_mut(node)?;
        if let (Some(text), Field::Fills) = (record.text.as_mut(), field) {
            for style in text.whole_mut() {
                bind_paint_color(&mut style.fills, index, color, &alias);
            }
            return Ok(());
        }

        match record.properties.get_mut(&field) {
            Some(Value::Paints(paints)) => {
                if index >= paints.len() {
                    paints.resize(index + 1, Paint::solid(color));
                }
                bind_paint_color(paints, index, color, &alias);
                Ok(())
            }
            Some(Value::Effects(effects)) => {
                let effect = effects
                    .get_mut(index)
                    .ok_or(HostError::UnsupportedField { node, field })?;
                effect.color = Some(color);
                effect.bound_variables.insert("color".to_string(), alias);
                Ok(())
            }
            _ => Err(HostError::UnsupportedField { node, field }),
        }
    }

    pub fn add_style(&self, name: &str, value: StyleValue) -> StyleId {
        let mut state = self.state.lock();
        let id = StyleId::new(format!("S:{}", state.next_key("style")));
        state.styles.insert(
            id.clone(),
            StyleDefinition {
                id: id.clone(),
                name: name.to_string(),
                value,
            },
        );
        id
    }

    /// Reference a style from `slot`, baking its value into the node
    pub fn apply_style(&self, node: NodeId, slot: StyleSlot, style: &StyleId) -> HostResult<()> {
        let mut state = self.state.lock();
        let definition = state
            .styles
            .get(style)
            .cloned()
            .ok_or_else(|| HostError::StyleNotFound(style.clone()))?;
        let record = state.get_mut(node)?;

        match (slot, definition.value) {
            (StyleSlot::Fill | StyleSlot::Background, StyleValue::Paints(paints)) => match record.text.as_mut() {
                Some(text) => {
                    for char_style in text.whole_mut() {
                        char_style.fills = paints.clone();
                    }
                }
                None => {
                    record.properties.insert(Field::Fills, Value::Paints(paints));
                }
            },
            (StyleSlot::Stroke, StyleValue::Paints(paints)) => {
                record.properties.insert(Field::Strokes, Value::Paints(paints));
            }
            (StyleSlot::Effect, StyleValue::Effects(effects)) => {
                record.properties.insert(Field::Effects, Value::Effects(effects));
            }
            (StyleSlot::Grid, StyleValue::Grids(grids)) => {
                record.properties.insert(Field::LayoutGrids, Value::Grids(grids));
            }
            (StyleSlot::Text, StyleValue::Text(text_style)) => {
                let text = record.text.as_mut().ok_or(HostError::NotText(node))?;
                for char_style in text.whole_mut() {
                    char_style.font = text_style.font.clone();
                    char_style.font_size = text_style.font_size;
                    char_style.line_height = text_style.line_height;
                    char_style.letter_spacing = text_style.letter_spacing;
                }
                state.available_fonts.insert(text_style.font);
            }
            _ => return Err(HostError::UnsupportedSlot { node, slot }),
        }

        state.get_mut(node)?.styles.insert(slot, style.clone());
        Ok(())
    }

    /// Make later writes of `field` on `node` fail
    pub fn set_read_only(&self, node: NodeId, field: Field) {
        self.state.lock().read_only.insert((node, field));
    }

    /// Make every later mutation of `node` fail
    pub fn lock(&self, node: NodeId) {
        self.state.lock().locked.insert(node);
    }

    /// Remove `node` at the start of the read call numbered `after_reads`
    pub fn schedule_removal(&self, after_reads: usize, node: NodeId) {
        self.state.lock().removals.push(ScheduledRemoval {
            at_read: after_reads,
            node,
        });
    }

    pub fn remove_node(&self, node: NodeId) -> HostResult<()> {
        let mut state = self.state.lock();
        state.get(node)?;
        state.remove_node(node);
        Ok(())
    }

    pub fn read_count(&self) -> usize {
        self.state.lock().reads
    }

    pub fn mutation_count(&self) -> usize {
        self.state.lock().mutations
    }

    pub fn stale_mutations(&self) -> usize {
        self.state.lock().stale_mutations
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

fn variable_kind(value: &VariableValue) -> &'static str {
    match value {
        VariableValue::Boolean(_) => "boolean",
        VariableValue::Float(_) => "float",
        VariableValue::String(_) => "string",
        VariableValue::Color(_) => "color",
        VariableValue::Alias(_) => "alias",
    }
}

/// Literal a resolved variable value produces for `field`
fn literal_for(field: Field, value: &VariableValue) -> HostResult<Value> {
    let mismatch = |expected| HostError::TypeMismatch {
        field,
        expected,
        actual: variable_kind(value),
    };
    match (field, value) {
        (Field::LineHeight, VariableValue::Float(n)) => Ok(Value::LineHeight(LineHeight::Pixels(*n))),
        (Field::LetterSpacing, VariableValue::Float(n)) => Ok(Value::LetterSpacing(LetterSpacing::Pixels(*n))),
        (Field::LayoutAlign | Field::LayoutPositioning, VariableValue::String(s)) => Ok(Value::Keyword(s.clone())),
        (Field::LayoutAlign | Field::LayoutPositioning, _) => Err(mismatch("string")),
        (
            Field::FontName
            | Field::FontFamily
            | Field::FontStyle
            | Field::Fills
            | Field::Strokes
            | Field::Effects
            | Field::LayoutGrids,
            _,
        ) => Err(mismatch("composite")),
        (_, VariableValue::Float(n)) => Ok(Value::Number(*n)),
        _ => Err(mismatch("float")),
    }
}

fn apply_to_char(style: &mut CharStyle, field: Field, value: &VariableValue, alias: &VariableAlias) -> HostResult<()> {
    match (field, value) {
        (Field::FontFamily, VariableValue::String(family)) => style.font.family = family.clone(),
        (Field::FontStyle, VariableValue::String(font_style)) => style.font.style = font_style.clone(),
        (Field::Fills, VariableValue::Color(color)) => {
            let mut paint = Paint::solid(*color);
            paint.bound_variables.insert("color".to_string(), alias.clone());
            style.fills = vec![paint];
        }
        _ => style.write(field, &literal_for(field, value)?)?,
    }
    Ok(())
}

fn bind_paint_color(paints: &mut [Paint], index: usize, color: Rgba, alias: &VariableAlias) {
    if let Some(paint) = paints.get_mut(index) {
        paint.kind = PaintKind::Solid { color };
        paint.bound_variables.insert("color".to_string(), alias.clone());
    }
}

#[async_trait]
impl SceneHost for MemoryScene {
    fn selection(&self) -> HostResult<Vec<NodeId>> {
        let mut state = self.state.lock();
        state.begin_read()?;
        Ok(state
            .selection
            .iter()
            .copied()
            .filter(|node| state.nodes.get(node).is_some_and(|record| !record.removed))
            .collect())
    }

    fn node_type(&self, node: NodeId) -> HostResult<NodeType> {
        let mut state = self.state.lock();
        state.begin_read()?;
        Ok(state.readable(node)?.node_type)
    }

    fn name(&self, node: NodeId) -> HostResult<String> {
        let mut state = self.state.lock();
        state.begin_read()?;
        Ok(state.readable(node)?.name.clone())
    }

    fn is_removed(&self, node: NodeId) -> HostResult<bool> {
        let mut state = self.state.lock();
        state.begin_read()?;
        Ok(state.get(node)?.removed)
    }

    fn parent(&self, node: NodeId) -> HostResult<Option<NodeId>> {
        let mut state = self.state.lock();
        state.begin_read()?;
        Ok(state.get(node)?.parent)
    }

    fn children(&self, node: NodeId) -> HostResult<Option<Vec<NodeId>>> {
        let mut state = self.state.lock();
        state.begin_read()?;
        Ok(state.readable(node)?.children.clone())
    }

    fn detach_instance(&self, node: NodeId) -> HostResult<Vec<NodeId>> {
        self.state.lock().detach_instance(node)
    }

    fn style_id(&self, node: NodeId, slot: StyleSlot) -> HostResult<Option<StyleId>> {
        let mut state = self.state.lock();
        state.begin_read()?;
        let record = state.readable(node)?;
        if slot == StyleSlot::Text && record.node_type != NodeType::Text {
            return Ok(None);
        }
        Ok(record.styles.get(&slot).cloned())
    }

    fn clear_style(&self, node: NodeId, slot: StyleSlot) -> HostResult<()> {
        self.state.lock().clear_style(node, slot)
    }

    async fn clear_text_style(&self, node: NodeId) -> HostResult<()> {
        let result = self.state.lock().clear_text_style(node);
        tokio::task::yield_now().await;
        result
    }

    async fn load_font(&self, font: &FontName) -> HostResult<()> {
        let result = self.state.lock().load_font(font);
        tokio::task::yield_now().await;
        result
    }

    fn property(&self, node: NodeId, field: Field) -> HostResult<Option<MaybeMixed<Value>>> {
        self.state.lock().property(node, field)
    }

    fn set_property(&self, node: NodeId, field: Field, value: Value) -> HostResult<()> {
        self.state.lock().set_property(node, field, value)
    }

    fn bound_variables(&self, node: NodeId) -> HostResult<BoundVariables> {
        self.state.lock().bound_variables(node)
    }

    fn clear_binding(&self, node: NodeId, field: Field) -> HostResult<()> {
        self.state.lock().clear_binding(node, field)
    }

    fn character_count(&self, node: NodeId) -> HostResult<usize> {
        self.state.lock().character_count(node)
    }

    fn range_property(&self, node: NodeId, range: Range<usize>, field: Field) -> HostResult<MaybeMixed<Value>> {
        self.state.lock().range_property(node, range, field)
    }

    fn set_range_property(&self, node: NodeId, range: Range<usize>, field: Field, value: Value) -> HostResult<()> {
        self.state.lock().set_range_property(node, range, field, value)
    }

    fn range_bound_variables(&self, node: NodeId, range: Range<usize>) -> HostResult<BoundVariables> {
        self.state.lock().range_bound_variables(node, range)
    }

    fn clear_range_binding(&self, node: NodeId, range: Range<usize>, field: Field) -> HostResult<()> {
        self.state.lock().clear_range_binding(node, range, field)
    }

    fn variable(&self, id: &VariableId) -> HostResult<Option<Variable>> {
        let mut state = self.state.lock();
        state.begin_read()?;
        Ok(state.variables.get(id).cloned())
    }

    fn variable_collection(&self, id: &CollectionId) -> HostResult<Option<VariableCollection>> {
        let mut state = self.state.lock();
        state.begin_read()?;
        Ok(state.collections.get(id).cloned())
    }

    fn close_plugin(&self) {
        self.state.lock().closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inter() -> FontName {
        FontName::new("Inter", "Regular")
    }

    #[test]
    fn test_new_nodes_are_attached_under_page() {
        let scene = MemoryScene::new();
        let frame = scene.add_frame(scene.page(), "Frame").unwrap();

        assert_eq!(scene.parent(frame).unwrap(), Some(scene.page()));
        assert_eq!(scene.children(scene.page()).unwrap(), Some(vec![frame]));
        assert!(!scene.is_removed(frame).unwrap());
    }

    #[test]
    fn test_detach_splices_content_into_parent() {
        let scene = MemoryScene::new();
        let frame = scene.add_frame(scene.page(), "Frame").unwrap();
        let before = scene.add_rectangle(frame, "Before").unwrap();
        let instance = scene.add_instance(frame, "Button").unwrap();
        let label = scene.add_text(instance, "Label", "OK", inter(), 12.0).unwrap();
        let after = scene.add_rectangle(frame, "After").unwrap();

        let content = scene.detach_instance(instance).unwrap();

        assert_eq!(content.len(), 1);
        assert_eq!(scene.children(frame).unwrap(), Some(vec![before, content[0], after]));
        assert_eq!(scene.parent(content[0]).unwrap(), Some(frame));
        assert_eq!(scene.characters(content[0]).unwrap(), "OK");
        assert!(scene.is_removed(label).unwrap());
        assert!(scene.is_removed(instance).unwrap());
        assert_eq!(scene.parent(instance).unwrap(), None);
    }

    #[test]
    fn test_detach_rejects_non_instances() {
        let scene = MemoryScene::new();
        let frame = scene.add_frame(scene.page(), "Frame").unwrap();
        assert_eq!(scene.detach_instance(frame), Err(HostError::NotAnInstance(frame)));
    }

    #[test]
    fn test_text_mutation_requires_loaded_font() {
        let scene = MemoryScene::new();
        let text = scene.add_text(scene.page(), "Label", "Hi", inter(), 12.0).unwrap();

        let result = scene.set_property(text, Field::FontSize, Value::Number(14.0));
        assert_eq!(result, Err(HostError::FontNotLoaded(inter())));
    }

    #[tokio::test]
    async fn test_text_mutation_after_font_load() {
        let scene = MemoryScene::new();
        let text = scene.add_text(scene.page(), "Label", "Hi", inter(), 12.0).unwrap();

        scene.load_font(&inter()).await.unwrap();
        scene.set_property(text, Field::FontSize, Value::Number(14.0)).unwrap();

        assert_eq!(
            scene.property(text, Field::FontSize).unwrap(),
            Some(MaybeMixed::Value(Value::Number(14.0)))
        );
    }

    #[tokio::test]
    async fn test_unknown_font_fails_to_load() {
        let scene = MemoryScene::new();
        let missing = FontName::new("Nope", "Bold");
        assert_eq!(
            scene.load_font(&missing).await,
            Err(HostError::FontUnavailable(missing))
        );
    }

    #[test]
    fn test_range_reads_report_mixed() {
        let scene = MemoryScene::new();
        let text = scene.add_text(scene.page(), "Label", "abcd", inter(), 12.0).unwrap();
        scene
            .set_range_literal(text, 2..4, Field::FontSize, Value::Number(20.0))
            .unwrap();

        assert_eq!(scene.property(text, Field::FontSize).unwrap(), Some(MaybeMixed::Mixed));
        assert_eq!(
            scene.range_property(text, 0..2, Field::FontSize).unwrap(),
            MaybeMixed::Value(Value::Number(12.0))
        );
        assert!(scene.range_property(text, 3..5, Field::FontSize).is_err());
    }

    #[test]
    fn test_bind_writes_first_mode_value() {
        let scene = MemoryScene::new();
        let frame = scene.add_frame(scene.page(), "Frame").unwrap();
        let collection = scene.add_collection("Spacing", &["Compact", "Roomy"]);
        let gap = scene
            .add_variable(
                &collection,
                "gap",
                vec![VariableValue::Float(8.0), VariableValue::Float(24.0)],
            )
            .unwrap();

        scene.bind(frame, Field::ItemSpacing, &gap).unwrap();

        assert_eq!(
            scene.property(frame, Field::ItemSpacing).unwrap(),
            Some(MaybeMixed::Value(Value::Number(8.0)))
        );
        assert_eq!(scene.bound_variables(frame).unwrap()[&Field::ItemSpacing].id, gap);
    }

    #[test]
    fn test_scheduled_removal_fires_on_read() {
        let scene = MemoryScene::new();
        let frame = scene.add_frame(scene.page(), "Frame").unwrap();
        let start = scene.read_count();
        scene.schedule_removal(start + 2, frame);

        assert!(!scene.is_removed(frame).unwrap());
        assert!(scene.is_removed(frame).unwrap());
        assert_eq!(scene.set_property(frame, Field::Width, Value::Number(1.0)), Err(HostError::Stale(frame)));
        assert_eq!(scene.stale_mutations(), 1);
    }

    #[test]
    fn test_closed_session_rejects_calls() {
        let scene = MemoryScene::new();
        let frame = scene.add_frame(scene.page(), "Frame").unwrap();
        scene.close_plugin();

        assert_eq!(scene.is_removed(frame), Err(HostError::SessionClosed));
        assert!(scene.is_closed());
    }

    #[test]
    fn test_apply_style_bakes_value() {
        let scene = MemoryScene::new();
        let rect = scene.add_rectangle(scene.page(), "Rect").unwrap();
        let red = vec![Paint::solid(Rgba::new(1.0, 0.0, 0.0, 1.0))];
        let style = scene.add_style("Brand/Red", StyleValue::Paints(red.clone()));

        scene.apply_style(rect, StyleSlot::Fill, &style).unwrap();

        assert_eq!(scene.style_id(rect, StyleSlot::Fill).unwrap(), Some(style));
        assert_eq!(
            scene.property(rect, Field::Fills).unwrap(),
            Some(MaybeMixed::Value(Value::Paints(red)))
        );
    }
}
