//! Node-level vocabulary: node kinds, style slots and bindable fields.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a scene node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Document,
    Page,
    Frame,
    Group,
    Section,
    Component,
    Instance,
    Text,
    Rectangle,
    Ellipse,
    Vector,
}

impl NodeType {
    /// Whether nodes of this kind own an ordered child list
    pub fn is_container(self) -> bool {
        matches!(
            self,
            NodeType::Document
                | NodeType::Page
                | NodeType::Frame
                | NodeType::Group
                | NodeType::Section
                | NodeType::Component
                | NodeType::Instance
        )
    }
}

/// Slot through which a node can reference a shared style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StyleSlot {
    Fill,
    Stroke,
    Effect,
    Text,
    Grid,
    Background,
}

impl StyleSlot {
    /// Every slot, in the order they are stripped
    pub const ALL: [StyleSlot; 6] = [
        StyleSlot::Fill,
        StyleSlot::Stroke,
        StyleSlot::Effect,
        StyleSlot::Text,
        StyleSlot::Grid,
        StyleSlot::Background,
    ];

    /// Host property name of the slot
    pub fn as_str(self) -> &'static str {
        match self {
            StyleSlot::Fill => "fillStyleId",
            StyleSlot::Stroke => "strokeStyleId",
            StyleSlot::Effect => "effectStyleId",
            StyleSlot::Text => "textStyleId",
            StyleSlot::Grid => "gridStyleId",
            StyleSlot::Background => "backgroundStyleId",
        }
    }
}

impl fmt::Display for StyleSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node property that can hold a value and be bound to a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Width,
    Height,
    MinWidth,
    MaxWidth,
    MinHeight,
    MaxHeight,
    Opacity,
    CornerRadius,
    TopLeftRadius,
    TopRightRadius,
    BottomLeftRadius,
    BottomRightRadius,
    ItemSpacing,
    PaddingLeft,
    PaddingRight,
    PaddingTop,
    PaddingBottom,
    LayoutAlign,
    LayoutGrow,
    LayoutPositioning,
    FontSize,
    LineHeight,
    LetterSpacing,
    ParagraphSpacing,
    FontName,
    FontFamily,
    FontStyle,
    Fills,
    Strokes,
    Effects,
    LayoutGrids,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Width => "width",
            Field::Height => "height",
            Field::MinWidth => "minWidth",
            Field::MaxWidth => "maxWidth",
            Field::MinHeight => "minHeight",
            Field::MaxHeight => "maxHeight",
            Field::Opacity => "opacity",
            Field::CornerRadius => "cornerRadius",
            Field::TopLeftRadius => "topLeftRadius",
            Field::TopRightRadius => "topRightRadius",
            Field::BottomLeftRadius => "bottomLeftRadius",
            Field::BottomRightRadius => "bottomRightRadius",
            Field::ItemSpacing => "itemSpacing",
            Field::PaddingLeft => "paddingLeft",
            Field::PaddingRight => "paddingRight",
            Field::PaddingTop => "paddingTop",
            Field::PaddingBottom => "paddingBottom",
            Field::LayoutAlign => "layoutAlign",
            Field::LayoutGrow => "layoutGrow",
            Field::LayoutPositioning => "layoutPositioning",
            Field::FontSize => "fontSize",
            Field::LineHeight => "lineHeight",
            Field::LetterSpacing => "letterSpacing",
            Field::ParagraphSpacing => "paragraphSpacing",
            Field::FontName => "fontName",
            Field::FontFamily => "fontFamily",
            Field::FontStyle => "fontStyle",
            Field::Fills => "fills",
            Field::Strokes => "strokes",
            Field::Effects => "effects",
            Field::LayoutGrids => "layoutGrids",
        }
    }

    /// Fields a text node stores per character rather than per node
    pub fn is_character_field(self) -> bool {
        matches!(
            self,
            Field::FontSize
                | Field::LineHeight
                | Field::LetterSpacing
                | Field::FontName
                | Field::FontFamily
                | Field::FontStyle
                | Field::Fills
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
