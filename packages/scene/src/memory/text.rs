//! Per-character text storage for [`super::MemoryScene`].

use crate::host::{HostError, HostResult};
use crate::ids::NodeId;
use crate::node::Field;
use crate::value::{BoundVariables, FontName, LetterSpacing, LineHeight, MaybeMixed, Paint, Value};
use std::collections::BTreeSet;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CharStyle {
    pub font: FontName,
    pub font_size: f64,
    pub line_height: LineHeight,
    pub letter_spacing: LetterSpacing,
    pub fills: Vec<Paint>,
    pub bindings: BoundVariables,
}

impl CharStyle {
    pub fn new(font: FontName, font_size: f64) -> Self {
        Self {
            font,
            font_size,
            line_height: LineHeight::Auto,
            letter_spacing: LetterSpacing::Percent(0.0),
            fills: Vec::new(),
            bindings: BoundVariables::new(),
        }
    }

    fn read(&self, field: Field) -> Option<Value> {
        match field {
            Field::FontName => Some(Value::Font(self.font.clone())),
            Field::FontSize => Some(Value::Number(self.font_size)),
            Field::LineHeight => Some(Value::LineHeight(self.line_height)),
            Field::LetterSpacing => Some(Value::LetterSpacing(self.letter_spacing)),
            Field::Fills => Some(Value::Paints(self.fills.clone())),
            _ => None,
        }
    }

    pub fn write(&mut self, field: Field, value: &Value) -> HostResult<()> {
        match (field, value) {
            (Field::FontName, Value::Font(font)) => self.font = font.clone(),
            (Field::FontSize, Value::Number(size)) => self.font_size = *size,
            (Field::LineHeight, Value::LineHeight(line_height)) => self.line_height = *line_height,
            (Field::LetterSpacing, Value::LetterSpacing(spacing)) => self.letter_spacing = *spacing,
            (Field::Fills, Value::Paints(paints)) => self.fills = paints.clone(),
            (Field::FontName | Field::FontSize | Field::LineHeight | Field::LetterSpacing | Field::Fills, other) => {
                return Err(HostError::TypeMismatch {
                    field,
                    expected: expected_kind(field),
                    actual: other.kind(),
                })
            }
            _ => {
                return Err(HostError::TypeMismatch {
                    field,
                    expected: "character style",
                    actual: value.kind(),
                })
            }
        }
        Ok(())
    }
}

fn expected_kind(field: Field) -> &'static str {
    match field {
        Field::FontName => "font",
        Field::FontSize => "number",
        Field::LineHeight => "lineHeight",
        Field::LetterSpacing => "letterSpacing",
        _ => "paints",
    }
}

/// Characters plus one style per character.
///
/// `base` stands in for the style of an empty string and receives every
/// whole-node write so the node keeps a style once characters are gone.
#[derive(Debug, Clone)]
pub(crate) struct TextContent {
    pub characters: String,
    pub styles: Vec<CharStyle>,
    pub base: CharStyle,
}

impl TextContent {
    pub fn new(characters: &str, base: CharStyle) -> Self {
        let styles = characters.chars().map(|_| base.clone()).collect();
        Self {
            characters: characters.to_string(),
            styles,
            base,
        }
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Styles covering the whole node
    pub fn whole(&self) -> &[CharStyle] {
        if self.styles.is_empty() {
            std::slice::from_ref(&self.base)
        } else {
            &self.styles
        }
    }

    pub fn whole_mut(&mut self) -> impl Iterator<Item = &mut CharStyle> {
        self.styles.iter_mut().chain(std::iter::once(&mut self.base))
    }

    pub fn check_range(&self, node: NodeId, range: &Range<usize>) -> HostResult<()> {
        if range.start >= range.end || range.end > self.len() {
            return Err(HostError::InvalidRange {
                node,
                start: range.start,
                end: range.end,
            });
        }
        Ok(())
    }

    pub fn range(&self, range: Range<usize>) -> &[CharStyle] {
        &self.styles[range]
    }

    pub fn range_mut(&mut self, range: Range<usize>) -> &mut [CharStyle] {
        &mut self.styles[range]
    }
}

/// Uniform value across `styles`, `Mixed` when they disagree
pub(crate) fn read_uniform(styles: &[CharStyle], field: Field) -> Option<MaybeMixed<Value>> {
    let mut values = styles.iter().map(|style| style.read(field));
    let first = values.next()??;
    if values.all(|value| value.as_ref() == Some(&first)) {
        Some(MaybeMixed::Value(first))
    } else {
        Some(MaybeMixed::Mixed)
    }
}

/// Union of bindings across `styles`
pub(crate) fn union_bindings(styles: &[CharStyle]) -> BoundVariables {
    let mut bindings = BoundVariables::new();
    for style in styles {
        for (field, alias) in &style.bindings {
            bindings.entry(*field).or_insert_with(|| alias.clone());
        }
    }
    bindings
}

pub(crate) fn fonts_of<'a>(styles: impl IntoIterator<Item = &'a CharStyle>) -> BTreeSet<FontName> {
    styles.into_iter().map(|style| style.font.clone()).collect()
}
