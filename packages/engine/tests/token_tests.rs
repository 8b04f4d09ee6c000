//! # Token Unlinking
//!
//! Every binding is cleared and the literal left behind equals the value
//! read just before clearing.

use stripout_engine::{Tally, TokenUnlinker};
use stripout_scene::{
    BindingMarkers, ColorStop, Field, FontName, LineHeight, MaybeMixed, MemoryScene, NestedBindings,
    NodeId, Paint, PaintKind, Rgba, SceneHost, Value, VariableAlias, VariableValue,
};

fn inter() -> FontName {
    FontName::new("Inter", "Regular")
}

fn value_of(scene: &MemoryScene, node: NodeId, field: Field) -> Value {
    scene
        .property(node, field)
        .unwrap()
        .and_then(MaybeMixed::into_value)
        .unwrap()
}

#[tokio::test]
async fn test_generic_bindings_round_trip() {
    let scene = MemoryScene::new();
    let frame = scene.add_frame(scene.page(), "Stack").unwrap();
    let collection = scene.add_collection("Layout", &["Desktop", "Mobile"]);
    let bound = [
        (Field::Width, 320.0),
        (Field::PaddingLeft, 24.0),
        (Field::PaddingTop, 16.0),
        (Field::ItemSpacing, 8.0),
        (Field::Opacity, 0.9),
        (Field::TopLeftRadius, 6.0),
    ];
    for (field, value) in bound {
        let variable = scene
            .add_variable(
                &collection,
                field.as_str(),
                vec![VariableValue::Float(value), VariableValue::Float(value / 2.0)],
            )
            .unwrap();
        scene.bind(frame, field, &variable).unwrap();
    }
    let before: Vec<Value> = bound.iter().map(|(field, _)| value_of(&scene, frame, *field)).collect();

    let tally = TokenUnlinker::new(&scene).unlink(&[frame]).await.unwrap();

    assert_eq!(tally, Tally { applied: bound.len(), skipped: 0 });
    assert!(scene.bound_variables(frame).unwrap().is_empty());
    let after: Vec<Value> = bound.iter().map(|(field, _)| value_of(&scene, frame, *field)).collect();
    assert_eq!(after, before);
    assert_eq!(after[0], Value::Number(320.0));
}

#[tokio::test]
async fn test_keyword_binding_round_trips() {
    let scene = MemoryScene::new();
    let frame = scene.add_frame(scene.page(), "Row").unwrap();
    let collection = scene.add_collection("Layout", &["Default"]);
    let align = scene
        .add_variable(&collection, "align", vec![VariableValue::String("STRETCH".into())])
        .unwrap();
    scene.bind(frame, Field::LayoutAlign, &align).unwrap();

    TokenUnlinker::new(&scene).unlink(&[frame]).await.unwrap();

    assert!(scene.bound_variables(frame).unwrap().is_empty());
    assert_eq!(value_of(&scene, frame, Field::LayoutAlign), Value::Keyword("STRETCH".into()));
}

#[tokio::test]
async fn test_whole_text_properties() {
    let scene = MemoryScene::new();
    let text = scene.add_text(scene.page(), "Heading", "Welcome", inter(), 12.0).unwrap();
    let collection = scene.add_collection("Type", &["Default"]);
    let leading = scene
        .add_variable(&collection, "leading", vec![VariableValue::Float(28.0)])
        .unwrap();
    let paragraph = scene
        .add_variable(&collection, "paragraph", vec![VariableValue::Float(10.0)])
        .unwrap();
    scene.bind(text, Field::LineHeight, &leading).unwrap();
    scene.bind(text, Field::ParagraphSpacing, &paragraph).unwrap();

    let tally = TokenUnlinker::new(&scene).unlink(&[text]).await.unwrap();

    assert_eq!(tally.applied, 2);
    assert!(scene.bound_variables(text).unwrap().is_empty());
    assert_eq!(
        value_of(&scene, text, Field::LineHeight),
        Value::LineHeight(LineHeight::Pixels(28.0))
    );
    assert_eq!(value_of(&scene, text, Field::ParagraphSpacing), Value::Number(10.0));
}

#[tokio::test]
async fn test_character_range_bindings() {
    let scene = MemoryScene::new();
    let text = scene.add_text(scene.page(), "Price", "$1999", inter(), 14.0).unwrap();
    let collection = scene.add_collection("Tokens", &["Default"]);
    let large = scene
        .add_variable(&collection, "size/lg", vec![VariableValue::Float(32.0)])
        .unwrap();
    let accent = scene
        .add_variable(&collection, "accent", vec![VariableValue::Color(Rgba::new(0.9, 0.1, 0.2, 1.0))])
        .unwrap();
    scene.bind_range(text, 1..5, Field::FontSize, &large).unwrap();
    scene.bind_range(text, 0..1, Field::Fills, &accent).unwrap();

    let tally = TokenUnlinker::new(&scene).unlink(&[text]).await.unwrap();

    // Four characters of font size, one of fills; the mixed whole-node size is left alone.
    assert_eq!(tally, Tally { applied: 5, skipped: 0 });
    assert!(scene.bound_variables(text).unwrap().is_empty());
    assert_eq!(
        scene.range_property(text, 1..5, Field::FontSize).unwrap(),
        MaybeMixed::Value(Value::Number(32.0))
    );
    assert_eq!(
        scene.range_property(text, 0..1, Field::FontSize).unwrap(),
        MaybeMixed::Value(Value::Number(14.0))
    );
    let fills = scene.range_property(text, 0..1, Field::Fills).unwrap().into_value().unwrap();
    assert!(!fills.has_bindings());
    assert_eq!(fills, Value::Paints(vec![Paint::solid(Rgba::new(0.9, 0.1, 0.2, 1.0))]));
}

#[tokio::test]
async fn test_font_family_on_mixed_text_unlinks_each_run_once() {
    let scene = MemoryScene::new();
    let text = scene.add_text(scene.page(), "Mixed", "aaabbcc", inter(), 12.0).unwrap();
    let collection = scene.add_collection("Type", &["Default"]);
    let display = scene
        .add_variable(&collection, "family/display", vec![VariableValue::String("Playfair".into())])
        .unwrap();
    scene.bind_range(text, 0..3, Field::FontFamily, &display).unwrap();
    scene.bind_range(text, 5..7, Field::FontFamily, &display).unwrap();

    let tally = TokenUnlinker::new(&scene).unlink(&[text]).await.unwrap();

    assert_eq!(tally, Tally { applied: 2, skipped: 0 });
    assert!(scene.bound_variables(text).unwrap().is_empty());
    assert_eq!(
        scene.range_property(text, 0..3, Field::FontName).unwrap(),
        MaybeMixed::Value(Value::Font(FontName::new("Playfair", "Regular")))
    );
    assert_eq!(
        scene.range_property(text, 3..5, Field::FontName).unwrap(),
        MaybeMixed::Value(Value::Font(inter()))
    );
}

#[tokio::test]
async fn test_font_style_on_uniform_text() {
    let scene = MemoryScene::new();
    let text = scene.add_text(scene.page(), "Label", "Bold move", inter(), 12.0).unwrap();
    let collection = scene.add_collection("Type", &["Default"]);
    let weight = scene
        .add_variable(&collection, "weight/strong", vec![VariableValue::String("Bold".into())])
        .unwrap();
    scene.bind(text, Field::FontStyle, &weight).unwrap();

    let tally = TokenUnlinker::new(&scene).unlink(&[text]).await.unwrap();

    assert_eq!(tally.applied, 1);
    assert!(scene.bound_variables(text).unwrap().is_empty());
    assert_eq!(
        value_of(&scene, text, Field::FontName),
        Value::Font(FontName::new("Inter", "Bold"))
    );
}

#[tokio::test]
async fn test_gradient_stop_markers_are_stripped() {
    let scene = MemoryScene::new();
    let rect = scene.add_rectangle(scene.page(), "Hero").unwrap();
    let mut stop_bindings = NestedBindings::new();
    stop_bindings.insert("color".into(), VariableAlias::new(stripout_scene::VariableId::new("VariableID:9")));
    let gradient = Paint {
        kind: PaintKind::GradientLinear {
            stops: vec![
                ColorStop {
                    position: 0.0,
                    color: Rgba::new(1.0, 0.0, 0.0, 1.0),
                    bound_variables: stop_bindings,
                },
                ColorStop {
                    position: 1.0,
                    color: Rgba::new(0.0, 0.0, 1.0, 1.0),
                    bound_variables: NestedBindings::new(),
                },
            ],
        },
        opacity: 1.0,
        visible: true,
        bound_variables: NestedBindings::new(),
    };
    scene
        .set_literal(rect, Field::Fills, Value::Paints(vec![gradient.clone()]))
        .unwrap();

    let tally = TokenUnlinker::new(&scene).unlink(&[rect]).await.unwrap();

    assert_eq!(tally.applied, 1);
    let fills = value_of(&scene, rect, Field::Fills);
    assert!(!fills.has_bindings());
    assert_eq!(fills, Value::Paints(vec![gradient.without_bindings()]));
}

#[tokio::test]
async fn test_stroke_and_effect_markers() {
    let scene = MemoryScene::new();
    let rect = scene.add_rectangle(scene.page(), "Card").unwrap();
    let collection = scene.add_collection("Color", &["Default"]);
    let border = scene
        .add_variable(&collection, "border", vec![VariableValue::Color(Rgba::new(0.8, 0.8, 0.8, 1.0))])
        .unwrap();
    let shadow = scene
        .add_variable(&collection, "shadow", vec![VariableValue::Color(Rgba::new(0.0, 0.0, 0.0, 0.3))])
        .unwrap();
    scene
        .set_literal(
            rect,
            Field::Effects,
            Value::Effects(vec![stripout_scene::Effect::drop_shadow(Rgba::new(0.0, 0.0, 0.0, 1.0), 12.0)]),
        )
        .unwrap();
    scene.bind_paint(rect, Field::Strokes, 0, &border).unwrap();
    scene.bind_paint(rect, Field::Effects, 0, &shadow).unwrap();

    let tally = TokenUnlinker::new(&scene).unlink(&[rect]).await.unwrap();

    assert_eq!(tally.applied, 2);
    assert!(!value_of(&scene, rect, Field::Strokes).has_bindings());
    let effects = value_of(&scene, rect, Field::Effects);
    assert!(!effects.has_bindings());
    match effects {
        Value::Effects(effects) => assert_eq!(effects[0].color, Some(Rgba::new(0.0, 0.0, 0.0, 0.3))),
        other => panic!("unexpected value {:?}", other),
    }
}

#[tokio::test]
async fn test_read_only_field_is_isolated() {
    let scene = MemoryScene::new();
    let frame = scene.add_frame(scene.page(), "Locked").unwrap();
    let collection = scene.add_collection("Layout", &["Default"]);
    let width = scene
        .add_variable(&collection, "width", vec![VariableValue::Float(200.0)])
        .unwrap();
    let height = scene
        .add_variable(&collection, "height", vec![VariableValue::Float(100.0)])
        .unwrap();
    scene.bind(frame, Field::Width, &width).unwrap();
    scene.bind(frame, Field::Height, &height).unwrap();
    scene.set_read_only(frame, Field::Width);

    let tally = TokenUnlinker::new(&scene).unlink(&[frame]).await.unwrap();

    assert_eq!(tally, Tally { applied: 1, skipped: 1 });
    assert_eq!(value_of(&scene, frame, Field::Width), Value::Number(200.0));
    assert_eq!(value_of(&scene, frame, Field::Height), Value::Number(100.0));
    assert!(!scene.bound_variables(frame).unwrap().contains_key(&Field::Height));
}

#[tokio::test]
async fn test_unavailable_font_abandons_text_unlink_only() {
    let scene = MemoryScene::new();
    let missing = FontName::new("Retired", "Regular");
    let text = scene.add_text(scene.page(), "Old", "legacy", missing.clone(), 12.0).unwrap();
    let collection = scene.add_collection("Tokens", &["Default"]);
    let size = scene
        .add_variable(&collection, "size", vec![VariableValue::Float(20.0)])
        .unwrap();
    let width = scene
        .add_variable(&collection, "width", vec![VariableValue::Float(64.0)])
        .unwrap();
    scene.bind(text, Field::FontSize, &size).unwrap();
    scene.bind(text, Field::Width, &width).unwrap();
    scene.remove_font(&missing);

    let tally = TokenUnlinker::new(&scene).unlink(&[text]).await.unwrap();

    assert_eq!(tally.applied, 1);
    let bindings = scene.bound_variables(text).unwrap();
    assert!(bindings.contains_key(&Field::FontSize));
    assert!(!bindings.contains_key(&Field::Width));
    assert_eq!(scene.stale_mutations(), 0);
}

fn character_snapshot(scene: &MemoryScene, node: NodeId, fields: &[Field]) -> anyhow::Result<Vec<Vec<MaybeMixed<Value>>>> {
    let mut snapshot = Vec::new();
    for index in 0..scene.character_count(node)? {
        let mut values = Vec::new();
        for &field in fields {
            values.push(scene.range_property(node, index..index + 1, field)?);
        }
        snapshot.push(values);
    }
    Ok(snapshot)
}

#[tokio::test]
async fn test_character_font_and_metric_bindings_on_mixed_text() -> anyhow::Result<()> {
    let scene = MemoryScene::new();
    let text = scene.add_text(scene.page(), "Caption", "abcdef", inter(), 12.0)?;
    scene.set_range_literal(text, 0..2, Field::FontName, Value::Font(FontName::new("Inter", "Bold")))?;

    let collection = scene.add_collection("Type", &["Default"]);
    let leading = scene.add_variable(&collection, "leading", vec![VariableValue::Float(24.0)])?;
    let tracking = scene.add_variable(&collection, "tracking", vec![VariableValue::Float(2.0)])?;
    let display = scene.add_variable(&collection, "font/display", vec![VariableValue::String("Playfair".into())])?;
    let playfair = FontName::new("Playfair", "Regular");
    scene.bind_range(text, 1..4, Field::LineHeight, &leading)?;
    scene.bind_range(text, 3..6, Field::LetterSpacing, &tracking)?;
    scene.bind_range_value(text, 4..6, Field::FontName, Value::Font(playfair.clone()), &display)?;
    assert!(!scene.is_font_loaded(&playfair));

    let fields = [Field::FontName, Field::LineHeight, Field::LetterSpacing];
    let before = character_snapshot(&scene, text, &fields)?;

    let tally = TokenUnlinker::new(&scene).unlink(&[text]).await?;

    assert_eq!(tally, Tally { applied: 8, skipped: 0 });
    assert_eq!(character_snapshot(&scene, text, &fields)?, before);
    for index in 0..6 {
        assert!(scene.range_bound_variables(text, index..index + 1)?.is_empty(), "character {}", index);
    }
    assert!(scene.is_font_loaded(&playfair));
    assert_eq!(
        scene.range_property(text, 4..6, Field::FontName)?,
        MaybeMixed::Value(Value::Font(playfair))
    );
    Ok(())
}

#[tokio::test]
async fn test_character_scan_stops_when_text_is_removed() -> anyhow::Result<()> {
    let scene = MemoryScene::new();
    let body: String = "x".repeat(100);
    let text = scene.add_text(scene.page(), "Body", &body, inter(), 12.0)?;
    let collection = scene.add_collection("Type", &["Default"]);
    let size = scene.add_variable(&collection, "size", vec![VariableValue::Float(20.0)])?;
    scene.bind_range(text, 0..60, Field::FontSize, &size)?;

    scene.schedule_removal(scene.read_count() + 40, text);
    let tally = TokenUnlinker::new(&scene).unlink(&[text]).await?;

    assert!(tally.applied > 0 && tally.applied < 60, "{:?}", tally);
    assert!(tally.skipped <= 2, "{:?}", tally);
    assert!(scene.is_removed(text)?);
    assert_eq!(scene.stale_mutations(), 0);
    Ok(())
}
