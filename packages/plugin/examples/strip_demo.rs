//! Runs one plugin session against an in-memory scene and prints every
//! message the panel would receive.
//!
//! ```text
//! RUST_LOG=debug cargo run -p stripout-plugin --example strip_demo
//! ```

use anyhow::Result;
use std::sync::Arc;
use stripout_plugin::{logging, ChannelUi, MemoryStorage, PluginConfig, PluginSession};
use stripout_scene::{Field, FontName, MemoryScene, Paint, Rgba, StyleSlot, StyleValue, VariableValue};
use tokio::sync::mpsc;

fn demo_scene() -> Result<MemoryScene> {
    let scene = MemoryScene::new();
    let frame = scene.add_frame(scene.page(), "Checkout")?;
    let button = scene.add_instance(frame, "Button/Primary")?;
    let label = scene.add_text(button, "Label", "Pay now", FontName::new("Inter", "Medium"), 14.0)?;

    let tokens = scene.add_collection("Tokens", &["Light", "Dark"]);
    let family = scene.add_variable(
        &tokens,
        "font/family/ui",
        vec![VariableValue::String("Roboto".into()), VariableValue::String("Roboto".into())],
    )?;
    let padding = scene.add_variable(
        &tokens,
        "space/lg",
        vec![VariableValue::Float(24.0), VariableValue::Float(24.0)],
    )?;
    scene.bind(label, Field::FontFamily, &family)?;
    scene.bind(frame, Field::PaddingLeft, &padding)?;

    let brand = scene.add_style(
        "Brand/Primary",
        StyleValue::Paints(vec![Paint::solid(Rgba::new(0.2, 0.4, 1.0, 1.0))]),
    );
    scene.apply_style(frame, StyleSlot::Fill, &brand)?;

    scene.set_selection(vec![frame]);
    Ok(scene)
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let scene = Arc::new(demo_scene()?);
    let (ui, mut outbound) = ChannelUi::new();
    let session = PluginSession::new(
        PluginConfig::default(),
        scene.clone(),
        Arc::new(MemoryStorage::new()),
        Arc::new(ui),
    );

    let (panel, inbound) = mpsc::unbounded_channel();
    for raw in [
        r#"{"type":"save-preferences","preferences":{"detachComponents":true,"unlinkStyles":true,"unlinkTokens":true}}"#,
        r#"{"type":"strip","detachComponents":true,"unlinkStyles":true,"unlinkTokens":true}"#,
        r#"{"type":"cancel"}"#,
    ] {
        panel.send(raw.to_string())?;
    }

    session.start().await;
    session.serve(inbound).await;

    while let Ok(message) = outbound.try_recv() {
        println!("{}", message.to_json()?);
    }
    println!("session closed: {}", scene.is_closed());
    Ok(())
}
