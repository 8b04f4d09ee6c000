use crate::preferences::PREFERENCES_KEY;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use stripout_engine::MAX_FLATTEN_PASSES;

/// Logical size of the plugin panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSize {
    pub width: u32,
    pub height: u32,
}

impl Default for PanelSize {
    fn default() -> Self {
        Self {
            width: 450,
            height: 470,
        }
    }
}

/// Plugin shell settings. Every field falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginConfig {
    pub panel: PanelSize,

    /// Storage key of the persisted preferences
    pub preferences_key: String,

    /// Pause between the final progress event and the success message
    pub success_delay_ms: u64,

    pub max_flatten_passes: usize,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            panel: PanelSize::default(),
            preferences_key: PREFERENCES_KEY.to_string(),
            success_delay_ms: 500,
            max_flatten_passes: MAX_FLATTEN_PASSES,
        }
    }
}

impl PluginConfig {
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub fn success_delay(&self) -> Duration {
        Duration::from_millis(self.success_delay_ms)
    }
}
