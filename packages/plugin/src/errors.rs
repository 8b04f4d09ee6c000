//! Error types for the plugin shell

use stripout_engine::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Could not encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Could not decode message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl PluginError {
    /// Text shown to the user for a failed run
    pub fn user_message(&self) -> String {
        match self {
            PluginError::Engine(EngineError::EmptySelection) => EngineError::EmptySelection.to_string(),
            other => format!("Error: {}", other),
        }
    }
}
