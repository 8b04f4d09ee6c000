//! # Preferences
//!
//! The three phase toggles, persisted across sessions under one storage key.
//! Reading never fails: a missing, undecodable or unreadable record yields
//! the defaults (every phase on).

use crate::errors::StorageError;
use crate::storage::KeyValueStorage;
use stripout_engine::StripOptions;
use tracing::{debug, error, warn};

/// Stored preferences have the same shape as the run options
pub type Preferences = StripOptions;

pub const PREFERENCES_KEY: &str = "stripThatOut-preferences";

pub struct PreferenceStore<'a> {
    storage: &'a dyn KeyValueStorage,
    key: &'a str,
}

impl<'a> PreferenceStore<'a> {
    pub fn new(storage: &'a dyn KeyValueStorage, key: &'a str) -> Self {
        Self { storage, key }
    }

    pub async fn load(&self) -> Preferences {
        match self.storage.get(self.key).await {
            Ok(Some(raw)) => match serde_json::from_value(raw) {
                Ok(preferences) => {
                    debug!(key = self.key, ?preferences, "loaded preferences");
                    preferences
                }
                Err(err) => {
                    warn!(key = self.key, error = %err, "stored preferences are unreadable, using defaults");
                    Preferences::default()
                }
            },
            Ok(None) => Preferences::default(),
            Err(err) => {
                error!(key = self.key, error = %err, "could not load preferences");
                Preferences::default()
            }
        }
    }

    pub async fn save(&self, preferences: &Preferences) -> Result<(), StorageError> {
        let raw = serde_json::to_value(preferences)?;
        self.storage.set(self.key, raw).await?;
        debug!(key = self.key, ?preferences, "saved preferences");
        Ok(())
    }
}
