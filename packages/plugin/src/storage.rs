//! # Key-Value Storage
//!
//! The host keeps a small persistent store per plugin. Access is
//! asynchronous and may fail at any time.

use crate::errors::StorageError;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value as Json;
use std::collections::HashMap;

#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Json>, StorageError>;

    async fn set(&self, key: &str, value: Json) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
struct MemoryStorageState {
    entries: HashMap<String, Json>,
    fail_reads: bool,
    fail_writes: bool,
}

/// In-process storage with switchable failures
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<MemoryStorageState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, key: &str, value: Json) -> Self {
        self.state.lock().entries.insert(key.to_string(), value);
        self
    }

    pub fn fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Stored value, bypassing failure injection
    pub fn entry(&self, key: &str) -> Option<Json> {
        self.state.lock().entries.get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Json>, StorageError> {
        let result = {
            let state = self.state.lock();
            if state.fail_reads {
                Err(StorageError::Unavailable(format!("read of {} rejected", key)))
            } else {
                Ok(state.entries.get(key).cloned())
            }
        };
        tokio::task::yield_now().await;
        result
    }

    async fn set(&self, key: &str, value: Json) -> Result<(), StorageError> {
        let result = {
            let mut state = self.state.lock();
            if state.fail_writes {
                Err(StorageError::Unavailable(format!("write of {} rejected", key)))
            } else {
                state.entries.insert(key.to_string(), value);
                Ok(())
            }
        };
        tokio::task::yield_now().await;
        result
    }
}
