//! Error types for the engine

use stripout_scene::HostError;
use thiserror::Error;

/// Errors that end a pipeline run.
///
/// Per-node host failures never show up here; they are counted as skipped.
/// Only preconditions and fatal host errors escalate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Please select at least one object or frame")]
    EmptySelection,

    #[error(transparent)]
    Host(#[from] HostError),
}
