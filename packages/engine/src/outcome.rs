//! # Attempt Wrapper
//!
//! Every host call a phase makes goes through a [`Tally`]. Failures local
//! to one node or property are logged and counted; the phase moves on.
//! Fatal failures come back as [`EngineError`] for the caller to propagate.

use crate::EngineError;
use serde::Serialize;
use stripout_scene::{HostResult, NodeId};
use tracing::{error, warn};

/// Result of an attempted step
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Done(T),
    Skipped,
}

impl<T> Outcome<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped)
    }
}

/// Applied/skipped counters for one phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub applied: usize,
    pub skipped: usize,
}

impl Tally {
    /// Run an intermediate step (read, font load, ...). Only failures count.
    pub fn attempt<T>(
        &mut self,
        operation: &'static str,
        node: NodeId,
        result: HostResult<T>,
    ) -> Result<Outcome<T>, EngineError> {
        match result {
            Ok(value) => Ok(Outcome::Done(value)),
            Err(err) if err.is_fatal() => {
                error!(%node, operation, error = %err, "fatal host error");
                Err(err.into())
            }
            Err(err) => {
                warn!(%node, operation, error = %err, "skipped");
                self.skipped += 1;
                Ok(Outcome::Skipped)
            }
        }
    }

    /// Run a mutation whose success counts as one applied change
    pub fn record(
        &mut self,
        operation: &'static str,
        node: NodeId,
        result: HostResult<()>,
    ) -> Result<bool, EngineError> {
        let applied = !self.attempt(operation, node, result)?.is_skipped();
        if applied {
            self.applied += 1;
        }
        Ok(applied)
    }
}
