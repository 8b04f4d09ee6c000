//! Progress reporting for a pipeline run.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub message: String,
    pub percent: f64,
}

impl ProgressEvent {
    pub fn new(message: impl Into<String>, percent: f64) -> Self {
        Self {
            message: message.into(),
            percent,
        }
    }
}

/// Receiver of progress events
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn report(&self, event: ProgressEvent) {
        self(event)
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

pub(crate) fn detach_percent(step: usize, total: usize) -> f64 {
    10.0 + step as f64 / total as f64 * 30.0
}

pub(crate) fn styles_percent(step: usize, total: usize) -> f64 {
    50.0 + (step - 1) as f64 / total as f64 * 25.0
}

pub(crate) fn tokens_percent(step: usize, total: usize) -> f64 {
    75.0 + (step - 1) as f64 / total as f64 * 20.0
}
