//! # Strip Pipeline
//!
//! Runs the three phases over the current selection:
//! Detach → Collect → Strip styles → Unlink tokens
//!
//! The order is fixed. Styles go before tokens because a style can carry
//! token references of its own; once the style reference is gone only the
//! bindings made directly on the node are left to unlink.
//!
//! The node list is collected again after every phase that can change the
//! tree, never reused across one.

use crate::collector::collect;
use crate::flatten::{FlattenReport, Flattener, MAX_FLATTEN_PASSES};
use crate::outcome::Tally;
use crate::progress::{detach_percent, styles_percent, tokens_percent, ProgressEvent, ProgressSink};
use crate::styles::StyleStripper;
use crate::tokens::TokenUnlinker;
use crate::EngineError;
use serde::{Deserialize, Serialize};
use stripout_scene::SceneHost;
use tracing::{error, info, instrument};

/// Which phases a run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StripOptions {
    pub detach_components: bool,
    pub unlink_styles: bool,
    pub unlink_tokens: bool,
}

impl Default for StripOptions {
    fn default() -> Self {
        Self {
            detach_components: true,
            unlink_styles: true,
            unlink_tokens: true,
        }
    }
}

impl StripOptions {
    pub fn enabled_steps(&self) -> usize {
        [self.detach_components, self.unlink_styles, self.unlink_tokens]
            .into_iter()
            .filter(|enabled| *enabled)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Idle,
    Detaching,
    Collecting,
    StylesStripping,
    TokensUnlinking,
    Complete,
    Error,
}

/// What a completed run did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Selected roots at the start of the run
    pub roots: usize,
    /// Nodes in the last collected list
    pub nodes: usize,
    pub flatten: Option<FlattenReport>,
    pub styles: Tally,
    pub tokens: Tally,
}

impl RunSummary {
    pub fn message(&self) -> String {
        format!(
            "Successfully processed {} object(s) with {} total nodes",
            self.roots, self.nodes
        )
    }

    pub fn skipped(&self) -> usize {
        self.flatten.map_or(0, |report| report.skipped) + self.styles.skipped + self.tokens.skipped
    }
}

pub struct Pipeline<'a> {
    host: &'a dyn SceneHost,
    progress: &'a dyn ProgressSink,
    state: PipelineState,
    max_flatten_passes: usize,
}

impl<'a> Pipeline<'a> {
    pub fn new(host: &'a dyn SceneHost, progress: &'a dyn ProgressSink) -> Self {
        Self {
            host,
            progress,
            state: PipelineState::Idle,
            max_flatten_passes: MAX_FLATTEN_PASSES,
        }
    }

    pub fn with_max_flatten_passes(mut self, max_passes: usize) -> Self {
        self.max_flatten_passes = max_passes;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Run every enabled phase over the current selection.
    ///
    /// Fails before touching anything if the selection is empty. Any other
    /// error is fatal to the run; work already done is not rolled back.
    #[instrument(skip(self), fields(steps = options.enabled_steps()))]
    pub async fn run(&mut self, options: &StripOptions) -> Result<RunSummary, EngineError> {
        self.state = PipelineState::Idle;
        match self.execute(options).await {
            Ok(summary) => {
                self.state = PipelineState::Complete;
                info!(
                    roots = summary.roots,
                    nodes = summary.nodes,
                    skipped = summary.skipped(),
                    "strip complete"
                );
                Ok(summary)
            }
            Err(err) => {
                error!(state = ?self.state, error = %err, "strip failed");
                self.state = PipelineState::Error;
                Err(err)
            }
        }
    }

    async fn execute(&mut self, options: &StripOptions) -> Result<RunSummary, EngineError> {
        let host = self.host;
        let selection = host.selection()?;
        if selection.is_empty() {
            return Err(EngineError::EmptySelection);
        }

        self.emit("Starting...", 5.0);
        let total = options.enabled_steps();
        let mut step = 0;
        let mut roots = selection.clone();

        let mut flatten = None;
        if options.detach_components {
            self.state = PipelineState::Detaching;
            step += 1;
            self.emit("Detaching components...", detach_percent(step, total));
            let flattener = Flattener::new(host).with_max_passes(self.max_flatten_passes);
            flatten = Some(flattener.flatten(&mut roots)?);
        }

        self.state = PipelineState::Collecting;
        self.emit("Collecting nodes...", 45.0);
        let mut nodes = collect(host, &roots)?;
        info!(nodes = nodes.len(), "collected nodes");

        let mut styles = Tally::default();
        if options.unlink_styles {
            self.state = PipelineState::StylesStripping;
            step += 1;
            self.emit("Removing styles...", styles_percent(step, total));
            styles = StyleStripper::new(host).strip(&nodes).await?;
            nodes = collect(host, &roots)?;
        }

        let mut tokens = Tally::default();
        if options.unlink_tokens {
            self.state = PipelineState::TokensUnlinking;
            step += 1;
            self.emit("Unlinking tokens...", tokens_percent(step, total));
            tokens = TokenUnlinker::new(host).unlink(&nodes).await?;
        }

        self.emit("Complete!", 100.0);
        Ok(RunSummary {
            roots: selection.len(),
            nodes: nodes.len(),
            flatten,
            styles,
            tokens,
        })
    }

    fn emit(&self, message: &str, percent: f64) {
        self.progress.report(ProgressEvent::new(message, percent));
    }
}
