//! # Strip Engine
//!
//! Normalizes a live, externally owned scene graph by removing three kinds
//! of indirection: component instances, shared style references and
//! variable (token) bindings. Each is replaced by the literal value it
//! resolved to.
//!
//! The host can invalidate any handle between two suspension points, so
//! the engine never trusts a cached handle. Lists are collected fresh after
//! every tree-changing phase and every mutation is preceded by a liveness
//! check. Failures on one node or property are counted and skipped; only a
//! closed host session aborts a run.
//!
//! ```text
//! Pipeline
//!   ├── Flattener      (detach instances to a fixed point)
//!   ├── collect        (pre-order snapshot of live nodes)
//!   ├── StyleStripper  (clear style slots, keep values)
//!   └── TokenUnlinker  (unbind variables, keep values)
//! ```

pub mod collector;
pub mod errors;
mod fonts;
pub mod flatten;
pub mod oracle;
pub mod outcome;
pub mod pipeline;
pub mod progress;
pub mod styles;
pub mod tokens;

pub use collector::collect;
pub use errors::EngineError;
pub use flatten::{FlattenReport, Flattener, MAX_FLATTEN_PASSES};
pub use oracle::{ensure_live, is_valid, liveness};
pub use outcome::{Outcome, Tally};
pub use pipeline::{Pipeline, PipelineState, RunSummary, StripOptions};
pub use progress::{NoProgress, ProgressEvent, ProgressSink};
pub use styles::StyleStripper;
pub use tokens::{resolve_string_variable, TokenUnlinker};
