//! Log output for the plugin process.

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber. `RUST_LOG` overrides the default level.
///
/// Returns false when a subscriber was already installed.
pub fn init() -> bool {
    init_with(DEFAULT_DIRECTIVE)
}

pub fn init_with(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
