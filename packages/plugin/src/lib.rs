//! # Strip That Out Plugin
//!
//! The shell around the strip engine: opens the panel, keeps the phase
//! toggles in host storage and turns panel messages into pipeline runs.
//!
//! ```text
//! panel ──InboundMessage──▶ PluginSession ──▶ Pipeline ──▶ SceneHost
//!   ▲                            │
//!   └──────OutboundMessage───────┘
//! ```

pub mod config;
pub mod errors;
pub mod logging;
pub mod messages;
pub mod preferences;
pub mod session;
pub mod storage;

pub use config::{PanelSize, PluginConfig};
pub use errors::{PluginError, StorageError};
pub use messages::{InboundMessage, OutboundMessage, StripRequest};
pub use preferences::{PreferenceStore, Preferences, PREFERENCES_KEY};
pub use session::{ChannelUi, PluginSession, PluginUi, SessionFlow};
pub use storage::{KeyValueStorage, MemoryStorage};
