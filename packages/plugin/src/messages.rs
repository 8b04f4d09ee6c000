//! # Message Protocol
//!
//! JSON envelopes exchanged with the panel. Every message carries a `type`
//! tag; payload fields sit next to it.
//!
//! ```text
//! panel → plugin   strip | save-preferences | load-preferences | cancel
//! plugin → panel   preferences-loaded | progress | success | error
//! ```

use crate::preferences::Preferences;
use serde::{Deserialize, Serialize};
use stripout_engine::{ProgressEvent, StripOptions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InboundMessage {
    Strip(StripRequest),
    SavePreferences { preferences: Preferences },
    LoadPreferences,
    Cancel,
}

/// The toggles sent with a `strip` message. A flag the panel leaves out is
/// off, unlike [`Preferences::default`] which turns every phase on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StripRequest {
    pub detach_components: bool,
    pub unlink_styles: bool,
    pub unlink_tokens: bool,
}

impl From<StripRequest> for StripOptions {
    fn from(request: StripRequest) -> Self {
        StripOptions {
            detach_components: request.detach_components,
            unlink_styles: request.unlink_styles,
            unlink_tokens: request.unlink_tokens,
        }
    }
}

impl From<StripOptions> for StripRequest {
    fn from(options: StripOptions) -> Self {
        StripRequest {
            detach_components: options.detach_components,
            unlink_styles: options.unlink_styles,
            unlink_tokens: options.unlink_tokens,
        }
    }
}

impl InboundMessage {
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutboundMessage {
    PreferencesLoaded { preferences: Preferences },
    Progress { message: String, percent: f64 },
    Success { message: String },
    Error { message: String },
}

impl OutboundMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<ProgressEvent> for OutboundMessage {
    fn from(event: ProgressEvent) -> Self {
        OutboundMessage::Progress {
            message: event.message,
            percent: event.percent,
        }
    }
}
