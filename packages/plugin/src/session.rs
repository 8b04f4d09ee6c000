//! # Plugin Session
//!
//! Owns the host, storage and panel handles for one plugin launch and
//! dispatches panel messages to them. Everything runs on one task: a strip
//! run finishes (success delay included) before the next message is read.

use crate::config::{PanelSize, PluginConfig};
use crate::errors::PluginError;
use crate::messages::{InboundMessage, OutboundMessage};
use crate::preferences::{PreferenceStore, Preferences};
use crate::storage::KeyValueStorage;
use parking_lot::Mutex;
use std::sync::Arc;
use stripout_engine::{Pipeline, ProgressEvent, RunSummary, StripOptions};
use stripout_scene::SceneHost;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

/// The panel the plugin talks to
pub trait PluginUi: Send + Sync {
    fn show(&self, panel: PanelSize);

    fn post(&self, message: OutboundMessage);
}

/// Panel backed by an unbounded channel of outbound messages
pub struct ChannelUi {
    sender: mpsc::UnboundedSender<OutboundMessage>,
    panel: Mutex<Option<PanelSize>>,
}

impl ChannelUi {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let ui = Self {
            sender,
            panel: Mutex::new(None),
        };
        (ui, receiver)
    }

    /// Size the panel was opened with, if it was opened
    pub fn panel(&self) -> Option<PanelSize> {
        *self.panel.lock()
    }
}

impl PluginUi for ChannelUi {
    fn show(&self, panel: PanelSize) {
        *self.panel.lock() = Some(panel);
    }

    fn post(&self, message: OutboundMessage) {
        if self.sender.send(message).is_err() {
            debug!("panel is gone, dropping message");
        }
    }
}

/// Whether the session keeps reading messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFlow {
    Continue,
    Closed,
}

pub struct PluginSession {
    config: PluginConfig,
    host: Arc<dyn SceneHost>,
    storage: Arc<dyn KeyValueStorage>,
    ui: Arc<dyn PluginUi>,
}

impl PluginSession {
    pub fn new(
        config: PluginConfig,
        host: Arc<dyn SceneHost>,
        storage: Arc<dyn KeyValueStorage>,
        ui: Arc<dyn PluginUi>,
    ) -> Self {
        Self {
            config,
            host,
            storage,
            ui,
        }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    fn preferences(&self) -> PreferenceStore<'_> {
        PreferenceStore::new(self.storage.as_ref(), &self.config.preferences_key)
    }

    /// Open the panel and send it the stored preferences
    pub async fn start(&self) {
        self.ui.show(self.config.panel);
        self.post_preferences().await;
    }

    async fn post_preferences(&self) {
        let preferences = self.preferences().load().await;
        self.ui.post(OutboundMessage::PreferencesLoaded { preferences });
    }

    pub async fn save_preferences(&self, preferences: &Preferences) -> Result<(), PluginError> {
        self.preferences().save(preferences).await?;
        Ok(())
    }

    /// Run the pipeline once, reporting progress and the outcome to the panel
    #[instrument(skip(self))]
    pub async fn strip(&self, options: &StripOptions) -> Result<RunSummary, PluginError> {
        let ui = self.ui.as_ref();
        let sink = |event: ProgressEvent| ui.post(event.into());

        let result = Pipeline::new(self.host.as_ref(), &sink)
            .with_max_flatten_passes(self.config.max_flatten_passes)
            .run(options)
            .await;

        match result {
            Ok(summary) => {
                tokio::time::sleep(self.config.success_delay()).await;
                ui.post(OutboundMessage::Success {
                    message: summary.message(),
                });
                Ok(summary)
            }
            Err(err) => {
                let err = PluginError::from(err);
                ui.post(OutboundMessage::Error {
                    message: err.user_message(),
                });
                Err(err)
            }
        }
    }

    pub async fn handle(&self, message: InboundMessage) -> SessionFlow {
        match message {
            InboundMessage::Strip(request) => {
                if let Err(err) = self.strip(&request.into()).await {
                    debug!(error = %err, "strip run ended with an error");
                }
            }
            InboundMessage::SavePreferences { preferences } => {
                if let Err(err) = self.save_preferences(&preferences).await {
                    error!(error = %err, "could not save preferences");
                }
            }
            InboundMessage::LoadPreferences => self.post_preferences().await,
            InboundMessage::Cancel => {
                info!("closing plugin");
                self.host.close_plugin();
                return SessionFlow::Closed;
            }
        }
        SessionFlow::Continue
    }

    /// Decode and handle one raw panel message
    pub async fn handle_json(&self, raw: &str) -> Result<SessionFlow, PluginError> {
        let message = InboundMessage::from_json(raw)?;
        Ok(self.handle(message).await)
    }

    /// Handle raw messages in arrival order until `cancel` or the channel closes
    pub async fn serve(&self, mut inbound: mpsc::UnboundedReceiver<String>) {
        while let Some(raw) = inbound.recv().await {
            match self.handle_json(&raw).await {
                Ok(SessionFlow::Continue) => {}
                Ok(SessionFlow::Closed) => break,
                Err(err) => warn!(error = %err, "ignoring panel message"),
            }
        }
        debug!("message loop finished");
    }
}
