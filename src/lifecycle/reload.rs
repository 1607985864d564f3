//! SIGHUP triggers a preferences reload

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::info;

use crate::preferences::PreferenceStore;

/// Turns SIGHUP into preference change notifications
pub struct ReloadSignal {
    sighup: Signal,
    preferences: Arc<PreferenceStore>,
}

impl ReloadSignal {
    pub fn new(preferences: Arc<PreferenceStore>) -> Result<Self> {
        Ok(Self {
            sighup: signal(SignalKind::hangup()).context("failed to register SIGHUP handler")?,
            preferences,
        })
    }

    /// Forward signals until the signal stream ends
    pub async fn run(mut self) {
        while self.sighup.recv().await.is_some() {
            info!(path = ?self.preferences.path(), "SIGHUP received, reloading preferences");
            self.preferences.notify_changed();
        }
    }
}
