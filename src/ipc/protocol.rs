//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::events::DaemonEvent;
use crate::indicator::IndicatorKind;
use crate::preferences::PreferencesUpdate;
use crate::state::MuteState;

/// Largest accepted message body
pub const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// Requests from UI to daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Request current daemon status
    GetStatus,

    /// Ping to check connectivity
    Ping,

    /// Subscribe to event notifications
    Subscribe,

    /// Re-read the preferences file
    Reload,

    /// Merge, persist and apply new preferences
    UpdatePreferences(PreferencesUpdate),
}

/// Responses from daemon to UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current daemon status
    Status(DaemonStatus),

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed,

    /// Reload requested
    Reloading,

    /// Preferences persisted; they apply from the next poll cycle
    PreferencesUpdated {
        label_text: String,
        enabled_indicators: Vec<IndicatorKind>,
    },

    /// Error response
    Error { code: String, message: String },
}

/// Push notification from daemon to UI (for subscribed clients)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    Event { event: DaemonEvent },
}

/// Full daemon status snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Daemon version
    pub version: String,

    /// Last dispatched mute state
    pub mute_state: MuteState,

    /// Label the probe currently looks for
    pub label_text: String,

    /// Installed indicators
    pub enabled_indicators: Vec<IndicatorKind>,

    /// Glyph the status bar item should show, if installed
    pub status_glyph: Option<String>,

    /// Whether the screen border should be visible
    pub border_visible: bool,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

impl Default for DaemonStatus {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            mute_state: MuteState::Unknown,
            label_text: String::new(),
            enabled_indicators: Vec::new(),
            status_glyph: None,
            border_visible: false,
            uptime_secs: 0,
        }
    }
}

impl DaemonStatus {
    /// Fold an event into the snapshot
    pub fn apply(&mut self, event: &DaemonEvent) {
        match event {
            DaemonEvent::MuteStateChanged { state } => self.mute_state = *state,
            DaemonEvent::PreferencesReloaded { label_text } => {
                self.label_text = label_text.clone();
                self.mute_state = MuteState::Unknown;
            }
            DaemonEvent::IndicatorAdded { kind } => {
                if !self.enabled_indicators.contains(kind) {
                    self.enabled_indicators.push(*kind);
                    self.enabled_indicators.sort();
                }
            }
            DaemonEvent::IndicatorRemoved { kind } => {
                self.enabled_indicators.retain(|k| k != kind);
            }
            DaemonEvent::StatusGlyphChanged { glyph } => self.status_glyph = Some(glyph.clone()),
            DaemonEvent::StatusItemRemoved => self.status_glyph = None,
            DaemonEvent::BorderShown => self.border_visible = true,
            DaemonEvent::BorderHidden => self.border_visible = false,
        }
    }
}

/// Read one length-prefixed JSON message. `Ok(None)` on a clean EOF.
pub async fn read_message<T, R>(reader: &mut R) -> Result<Option<T>>
where
    T: DeserializeOwned,
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    anyhow::ensure!(len <= MAX_MESSAGE_LEN, "message too large: {len} bytes");

    let mut msg_buf = vec![0u8; len];
    reader.read_exact(&mut msg_buf).await?;

    let msg = serde_json::from_slice(&msg_buf).context("failed to parse message")?;
    Ok(Some(msg))
}

/// Send a length-prefixed JSON message
pub async fn write_message<T, W>(writer: &mut W, msg: &T) -> Result<()>
where
    T: Serialize,
    W: AsyncWrite + Unpin,
{
    let msg_bytes = serde_json::to_vec(msg)?;
    let msg_len = (msg_bytes.len() as u32).to_le_bytes();

    writer.write_all(&msg_len).await?;
    writer.write_all(&msg_bytes).await?;
    writer.flush().await?;

    Ok(())
}
