//! Events module for mute state and indicator changes
//!
//! Indicators never draw anything themselves. They publish the visual
//! state they want on a broadcast channel, and the UI process renders it
//! after receiving the events over IPC.

use serde::{Deserialize, Serialize};

use crate::indicator::IndicatorKind;
use crate::state::MuteState;

/// Events published by the poll loop and the indicators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DaemonEvent {
    /// A new state was dispatched to the indicators
    MuteStateChanged { state: MuteState },

    /// Preferences were reloaded and the state forgotten
    PreferencesReloaded { label_text: String },

    /// An indicator was installed
    IndicatorAdded { kind: IndicatorKind },

    /// An indicator was torn down
    IndicatorRemoved { kind: IndicatorKind },

    /// Status bar item should show this glyph
    StatusGlyphChanged { glyph: String },

    /// Status bar item should disappear
    StatusItemRemoved,

    /// Full-screen border overlay should be visible
    BorderShown,

    /// Full-screen border overlay should be hidden
    BorderHidden,
}

impl std::fmt::Display for DaemonEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DaemonEvent::MuteStateChanged { state } => write!(f, "MUTE_STATE_CHANGED ({})", state),
            DaemonEvent::PreferencesReloaded { label_text } => {
                write!(f, "PREFERENCES_RELOADED ({:?})", label_text)
            }
            DaemonEvent::IndicatorAdded { kind } => write!(f, "INDICATOR_ADDED ({})", kind),
            DaemonEvent::IndicatorRemoved { kind } => write!(f, "INDICATOR_REMOVED ({})", kind),
            DaemonEvent::StatusGlyphChanged { glyph } => write!(f, "STATUS_GLYPH ({})", glyph),
            DaemonEvent::StatusItemRemoved => write!(f, "STATUS_ITEM_REMOVED"),
            DaemonEvent::BorderShown => write!(f, "BORDER_SHOWN"),
            DaemonEvent::BorderHidden => write!(f, "BORDER_HIDDEN"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = DaemonEvent::MuteStateChanged {
            state: MuteState::Unmuted,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("mute_state_changed"));
        assert!(json.contains("unmuted"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"indicator_added","kind":"screen_border"}"#;
        let event: DaemonEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            DaemonEvent::IndicatorAdded {
                kind: IndicatorKind::ScreenBorder
            }
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(DaemonEvent::BorderShown.to_string(), "BORDER_SHOWN");
    }
}
