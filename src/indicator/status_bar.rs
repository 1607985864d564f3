//! Menu bar glyph indicator

use tokio::sync::broadcast;
use tracing::debug;

use super::{Indicator, IndicatorError};
use crate::events::DaemonEvent;

/// Shown until the first state is dispatched
pub const GLYPH_UNKNOWN: &str = "🌕";
/// Microphone closed
pub const GLYPH_MUTED: &str = "🟢";
/// Microphone live
pub const GLYPH_UNMUTED: &str = "🔴";

pub struct StatusBarIndicator {
    glyph: &'static str,
    /// Set once the status item has been taken out of the menu bar
    removed: bool,
    event_tx: broadcast::Sender<DaemonEvent>,
}

impl StatusBarIndicator {
    /// Install the status item, starting with the unknown glyph
    pub fn new(event_tx: broadcast::Sender<DaemonEvent>) -> Self {
        let indicator = Self {
            glyph: GLYPH_UNKNOWN,
            removed: false,
            event_tx,
        };
        indicator.publish(DaemonEvent::StatusGlyphChanged {
            glyph: GLYPH_UNKNOWN.to_string(),
        });
        indicator
    }

    fn set_glyph(&mut self, glyph: &'static str) -> Result<(), IndicatorError> {
        if self.removed {
            return Err(IndicatorError::Unavailable("status item removed".into()));
        }
        if self.glyph == glyph {
            return Ok(());
        }
        self.glyph = glyph;
        self.publish(DaemonEvent::StatusGlyphChanged {
            glyph: glyph.to_string(),
        });
        Ok(())
    }

    fn publish(&self, event: DaemonEvent) {
        debug!(%event, "status bar indicator");
        // No receivers just means no UI is attached
        let _ = self.event_tx.send(event);
    }
}

impl Indicator for StatusBarIndicator {
    fn mark_muted(&mut self) -> Result<(), IndicatorError> {
        self.set_glyph(GLYPH_MUTED)
    }

    fn mark_unmuted(&mut self) -> Result<(), IndicatorError> {
        self.set_glyph(GLYPH_UNMUTED)
    }

    fn teardown(&mut self) -> Result<(), IndicatorError> {
        if self.removed {
            return Err(IndicatorError::Teardown("status item already removed".into()));
        }
        self.removed = true;
        self.publish(DaemonEvent::StatusItemRemoved);
        Ok(())
    }
}
