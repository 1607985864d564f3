//! Full-screen border overlay, visible only while unmuted

use tokio::sync::broadcast;
use tracing::debug;

use super::{Indicator, IndicatorError};
use crate::events::DaemonEvent;

pub struct ScreenBorderIndicator {
    visible: bool,
    event_tx: broadcast::Sender<DaemonEvent>,
}

impl ScreenBorderIndicator {
    pub fn new(event_tx: broadcast::Sender<DaemonEvent>) -> Self {
        Self {
            visible: false,
            event_tx,
        }
    }

    fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;

        let event = if visible {
            DaemonEvent::BorderShown
        } else {
            DaemonEvent::BorderHidden
        };
        debug!(%event, "screen border indicator");
        let _ = self.event_tx.send(event);
    }
}

impl Indicator for ScreenBorderIndicator {
    fn mark_muted(&mut self) -> Result<(), IndicatorError> {
        self.set_visible(false);
        Ok(())
    }

    fn mark_unmuted(&mut self) -> Result<(), IndicatorError> {
        self.set_visible(true);
        Ok(())
    }

    fn teardown(&mut self) -> Result<(), IndicatorError> {
        self.set_visible(false);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl ScreenBorderIndicator {
        fn is_visible(&self) -> bool {
            self.visible
        }
    }

    #[test]
    fn test_border_follows_state() {
        let (tx, mut rx) = broadcast::channel(16);
        let mut border = ScreenBorderIndicator::new(tx);
        assert!(!border.is_visible());

        border.mark_muted().unwrap();
        assert!(rx.try_recv().is_err());

        border.mark_unmuted().unwrap();
        border.mark_unmuted().unwrap();
        assert!(border.is_visible());
        assert_eq!(rx.try_recv().unwrap(), DaemonEvent::BorderShown);
        assert!(rx.try_recv().is_err());

        border.mark_muted().unwrap();
        assert_eq!(rx.try_recv().unwrap(), DaemonEvent::BorderHidden);
    }

    #[test]
    fn test_teardown_hides_visible_border() {
        let (tx, mut rx) = broadcast::channel(16);
        let mut border = ScreenBorderIndicator::new(tx);
        border.mark_unmuted().unwrap();
        border.teardown().unwrap();
        assert_eq!(rx.try_recv().unwrap(), DaemonEvent::BorderShown);
        assert_eq!(rx.try_recv().unwrap(), DaemonEvent::BorderHidden);
        assert!(!border.is_visible());
    }
}
