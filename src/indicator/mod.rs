//! Indicator module: pluggable subscribers that mirror the mute state
//!
//! The registry owns every installed indicator and fans state changes
//! out to them. Which indicators exist is decided by the preferences.

mod registry;
mod screen_border;
mod status_bar;
#[cfg(test)]
pub(crate) mod testing;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::events::DaemonEvent;

pub use registry::IndicatorRegistry;
pub use screen_border::ScreenBorderIndicator;
pub use status_bar::StatusBarIndicator;

/// The closed set of indicators the daemon knows how to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    /// Glyph in the menu bar
    StatusBar,
    /// Red glow around the screen edges while unmuted
    ScreenBorder,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 2] = [IndicatorKind::StatusBar, IndicatorKind::ScreenBorder];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKind::StatusBar => "status_bar",
            IndicatorKind::ScreenBorder => "screen_border",
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown indicator kind {0:?}")]
pub struct UnknownIndicatorKind(pub String);

impl FromStr for IndicatorKind {
    type Err = UnknownIndicatorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IndicatorKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| UnknownIndicatorKind(s.to_string()))
    }
}

/// Errors raised by indicator implementations
#[derive(Debug, thiserror::Error)]
pub enum IndicatorError {
    /// The surface the indicator draws on is gone or not available
    #[error("indicator unavailable: {0}")]
    Unavailable(String),

    #[error("failed to tear down indicator: {0}")]
    Teardown(String),
}

/// A subscriber reflecting the mute state.
///
/// Both marks must be idempotent: repeating the current state is a no-op.
pub trait Indicator: Send {
    fn mark_muted(&mut self) -> Result<(), IndicatorError>;

    fn mark_unmuted(&mut self) -> Result<(), IndicatorError>;

    /// Called exactly once when the indicator is removed
    fn teardown(&mut self) -> Result<(), IndicatorError> {
        Ok(())
    }
}

/// Builds indicator instances for the registry
pub trait IndicatorFactory: Send + Sync {
    fn create(&self, kind: IndicatorKind) -> Result<Box<dyn Indicator>, IndicatorError>;
}

/// Factory for the built-in indicators, which publish on the event channel
pub struct BuiltinIndicators {
    event_tx: broadcast::Sender<DaemonEvent>,
}

impl BuiltinIndicators {
    pub fn new(event_tx: broadcast::Sender<DaemonEvent>) -> Self {
        Self { event_tx }
    }
}

impl IndicatorFactory for BuiltinIndicators {
    fn create(&self, kind: IndicatorKind) -> Result<Box<dyn Indicator>, IndicatorError> {
        let indicator: Box<dyn Indicator> = match kind {
            IndicatorKind::StatusBar => Box::new(StatusBarIndicator::new(self.event_tx.clone())),
            IndicatorKind::ScreenBorder => {
                Box::new(ScreenBorderIndicator::new(self.event_tx.clone()))
            }
        };
        Ok(indicator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!("status_bar".parse::<IndicatorKind>(), Ok(IndicatorKind::StatusBar));
        assert_eq!(
            " screen_border ".parse::<IndicatorKind>(),
            Ok(IndicatorKind::ScreenBorder)
        );
        assert_eq!(
            "menu".parse::<IndicatorKind>(),
            Err(UnknownIndicatorKind("menu".into()))
        );
    }

    #[test]
    fn test_kind_serde_matches_as_str() {
        for kind in IndicatorKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_builtin_factory_builds_every_kind() {
        let (tx, _rx) = broadcast::channel(16);
        let factory = BuiltinIndicators::new(tx);
        for kind in IndicatorKind::ALL {
            assert!(factory.create(kind).is_ok());
        }
    }
}
