//! Preference data model and its on-disk JSON representation

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::indicator::IndicatorKind;
use crate::probe::MatchStrategy;

/// Menu item title that is present only while the microphone is live
pub const DEFAULT_LABEL_TEXT: &str = "Mute audio";

/// Effective preferences consumed by the poll loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    /// Indicator kinds that should currently be installed
    pub enabled_indicators: BTreeSet<IndicatorKind>,
    /// Label substituted into the probe script
    pub label_text: String,
    /// How the probe payload is classified
    pub match_strategy: MatchStrategy,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            enabled_indicators: [IndicatorKind::StatusBar, IndicatorKind::ScreenBorder]
                .into_iter()
                .collect(),
            label_text: DEFAULT_LABEL_TEXT.to_string(),
            match_strategy: MatchStrategy::default(),
        }
    }
}

/// Serialized form. Indicator names stay strings so that an unknown
/// name only drops that entry instead of rejecting the whole file.
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct PreferencesFile {
    #[serde(default = "default_indicator_names")]
    pub enabled_indicators: Vec<String>,
    #[serde(default = "default_label_text")]
    pub label_text: String,
    #[serde(default)]
    pub match_strategy: MatchStrategy,
}

fn default_indicator_names() -> Vec<String> {
    Preferences::default()
        .enabled_indicators
        .iter()
        .map(|kind| kind.as_str().to_string())
        .collect()
}

fn default_label_text() -> String {
    DEFAULT_LABEL_TEXT.to_string()
}

impl From<PreferencesFile> for Preferences {
    fn from(file: PreferencesFile) -> Self {
        Self {
            enabled_indicators: parse_indicator_names(&file.enabled_indicators),
            label_text: file.label_text,
            match_strategy: file.match_strategy,
        }
    }
}

impl From<&Preferences> for PreferencesFile {
    fn from(prefs: &Preferences) -> Self {
        Self {
            enabled_indicators: prefs
                .enabled_indicators
                .iter()
                .map(|kind| kind.as_str().to_string())
                .collect(),
            label_text: prefs.label_text.clone(),
            match_strategy: prefs.match_strategy,
        }
    }
}

/// Parse indicator names, skipping (and logging) the unrecognized ones
pub(super) fn parse_indicator_names(names: &[String]) -> BTreeSet<IndicatorKind> {
    names
        .iter()
        .filter_map(|name| match name.parse::<IndicatorKind>() {
            Ok(kind) => Some(kind),
            Err(e) => {
                warn!(%e, "ignoring unknown indicator kind");
                None
            }
        })
        .collect()
}

/// Partial update sent by the preferences editor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_indicators: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_strategy: Option<MatchStrategy>,
}

impl PreferencesUpdate {
    /// Apply the present fields on top of `prefs`
    pub fn apply_to(&self, prefs: &mut Preferences) {
        if let Some(names) = &self.enabled_indicators {
            prefs.enabled_indicators = parse_indicator_names(names);
        }
        if let Some(label) = &self.label_text {
            prefs.label_text = label.clone();
        }
        if let Some(strategy) = self.match_strategy {
            prefs.match_strategy = strategy;
        }
    }
}
