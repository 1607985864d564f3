//! File-backed preference store
//!
//! Preferences are a small JSON document. Every successful write, and
//! every explicit reload request, bumps a generation counter on a
//! `watch` channel; the poll loop treats any new generation as a
//! "configuration changed" notification.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;
use tracing::{debug, error, info};

use super::model::{Preferences, PreferencesFile, PreferencesUpdate};

/// Source of the configuration the poll loop runs with
pub trait ConfigGateway: Send + Sync {
    /// Pull the current preferences
    fn current_config(&self) -> Preferences;

    /// Subscribe to change notifications. Each new value on the
    /// receiver means the configuration should be pulled again.
    fn subscribe(&self) -> watch::Receiver<u64>;
}

/// Errors that can occur reading or writing the preferences file
#[derive(Debug, thiserror::Error)]
pub enum PreferencesError {
    #[error("failed to access preferences file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse preferences: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Preferences persisted as JSON on disk
pub struct PreferenceStore {
    path: PathBuf,
    changes: watch::Sender<u64>,
    /// Serializes writers: the temp file name is shared and `update` is
    /// a read-modify-write
    write_lock: Mutex<()>,
}

impl PreferenceStore {
    /// Create a store for the given file; the file need not exist yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            path: path.into(),
            changes,
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file. A missing file is not an error and yields defaults.
    pub fn load(&self) -> Result<Preferences, PreferencesError> {
        if !self.path.exists() {
            debug!(path = ?self.path, "no preferences file, using defaults");
            return Ok(Preferences::default());
        }

        let contents = fs::read_to_string(&self.path)?;
        let file: PreferencesFile = serde_json::from_str(&contents)?;
        Ok(file.into())
    }

    /// Write the preferences atomically (temp file, then rename)
    pub fn save(&self, prefs: &Preferences) -> Result<(), PreferencesError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_file(prefs)
    }

    fn write_file(&self, prefs: &Preferences) -> Result<(), PreferencesError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&PreferencesFile::from(prefs))?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    /// Merge `update` into the stored preferences, persist, and notify.
    ///
    /// A malformed file is replaced: the update is merged into the
    /// defaults instead.
    pub fn update(&self, update: &PreferencesUpdate) -> Result<Preferences, PreferencesError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut prefs = match self.load() {
            Ok(prefs) => prefs,
            Err(PreferencesError::Parse(e)) => {
                error!(%e, path = ?self.path, "unreadable preferences, overwriting with defaults");
                Preferences::default()
            }
            Err(e) => return Err(e),
        };
        update.apply_to(&mut prefs);
        self.write_file(&prefs)?;
        info!(label = %prefs.label_text, "preferences saved");
        self.notify_changed();
        Ok(prefs)
    }

    /// Signal subscribers that the preferences should be re-read
    pub fn notify_changed(&self) {
        self.changes.send_modify(|generation| *generation += 1);
        debug!(generation = *self.changes.borrow(), "preferences change notified");
    }
}

impl ConfigGateway for PreferenceStore {
    fn current_config(&self) -> Preferences {
        match self.load() {
            Ok(prefs) => prefs,
            Err(e) => {
                error!(%e, path = ?self.path, "unreadable preferences, using defaults");
                Preferences::default()
            }
        }
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::IndicatorKind;

    fn temp_store() -> (tempfile::TempDir, PreferenceStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("preferences.json"));
        (dir, store)
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let (_dir, store) = temp_store();
        assert_eq!(store.current_config(), Preferences::default());
    }

    #[test]
    fn test_malformed_file_yields_defaults() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(store.load(), Err(PreferencesError::Parse(_))));
        assert_eq!(store.current_config(), Preferences::default());
    }

    #[test]
    fn test_save_then_load() {
        let (_dir, store) = temp_store();
        let prefs = Preferences {
            enabled_indicators: [IndicatorKind::ScreenBorder].into_iter().collect(),
            label_text: "Stop Video".into(),
            ..Default::default()
        };
        store.save(&prefs).unwrap();
        assert_eq!(store.load().unwrap(), prefs);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_update_persists_and_notifies() {
        let (_dir, store) = temp_store();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        let update = PreferencesUpdate {
            enabled_indicators: Some(vec!["status_bar".into()]),
            ..Default::default()
        };
        let prefs = store.update(&update).unwrap();

        assert_eq!(prefs.enabled_indicators.len(), 1);
        assert_eq!(store.load().unwrap(), prefs);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 1);
    }

    #[test]
    fn test_update_repairs_malformed_file() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), "{ not json").unwrap();

        let update = PreferencesUpdate {
            label_text: Some("Stop Video".into()),
            ..Default::default()
        };
        let prefs = store.update(&update).unwrap();

        assert_eq!(prefs.label_text, "Stop Video");
        assert_eq!(prefs.enabled_indicators, Preferences::default().enabled_indicators);
        assert_eq!(store.load().unwrap(), prefs);
    }

    #[test]
    fn test_concurrent_updates_all_succeed() {
        let (_dir, store) = temp_store();
        let rx = store.subscribe();
        let labels: Vec<String> = (0..8).map(|i| format!("Label {i}")).collect();

        std::thread::scope(|scope| {
            for label in &labels {
                let store = &store;
                scope.spawn(move || {
                    for _ in 0..50 {
                        let update = PreferencesUpdate {
                            label_text: Some(label.clone()),
                            ..Default::default()
                        };
                        store.update(&update).unwrap();
                    }
                });
            }
        });

        let final_label = store.load().unwrap().label_text;
        assert!(labels.contains(&final_label));
        assert_eq!(*rx.borrow(), 400);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_notifications_coalesce() {
        let (_dir, store) = temp_store();
        let mut rx = store.subscribe();
        store.notify_changed();
        store.notify_changed();
        assert_eq!(*rx.borrow_and_update(), 2);
        assert!(!rx.has_changed().unwrap());
    }
}
