//! Configuration loading and management
//!
//! Daemon runtime settings only. User-editable preferences (which
//! indicators are enabled, which menu label to look for) live in
//! [`crate::preferences`].

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Default poll period between probe cycles
const DEFAULT_POLL_MS: u64 = 1000;

/// Default probe executable (macOS scripting host)
const DEFAULT_PROBE_PROGRAM: &str = "/usr/bin/osascript";

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// JSON file holding the user preferences
    pub preferences_path: PathBuf,

    /// Fixed period between probe cycles
    pub poll_interval: Duration,

    /// Program spawned once per cycle to query the mute status
    pub probe_program: PathBuf,

    /// Arguments passed before the rendered script
    pub probe_args: Vec<String>,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        let data_dir = match std::env::var_os("MUTE_INDICATOR_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = std::env::var("HOME").context("HOME is not set")?;
                PathBuf::from(&home)
                    .join(".local")
                    .join("share")
                    .join("mute-indicator")
            }
        };

        let socket_path = data_dir.join("daemon.sock");

        let preferences_path = std::env::var_os("MUTE_INDICATOR_PREFERENCES")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("preferences.json"));

        let poll_ms = match std::env::var("MUTE_INDICATOR_POLL_MS") {
            Ok(raw) => parse_poll_ms(&raw)?,
            Err(_) => DEFAULT_POLL_MS,
        };

        let probe_program = std::env::var_os("MUTE_INDICATOR_PROBE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROBE_PROGRAM));

        Ok(Self {
            socket_path,
            data_dir,
            preferences_path,
            poll_interval: Duration::from_millis(poll_ms),
            probe_program,
            probe_args: vec!["-l".into(), "JavaScript".into(), "-e".into()],
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create {}", self.data_dir.display()))?;
        Ok(())
    }
}

fn parse_poll_ms(raw: &str) -> Result<u64> {
    let ms: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("MUTE_INDICATOR_POLL_MS is not a number: {raw:?}"))?;
    anyhow::ensure!(ms > 0, "MUTE_INDICATOR_POLL_MS must be positive");
    Ok(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_load() {
        let config = Config::load().unwrap();
        assert!(config.socket_path.ends_with("daemon.sock"));
        assert!(config.poll_interval > Duration::ZERO);
        assert_eq!(config.probe_args.last().map(String::as_str), Some("-e"));
    }

    #[test]
    fn test_parse_poll_ms() {
        assert_eq!(parse_poll_ms(" 250 ").unwrap(), 250);
        assert!(parse_poll_ms("0").is_err());
        assert!(parse_poll_ms("fast").is_err());
    }
}
