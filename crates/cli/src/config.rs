//! Listener configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[serde(default = "WatchConfig::default_log_level")]
    pub log_level: String,
    /// Window class name the hidden endpoint is registered under
    #[serde(default = "WatchConfig::default_window_class")]
    pub window_class: String,
    /// Run-loop poll interval in milliseconds; bounds Ctrl-C latency
    #[serde(default = "WatchConfig::default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Event channel capacity before the pump blocks on a slow consumer
    #[serde(default = "WatchConfig::default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
            window_class: Self::default_window_class(),
            poll_interval_ms: Self::default_poll_interval_ms(),
            channel_capacity: Self::default_channel_capacity(),
        }
    }
}

impl WatchConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }

    fn default_window_class() -> String {
        "usb-arrival-window".to_string()
    }

    fn default_poll_interval_ms() -> u64 {
        50
    }

    fn default_channel_capacity() -> usize {
        16
    }

    /// Default config file location: `~/.config/usb-arrival/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("usb-arrival")
            .join("config.toml")
    }

    /// Load from `path`, or from the default path when `path` is `None`;
    /// missing files fall back to defaults, malformed files are errors.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let path = path.unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let text = toml::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, text)
            .with_context(|| format!("failed to write config file {}", path.display()))?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WatchConfig::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.window_class, "usb-arrival-window");
        assert_eq!(config.poll_interval(), Duration::from_millis(50));
        assert_eq!(config.channel_capacity, 16);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = WatchConfig::default();
        config.poll_interval_ms = 120;
        config.window_class = "custom-window".to_string();
        config.save(&path).unwrap();

        let loaded = WatchConfig::load(Some(path)).unwrap();
        assert_eq!(loaded.poll_interval_ms, 120);
        assert_eq!(loaded.window_class, "custom-window");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = WatchConfig::load(Some(dir.path().join("nope.toml"))).unwrap();
        assert_eq!(loaded.log_level, "info");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "poll_interval_ms = 5\n").unwrap();

        let loaded = WatchConfig::load(Some(path)).unwrap();
        assert_eq!(loaded.poll_interval_ms, 5);
        assert_eq!(loaded.channel_capacity, 16);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "poll_interval_ms = \"soon\"\n").unwrap();
        assert!(WatchConfig::load(Some(path)).is_err());
    }
}
