use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::undo::DEFAULT_UNDO_TIMEOUT;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse settings: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("HOME environment variable is not set")]
    NoHome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Name of the persistence slot holding the task list.
    pub storage_key: String,
    pub undo_timeout_ms: u64,
    /// Event loop poll interval; timers are checked at least this often.
    pub tick_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_key: "tasks".to_string(),
            undo_timeout_ms: DEFAULT_UNDO_TIMEOUT.as_millis() as u64,
            tick_ms: 250,
        }
    }
}

impl Settings {
    pub fn undo_timeout(&self) -> Duration {
        Duration::from_millis(self.undo_timeout_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

/// `$XDG_DATA_HOME/tasktally`, falling back to `~/.local/share/tasktally`.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        if !xdg_data.is_empty() {
            return Ok(PathBuf::from(xdg_data).join("tasktally"));
        }
    }

    let home = std::env::var("HOME").map_err(|_| ConfigError::NoHome)?;
    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("tasktally"))
}

pub fn log_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("logs")
}

/// Missing or broken settings fall back to defaults.
pub fn load_settings(data_dir: &Path) -> Settings {
    let path = data_dir.join("settings.json");
    if !path.exists() {
        return Settings::default();
    }

    match load_settings_from_file(&path) {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!(
                target: "tasktally::config",
                path = %path.display(),
                error = %err,
                "Ignoring unreadable settings"
            );
            Settings::default()
        }
    }
}

fn load_settings_from_file(path: &Path) -> Result<Settings, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let settings = serde_json::from_str(&contents)?;
    Ok(settings)
}
