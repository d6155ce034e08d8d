//! User settings, kept as JSON in `~/.config/rescue-ledger/settings.json`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{RescueError, Result};

pub const DB_FILE: &str = "rescue.db";

/// Every field falls back to its default when missing from the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_dir: String,
    pub organization: String,
    pub recent_donor_limit: usize,
    pub top_donor_limit: usize,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: home().join("Documents").join("rescue-ledger").to_string_lossy().into_owned(),
            organization: String::new(),
            recent_donor_limit: 10,
            top_donor_limit: 10,
            log_filter: "rescue_ledger=info".to_string(),
        }
    }
}

impl Settings {
    /// Settings stored at `path`; defaults when the file does not exist.
    pub fn read_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| RescueError::Settings(format!("{}: {e}", path.display())))
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| RescueError::Settings(e.to_string()))?;
        std::fs::write(path, format!("{json}\n"))?;
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(DB_FILE)
    }
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

pub fn settings_path() -> PathBuf {
    home().join(".config").join("rescue-ledger").join("settings.json")
}

/// Saved settings, or defaults with a warning when the file is unreadable.
pub fn load_settings() -> Settings {
    let path = settings_path();
    Settings::read_from(&path).unwrap_or_else(|e| {
        warn!(error = %e, "ignoring unreadable settings file");
        Settings::default()
    })
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    settings.write_to(&settings_path())
}

/// Database location from the saved settings.
pub fn default_db_path() -> PathBuf {
    load_settings().db_path()
}

/// Expand a leading `~` and make relative paths absolute.
pub fn expand_path(raw: &str) -> PathBuf {
    let raw = raw.trim();
    let expanded = match raw.strip_prefix('~') {
        Some("") => home(),
        Some(rest) if rest.starts_with('/') => home().join(rest.trim_start_matches('/')),
        _ => PathBuf::from(raw),
    };
    if expanded.is_absolute() {
        return expanded;
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(&expanded))
        .unwrap_or(expanded)
}
