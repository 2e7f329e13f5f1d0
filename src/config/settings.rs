//! Application settings and paths.
//!
//! Settings live in an XDG-compliant location and only supply defaults;
//! command-line flags always win.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Location of the default settings file (`~/.config/portsweep/settings.json`).
pub fn default_settings_file() -> Option<PathBuf> {
    ProjectDirs::from("", "", "portsweep").map(|dirs| dirs.config_dir().join("settings.json"))
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Default number of worker threads.
    pub default_threads: usize,
    /// Default per-probe timeout in milliseconds.
    pub default_timeout_ms: u64,
    /// Default report destination.
    pub default_output: PathBuf,
    /// Upper bound on banner read/write timeouts in milliseconds.
    pub banner_timeout_cap_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_threads: 100,
            default_timeout_ms: 800,
            default_output: PathBuf::from("results.json"),
            banner_timeout_cap_ms: 1500,
        }
    }
}

impl AppSettings {
    /// Load settings from the default location.
    ///
    /// A missing file (or no resolvable home directory) yields defaults.
    pub fn load() -> ConfigResult<Self> {
        match default_settings_file() {
            Some(file) if file.exists() => Self::load_from(&file),
            _ => {
                debug!("no settings file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load settings from a specific file.
    ///
    /// # Errors
    /// Unlike [`AppSettings::load`], the file must exist and parse.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self = serde_json::from_str(&content)
            .map_err(|e| ConfigError::InvalidFormat(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), ?settings, "loaded settings");
        Ok(settings)
    }
}
