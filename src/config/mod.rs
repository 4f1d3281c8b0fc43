pub mod thresholds;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use lazy_static::lazy_static;
use crate::error::CoachError;

pub use thresholds::Thresholds;

const APP_ID: &str = "com.habitcoach.app";

/// Platform-specific application data directory.
pub fn app_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.push("Library/Application Support");
            dir.push(APP_ID);
            return dir;
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            let mut dir = PathBuf::from(appdata);
            dir.push(APP_ID);
            return dir;
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.push(".local/share");
            dir.push(APP_ID);
            return dir;
        }
    }

    // Fallback
    PathBuf::from("data")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Dataset file; defaults to `<app data>/data/habits.json`
    pub data_file: Option<PathBuf>,
}

impl StorageConfig {
    pub fn data_file(&self) -> PathBuf {
        self.data_file
            .clone()
            .unwrap_or_else(|| app_data_dir().join("data").join("habits.json"))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    pub storage: StorageConfig,
    pub thresholds: Thresholds,
}

pub fn default_config_path() -> PathBuf {
    app_data_dir().join("coach.toml")
}

/// Load configuration from an explicit file. A missing file yields defaults,
/// an unparsable one is an error.
pub fn load_config_from(path: &Path) -> Result<CoachConfig, CoachError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let config = toml::from_str::<CoachConfig>(&content)
                .map_err(|e| CoachError::from(e).with_context(format!("path: {:?}", path)))?;
            tracing::debug!(path = ?path, "Loaded coach config");
            Ok(config)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = ?path, "No coach config found, using defaults");
            Ok(CoachConfig::default())
        }
        Err(e) => Err(CoachError::new(
            crate::error::ErrorKind::Config,
            format!("Failed to read config: {}", e),
            "config"
        ).with_context(format!("path: {:?}", path))),
    }
}

fn load_config_internal() -> CoachConfig {
    let path = default_config_path();
    match load_config_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load coach.toml, using defaults");
            CoachConfig::default()
        }
    }
}

lazy_static! {
    static ref COACH_CONFIG: CoachConfig = load_config_internal();
}

/// Get the cached configuration (loaded once per process)
pub fn get_coach_config() -> &'static CoachConfig {
    &COACH_CONFIG
}
