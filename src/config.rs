//! Application settings and paths.
//!
//! Defaults for knobs the CLI does not pin down, stored XDG-compliantly.
//! Precedence is CLI flag, then settings file, then built-in default.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

static PATHS: OnceLock<Paths> = OnceLock::new();

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/sounder)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Get the global paths instance.
    pub fn get() -> &'static Paths {
        PATHS.get_or_init(|| Self::new().expect("Failed to initialize paths"))
    }

    fn new() -> ConfigResult<Self> {
        let project =
            ProjectDirs::from("com", "sounder", "sounder").ok_or(ConfigError::DirectoryNotFound)?;

        let paths = Self {
            config_dir: project.config_dir().to_path_buf(),
        };
        fs::create_dir_all(&paths.config_dir)?;

        Ok(paths)
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Default number of probe workers.
    pub workers: usize,
    /// Default connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Default banner-read timeout in milliseconds.
    pub banner_timeout_ms: u64,
    /// Default output file.
    pub output: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            workers: 100,
            connect_timeout_ms: 500,
            banner_timeout_ms: 500,
            output: "scan_results.csv".to_string(),
        }
    }
}

impl AppSettings {
    /// Load settings from the default location.
    ///
    /// A missing file yields the built-in defaults; an unreadable or
    /// malformed file is an error the caller decides how to handle.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::get().settings_file();

        if !file.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&file).map_err(|e| ConfigError::ReadFailed {
            path: file.clone(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    /// Save settings to the default location.
    pub fn save(&self) -> ConfigResult<()> {
        let file = Paths::get().settings_file();

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&file, content).map_err(|e| ConfigError::WriteFailed {
            path: file,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.workers, 100);
        assert_eq!(settings.connect_timeout_ms, 500);
        assert_eq!(settings.output, "scan_results.csv");
    }

    #[test]
    fn test_settings_roundtrip() {
        let settings = AppSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let parsed: AppSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.workers, settings.workers);
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let parsed: AppSettings = serde_json::from_str(r#"{"workers": 8}"#).unwrap();
        assert_eq!(parsed.workers, 8);
        assert_eq!(parsed.connect_timeout_ms, 500);
    }
}
