//! Persistent application configuration
//!
//! Stores the exclusion store file name, whether windowed maxima are
//! computed and the accepted log extension in a JSON file at
//! `<config_dir>/vibdose/config.json`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_store_file_name() -> String {
    vibdose_core::DEFAULT_STORE_FILE.to_string()
}

fn default_windowed_max() -> bool {
    true
}

fn default_extension() -> String {
    "csv".to_string()
}

/// Persistent application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Exclusion store file name inside each log directory
    #[serde(default = "default_store_file_name")]
    pub store_file_name: String,
    /// Compute event windowed maxima and export their column
    #[serde(default = "default_windowed_max")]
    pub windowed_max: bool,
    /// Log file extension, matched case-insensitively
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_file_name: default_store_file_name(),
            windowed_max: default_windowed_max(),
            extension: default_extension(),
        }
    }
}

impl AppConfig {
    /// Config file path: `<config_dir>/vibdose/config.json`
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vibdose")
            .join("config.json")
    }

    /// Load config from the default location, falling back to defaults on any error
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    /// Load config from `path`, falling back to defaults on any error
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "Loaded config from disk");
                    config
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Save config to disk, creating parent directories if needed
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "Config saved to disk");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.store_file_name, "Exclude.sqlite");
        assert!(config.windowed_max);
        assert_eq!(config.extension, "csv");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let json = r#"{"windowed_max": false}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert!(!config.windowed_max);
        assert_eq!(config.store_file_name, "Exclude.sqlite");
        assert_eq!(config.extension, "csv");
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = AppConfig {
            store_file_name: "site.sqlite".to_string(),
            windowed_max: false,
            extension: "log".to_string(),
        };
        config.save(&path).unwrap();

        assert_eq!(AppConfig::load_from(&path), config);
    }

    #[test]
    fn test_unparseable_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(AppConfig::load_from(&path), AppConfig::default());
    }
}
