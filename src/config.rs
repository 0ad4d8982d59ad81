//! Configuration Management
//!
//! Reads the optional `clean_cloud.json` used by the `clean-gcp` entry point.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name under `$HOME/.config`
pub const CONFIG_FILE_NAME: &str = "clean_cloud.json";

/// User configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// GCP project to clean
    #[serde(default)]
    pub project_id: String,
}

impl Config {
    /// Get the config file path: `$HOME/.config/clean_cloud.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default path
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            tracing::warn!("Could not determine home directory, using empty configuration");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load configuration from `path`
    ///
    /// Read and parse failures are logged and yield the default (empty)
    /// configuration rather than an error.
    pub fn load_from(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to read config {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to parse config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn has_project(&self) -> bool {
        !self.project_id.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_valid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"project_id": "proj-1", "unused": true}}"#).unwrap();

        let config = Config::load_from(file.path());
        assert_eq!(config.project_id, "proj-1");
        assert!(config.has_project());
    }

    #[test]
    fn test_malformed_config_falls_back_to_default() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let config = Config::load_from(file.path());
        assert_eq!(config, Config::default());
        assert!(!config.has_project());
    }

    #[test]
    fn test_missing_config_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join(CONFIG_FILE_NAME));
        assert_eq!(config.project_id, "");
    }

    #[test]
    fn test_default_path_ends_with_file_name() {
        if let Some(path) = Config::default_path() {
            assert!(path.ends_with(".config/clean_cloud.json"));
        }
    }
}
