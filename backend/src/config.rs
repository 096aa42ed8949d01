//! # Application Configuration
//!
//! Settings come from three places, later ones winning:
//!
//! 1. built-in defaults
//! 2. `camp-manager.yaml` at the root of the data directory, if present
//! 3. environment variables `CAMP_MANAGER_DATA_DIR`, `CAMP_MANAGER_BIND`
//!    and `CAMP_MANAGER_LOG`
//!
//! ```yaml
//! bind_address: "127.0.0.1:3000"
//! log_level: "info"
//! legacy_dump: "/home/me/Downloads/localStorage.json"
//! import:
//!   first_data_row: 6
//!   end_marker: "Nombre de filles"
//!   columns:
//!     email: 9
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::import::ImportLayout;

pub const CONFIG_FILE_NAME: &str = "camp-manager.yaml";
pub const ENV_DATA_DIR: &str = "CAMP_MANAGER_DATA_DIR";
pub const ENV_BIND: &str = "CAMP_MANAGER_BIND";
pub const ENV_LOG: &str = "CAMP_MANAGER_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_directory: PathBuf,
    pub database_file: String,
    pub bind_address: String,
    pub log_level: String,
    /// JSON dump of the legacy key space, migrated once on first run
    pub legacy_dump: Option<PathBuf>,
    pub allowed_origin: String,
    pub import: ImportLayout,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_directory: default_data_directory(),
            database_file: "camp-manager.db".to_string(),
            bind_address: "127.0.0.1:3000".to_string(),
            log_level: "info".to_string(),
            legacy_dump: None,
            allowed_origin: "http://localhost:8080".to_string(),
            import: ImportLayout::default(),
        }
    }
}

/// `~/Documents/Camp Manager`, falling back to the home directory and then
/// the working directory
fn default_data_directory() -> PathBuf {
    let base = dirs::document_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("Camp Manager")
}

impl AppConfig {
    /// Load the configuration using the process environment
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load the configuration, reading variables through `env`
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_directory = env(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_directory);

        let config_path = data_directory.join(CONFIG_FILE_NAME);
        let mut config = if config_path.exists() {
            Self::from_file(&config_path)?
        } else {
            debug!("No config file at {:?}, using defaults", config_path);
            Self::default()
        };

        // The directory the file was found in is authoritative
        config.data_directory = data_directory;
        if let Some(bind) = env(ENV_BIND) {
            config.bind_address = bind;
        }
        if let Some(level) = env(ENV_LOG) {
            config.log_level = level;
        }

        config.import.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let yaml_content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: AppConfig = serde_yaml::from_str(&yaml_content)
            .with_context(|| format!("Invalid config file {:?}", path))?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_directory.join(&self.database_file)
    }

    /// Create the data directory if it does not exist yet
    pub fn ensure_data_directory(&self) -> Result<()> {
        if !self.data_directory.exists() {
            fs::create_dir_all(&self.data_directory)
                .with_context(|| format!("Failed to create data directory {:?}", self.data_directory))?;
            info!("Created data directory: {:?}", self.data_directory);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, String)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_file() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().to_string_lossy().to_string();

        let config = AppConfig::load_with(env_from(&[(ENV_DATA_DIR, dir)])).unwrap();
        assert_eq!(config.data_directory, temp_dir.path());
        assert_eq!(config.database_path(), temp_dir.path().join("camp-manager.db"));
        assert_eq!(config.bind_address, "127.0.0.1:3000");
        assert_eq!(config.import, ImportLayout::default());
    }

    #[test]
    fn test_file_then_env_overrides() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "bind_address: \"0.0.0.0:4000\"\nlog_level: debug\nimport:\n  first_data_row: 2\n",
        )
        .unwrap();

        let dir = temp_dir.path().to_string_lossy().to_string();
        let config = AppConfig::load_with(env_from(&[
            (ENV_DATA_DIR, dir),
            (ENV_LOG, "warn".to_string()),
        ]))
        .unwrap();

        assert_eq!(config.bind_address, "0.0.0.0:4000");
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.import.first_data_row, 2);
        assert_eq!(config.import.end_marker, "Nombre de filles");
    }

    #[test]
    fn test_invalid_layout_in_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "import:\n  columns:\n    name: 9\n",
        )
        .unwrap();

        let dir = temp_dir.path().to_string_lossy().to_string();
        assert!(AppConfig::load_with(env_from(&[(ENV_DATA_DIR, dir)])).is_err());
    }

    #[test]
    fn test_ensure_data_directory() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig {
            data_directory: temp_dir.path().join("nested").join("Camp Manager"),
            ..Default::default()
        };
        config.ensure_data_directory().unwrap();
        assert!(config.data_directory.is_dir());
    }
}
