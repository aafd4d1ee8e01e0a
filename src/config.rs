//! App Configuration
//!
//! JSON file next to the app data, with environment overrides.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_COLLECTION: &str = "LIVE_TODO_COLLECTION";
pub const ENV_LOG_FILTER: &str = "LIVE_TODO_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Used for log file names and log lines
    pub app_name: String,
    /// Document collection holding the todo items
    pub collection: String,
    /// Directory for rolling log files; stderr only when unset
    pub log_dir: Option<PathBuf>,
    /// `tracing` env-filter directive
    pub log_filter: String,
    pub max_log_bytes: u64,
    pub max_log_files: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "LiveTodo".to_string(),
            collection: "todos".to_string(),
            log_dir: None,
            log_filter: "info".to_string(),
            max_log_bytes: 1024 * 1024,
            max_log_files: 3,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AppConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults when the file does not exist yet
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        let json = serde_json::to_string_pretty(self)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `LIVE_TODO_COLLECTION` and `LIVE_TODO_LOG` when set, then
    /// validate the result
    pub fn apply_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(collection) = env::var(ENV_COLLECTION) {
            self.collection = collection;
        }
        if let Ok(filter) = env::var(ENV_LOG_FILTER) {
            self.log_filter = filter;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_name.trim().is_empty() {
            return Err(ConfigError::Invalid("app_name is empty".to_string()));
        }
        if self.collection.trim().is_empty() {
            return Err(ConfigError::Invalid("collection is empty".to_string()));
        }
        if self.max_log_files == 0 {
            return Err(ConfigError::Invalid("max_log_files must be at least 1".to_string()));
        }
        Ok(())
    }
}
