//! Reader configuration.

use crate::error::{ReaderError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default capacity of the industry factor cache.
pub const DEFAULT_INDUSTRY_CACHE_SIZE: usize = 5;

/// Get the default data directory.
///
/// Uses platform-specific data directories:
/// - Linux: `~/.local/share/asof/`
/// - macOS: `~/Library/Application Support/asof/`
/// - Windows: `%APPDATA%\asof\`
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("asof")
}

/// Get the default database path.
pub fn default_database_path() -> PathBuf {
    default_data_dir().join("asof.db")
}

/// Settings for [`DataReader`](crate::DataReader).
///
/// ```json
/// {"database": "/data/ashare.db", "industry_translation": null, "industry_cache_size": 5}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// SQLite database file
    pub database: PathBuf,
    /// Industry translation JSON; the packaged mapping is used when absent
    pub industry_translation: Option<PathBuf>,
    /// Number of industry factors kept alive
    pub industry_cache_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            database: default_database_path(),
            industry_translation: None,
            industry_cache_size: DEFAULT_INDUSTRY_CACHE_SIZE,
        }
    }
}

impl ReaderConfig {
    /// Configuration for the database at `path` with default settings.
    pub fn with_database<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            database: path.into(),
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Reject settings the reader cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.industry_cache_size == 0 {
            return Err(ReaderError::Config(
                "industry_cache_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
