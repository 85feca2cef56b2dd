//! Runtime configuration
//!
//! Values come from built-in defaults, then an optional JSON file, then
//! command-line flags (which may themselves come from `BLOBKEEP_*` variables).
//! The default file location is `<config dir>/blobkeep/config.json`.

use crate::model::HashCost;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATABASE: &str = "data.db";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3200;
pub const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Settings shared by the CLI and the HTTP server
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database file
    pub database: PathBuf,
    /// Listen host for `serve`
    pub host: String,
    /// Listen port for `serve`
    pub port: u16,
    /// bcrypt cost for new credential hashes
    pub hash_cost: HashCost,
    /// Largest accepted request body
    pub max_body_bytes: usize,
    /// Fallback `tracing` filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: PathBuf::from(DEFAULT_DATABASE),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            hash_cost: HashCost::DEFAULT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Load config from a JSON file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else from the default location if it
    /// exists, else fall back to defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// `<config dir>/blobkeep/config.json`, when the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("blobkeep").join("config.json"))
    }

    /// Reject values that cannot work
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::Config("port must be non-zero".into()));
        }
        if self.host.trim().is_empty() {
            return Err(Error::Config("host is empty".into()));
        }
        if self.max_body_bytes == 0 {
            return Err(Error::Config("max_body_bytes must be non-zero".into()));
        }
        Ok(())
    }

    /// `host:port` for the listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database, PathBuf::from("data.db"));
        assert_eq!(config.listen_addr(), "localhost:3200");
        assert_eq!(config.hash_cost, HashCost::DEFAULT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "port": 8080, "hash_cost": 4 }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.hash_cost, HashCost::MIN);
        assert_eq!(config.host, DEFAULT_HOST);
    }

    #[test]
    fn test_load_rejects_bad_values() {
        let dir = tempdir().unwrap();

        let path = dir.path().join("cost.json");
        std::fs::write(&path, r#"{ "hash_cost": 99 }"#).unwrap();
        assert!(matches!(Config::load(&path), Err(Error::Config(_))));

        let path = dir.path().join("port.json");
        std::fs::write(&path, r#"{ "port": 0 }"#).unwrap();
        assert!(matches!(Config::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_discover_explicit_missing_file_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(
            Config::discover(Some(path.as_path())),
            Err(Error::Config(_))
        ));
    }
}
