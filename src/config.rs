//! Configuration loading and management.
//!
//! Configuration is read from YAML. `load_or_default` looks for
//! `.workbasket/config.yaml` in the working directory, then
//! `~/.workbasket/config.yaml`, and finally applies environment overrides:
//!
//! - `WORKBASKET_DB_PATH` - Database path
//! - `WORKBASKET_CONNECTION_MODE` - participate, autocommit or explicit
//! - `WORKBASKET_SECURITY_ENABLED` - true/false
//! - `WORKBASKET_PRINCIPAL` - Principal calls are made on behalf of
//! - `WORKBASKET_LOG_LEVEL` - Log filter (e.g. `info`, `workbasket_engine=debug`)

use crate::error::{EngineError, Result};
use crate::types::ConnectionManagementMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// How long a connection waits on a locked database.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Use a private in-memory database instead of `path`.
    #[serde(default)]
    pub in_memory: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            in_memory: false,
        }
    }
}

impl DatabaseConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".workbasket/workbaskets.db")
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

/// Transaction and security behaviour of the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Initial connection management mode.
    #[serde(default)]
    pub connection_mode: ConnectionManagementMode,

    /// Enforce access-control checks on mutating calls.
    #[serde(default)]
    pub security_enabled: bool,

    /// Principal calls are made on behalf of.
    #[serde(default)]
    pub principal: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Load configuration from default locations or return defaults, then
    /// apply environment overrides.
    pub fn load_or_default() -> Self {
        let mut config = Self::candidate_paths()
            .into_iter()
            .find_map(|path| Self::load(path).ok())
            .unwrap_or_default();

        config.apply_env_overrides();
        config
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".workbasket/config.yaml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".workbasket").join("config.yaml"));
        }
        paths
    }

    /// Apply `WORKBASKET_*` environment variables on top of this config.
    /// Unparseable values are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(db_path) = lookup("WORKBASKET_DB_PATH") {
            self.database.path = PathBuf::from(db_path);
        }

        if let Some(mode) = lookup("WORKBASKET_CONNECTION_MODE") {
            match mode.parse() {
                Ok(mode) => self.engine.connection_mode = mode,
                Err(e) => tracing::warn!("Ignoring WORKBASKET_CONNECTION_MODE: {}", e),
            }
        }

        if let Some(enabled) = lookup("WORKBASKET_SECURITY_ENABLED") {
            match enabled.parse() {
                Ok(enabled) => self.engine.security_enabled = enabled,
                Err(_) => tracing::warn!(
                    "Ignoring WORKBASKET_SECURITY_ENABLED: expected true or false, got '{}'",
                    enabled
                ),
            }
        }

        if let Some(principal) = lookup("WORKBASKET_PRINCIPAL") {
            self.engine.principal = Some(principal);
        }

        if let Some(level) = lookup("WORKBASKET_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.database.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| EngineError::Config(format!("{}: {}", parent.display(), e)))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database.path, PathBuf::from(".workbasket/workbaskets.db"));
        assert_eq!(config.database.busy_timeout(), Duration::from_millis(5000));
        assert_eq!(config.engine.connection_mode, ConnectionManagementMode::Participate);
        assert!(!config.engine.security_enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = Config::from_yaml(
            "engine:\n  connection_mode: autocommit\n  security_enabled: true\n  principal: Arthur Dent\n",
        )
        .unwrap();

        assert_eq!(config.engine.connection_mode, ConnectionManagementMode::Autocommit);
        assert!(config.engine.security_enabled);
        assert_eq!(config.engine.principal.as_deref(), Some("Arthur Dent"));
        assert_eq!(config.database.busy_timeout_ms, 5000);
    }

    #[test]
    fn test_invalid_mode_is_config_error() {
        let err = Config::from_yaml("engine:\n  connection_mode: managed\n").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("WORKBASKET_DB_PATH", "/tmp/wb.db"),
            ("WORKBASKET_CONNECTION_MODE", "explicit"),
            ("WORKBASKET_SECURITY_ENABLED", "true"),
            ("WORKBASKET_PRINCIPAL", "Zaphod Beeblebrox"),
        ]);

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, PathBuf::from("/tmp/wb.db"));
        assert_eq!(config.engine.connection_mode, ConnectionManagementMode::Explicit);
        assert!(config.engine.security_enabled);
        assert_eq!(config.engine.principal.as_deref(), Some("Zaphod Beeblebrox"));
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            "WORKBASKET_CONNECTION_MODE" => Some("sometimes".to_string()),
            "WORKBASKET_SECURITY_ENABLED" => Some("yes".to_string()),
            _ => None,
        });

        assert_eq!(config.engine.connection_mode, ConnectionManagementMode::Participate);
        assert!(!config.engine.security_enabled);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "database:\n  in_memory: true\nlogging:\n  level: debug\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.database.in_memory);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = Config::load("/nonexistent/workbasket/config.yaml").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
