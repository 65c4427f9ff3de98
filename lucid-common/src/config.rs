//! Configuration loading for LucidInvest services
//!
//! TOML config file with environment-variable overrides. Resolution order
//! for the file path: `LUCID_CONFIG` env var, then
//! `~/.config/lucidinvest/lucid-portal.toml`, then compiled defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Logging section of the TOML config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter level ("trace".."error")
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// TOML configuration for the portal service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// HTTP listen port (default 5810)
    pub port: Option<u16>,
    /// SQLite database path (default ./lucid.db)
    pub database_path: Option<String>,
    /// Gemini API key (lowest-priority source; see portal key resolution)
    pub gemini_api_key: Option<String>,
    /// Market data API key ("demo" tier works without one)
    pub market_api_key: Option<String>,
    /// Market data API base URL
    pub market_base_url: Option<String>,
    /// Fast model used for ticker selection and copywriting
    pub selection_model: Option<String>,
    /// Stronger model used for scenario analysis
    pub analysis_model: Option<String>,
    /// Day of month on which the scheduled sync fires (default 2)
    pub sync_day: Option<u32>,
    /// Analyses per reporting month (default 14)
    pub monthly_target_count: Option<usize>,
    /// Delay before each generation call, in milliseconds (default 15000)
    pub generation_delay_ms: Option<u64>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default configuration file path for the platform
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("LUCID_CONFIG") {
        return PathBuf::from(path);
    }

    dirs::config_dir()
        .map(|d| d.join("lucidinvest").join("lucid-portal.toml"))
        .unwrap_or_else(|| PathBuf::from("lucid-portal.toml"))
}

/// Load TOML config, falling back to defaults when the file is absent
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        tracing::debug!("Config file not found at {}, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Write TOML config, creating parent directories as needed
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("Create config dir failed: {}", e)))?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    std::fs::write(path, content)
        .map_err(|e| Error::Config(format!("Write TOML failed: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_toml_config(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.port, None);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn write_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("lucid-portal.toml");

        let config = TomlConfig {
            port: Some(6001),
            database_path: Some("/tmp/lucid-test.db".to_string()),
            gemini_api_key: Some("key-from-toml".to_string()),
            logging: LoggingConfig {
                level: "debug".to_string(),
            },
            ..TomlConfig::default()
        };

        write_toml_config(&config, &path).unwrap();
        let loaded = load_toml_config(&path).unwrap();

        assert_eq!(loaded.port, Some(6001));
        assert_eq!(loaded.gemini_api_key.as_deref(), Some("key-from-toml"));
        assert_eq!(loaded.logging.level, "debug");
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "port = \"not a number").unwrap();

        let err = load_toml_config(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
