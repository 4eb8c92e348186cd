use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::types::Strategy;

pub const DEFAULT_LOG_FILTER: &str = "pc_signature=info,pcsig=info";

/// Environment variables with this prefix override file values, e.g. `PCSIG_DEFAULT_STRATEGY`.
pub const ENV_PREFIX: &str = "PCSIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Strategy used by `issue` when none is given.
    #[serde(default)]
    pub default_strategy: Strategy,

    /// Inventory snapshot to use instead of the live system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Config {
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pcsig")
            .join("config.toml")
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Reads `path` if it exists, then applies `PCSIG_*` environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(::config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to parse configuration")?;

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, config_str)
            .context("Failed to write config file")?;

        info!("Configuration saved to: {:?}", path);
        Ok(())
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.default_strategy, Strategy::Default);
        assert_eq!(config.inventory_file, None);
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config {
            default_strategy: Strategy::DiskLabel,
            inventory_file: Some(dir.path().join("inventory.toml")),
            log_filter: Some("debug".to_string()),
        };
        config.save(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.log_filter(), "debug");
    }

    #[test]
    fn test_hand_written_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_strategy = \"ip-address\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.default_strategy, Strategy::IpAddress);
    }

    #[test]
    fn test_invalid_strategy_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_strategy = \"serial\"\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
