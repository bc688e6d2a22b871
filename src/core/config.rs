use anyhow::{Context, Result};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DolarApiConfig {
    pub base_url: String,
}

impl Default for DolarApiConfig {
    fn default() -> Self {
        DolarApiConfig {
            base_url: "https://dolarapi.com".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ExchangeConfig {
    #[serde(default)]
    pub provider: DolarApiConfig,
    /// ARS per USD used whenever no quote can be obtained.
    #[serde(default = "default_rate")]
    pub default_rate: Decimal,
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: u64,
}

fn default_rate() -> Decimal {
    Decimal::from(1200)
}

fn default_ttl_minutes() -> u64 {
    60
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        ExchangeConfig {
            provider: DolarApiConfig::default(),
            default_rate: default_rate(),
            ttl_minutes: default_ttl_minutes(),
        }
    }
}

impl ExchangeConfig {
    pub fn rate_ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_minutes.saturating_mul(60))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub exchange: ExchangeConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    /// Loads the config at the default location, or defaults when there
    /// is no file there yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("ar", "tripsplit", "tripsplit")
            .context("Could not determine project directories")
    }

    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    /// Where the fjall keyspace lives.
    pub fn db_path(&self) -> Result<PathBuf> {
        Ok(self.default_data_path()?.join("db"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
