//! Application configuration.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

const DEFAULT_BULLETIN_BASE_URL: &str = "https://www.cbr.ru";
const DEFAULT_TIMESERIES_BASE_URL: &str = "https://www.cbr.ru";

/// Which provider variant answers lookups. Selected here, at configuration
/// time; the cache manager never branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Bulletin,
    Timeseries,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BulletinProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TimeseriesProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub bulletin: Option<BulletinProviderConfig>,
    pub timeseries: Option<TimeseriesProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            bulletin: Some(BulletinProviderConfig {
                base_url: DEFAULT_BULLETIN_BASE_URL.to_string(),
            }),
            timeseries: Some(TimeseriesProviderConfig {
                base_url: DEFAULT_TIMESERIES_BASE_URL.to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Overrides the user-scoped cache directory.
    pub cache_path: Option<String>,
}

impl AppConfig {
    /// Loads the default config file, falling back to built-in defaults when
    /// none has been written yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "kurs")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Directory the rate store lives in.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.cache_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("in", "codito", "kurs")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.cache_dir().join("store"))
    }

    pub fn bulletin_base_url(&self) -> &str {
        self.providers
            .bulletin
            .as_ref()
            .map_or(DEFAULT_BULLETIN_BASE_URL, |p| &p.base_url)
    }

    pub fn timeseries_base_url(&self) -> &str {
        self.providers
            .timeseries
            .as_ref()
            .map_or(DEFAULT_TIMESERIES_BASE_URL, |p| &p.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
provider: timeseries

providers:
  bulletin:
    base_url: "http://localhost:8080"
  timeseries:
    base_url: "http://localhost:8081"

cache_path: "/tmp/kurs-test"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();

        assert_eq!(config.provider, ProviderKind::Timeseries);
        assert_eq!(config.bulletin_base_url(), "http://localhost:8080");
        assert_eq!(config.timeseries_base_url(), "http://localhost:8081");
        assert_eq!(config.cache_dir().unwrap(), PathBuf::from("/tmp/kurs-test"));
    }

    #[test]
    fn test_missing_sections_fall_back_to_defaults() {
        let config: AppConfig = serde_yaml::from_str("provider: bulletin").unwrap();

        assert_eq!(config.provider, ProviderKind::Bulletin);
        assert_eq!(config.bulletin_base_url(), DEFAULT_BULLETIN_BASE_URL);
        assert_eq!(config.timeseries_base_url(), DEFAULT_TIMESERIES_BASE_URL);
        assert!(config.cache_path.is_none());
    }

    #[test]
    fn test_default_provider_is_bulletin() {
        let config = AppConfig::default();
        assert_eq!(config.provider, ProviderKind::Bulletin);
    }
}
