//! Application configuration loaded from TOML

use crate::forecast::ForecastConfig;
use crate::model::{ModelConfig, TrainingConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Market-data and news sources
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub yahoo_base_url: String,
    /// Read `<SYMBOL>.csv` files from here instead of calling Yahoo
    pub csv_dir: Option<PathBuf>,
    /// Lifetime of cached price histories, in seconds
    pub cache_ttl_secs: u64,
    /// Google News endpoint, used when no headline file is set
    pub news_base_url: String,
    /// JSON array of headlines for the sentiment view
    pub headlines_file: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            yahoo_base_url: "https://query1.finance.yahoo.com".to_string(),
            csv_dir: None,
            cache_ttl_secs: 3600,
            news_base_url: "https://news.google.com".to_string(),
            headlines_file: None,
        }
    }
}

impl DataConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub model: ModelConfig,
    pub training: TrainingConfig,
    pub forecast: ForecastConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Falls back to defaults when the file is missing or invalid
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{:#}; using default configuration", e);
                Self::default()
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::ScalerFit;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.forecast.sequence_length, 60);
        assert_eq!(config.forecast.max_horizon, 120);
        assert_eq!(config.training.epochs, 30);
        assert_eq!(config.model.lstm_units, vec![100, 50]);
        assert_eq!(config.data.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(config.data.news_base_url, "https://news.google.com");
        assert!(config.data.headlines_file.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.training.epochs = 12;
        config.model.seed = Some(99);
        config.forecast.scaler_fit = ScalerFit::TrainOnly;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.training.epochs, 12);
        assert_eq!(loaded.model.seed, Some(99));
        assert_eq!(loaded.forecast.scaler_fit, ScalerFit::TrainOnly);
    }

    #[test]
    fn test_partial_file() {
        let config: AppConfig = toml::from_str(
            r#"
            [forecast]
            scaler_fit = "train_only"

            [training]
            patience = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.forecast.scaler_fit, ScalerFit::TrainOnly);
        assert_eq!(config.forecast.sequence_length, 60);
        assert_eq!(config.training.patience, 3);
        assert_eq!(config.training.epochs, 30);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_or_default("/nonexistent/config.toml");
        assert_eq!(config.training.batch_size, 32);
    }
}
