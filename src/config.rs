//! Configuration management
//!
//! Handles loading of the JSON configuration file with environment variable
//! overrides for the logging section. Dwell and tick intervals are
//! constants, not configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::catalog::{Catalog, Item};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Replaces the built-in equipment catalog when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Vec<Item>>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from `path` if given, otherwise defaults plus environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let mut config = Config::default();
                config.apply_env_overrides();
                Ok(config)
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("DISPATCH_LOG_DIR") {
            if !dir.trim().is_empty() {
                self.logging.dir = dir;
            }
        }
        if let Ok(flag) = std::env::var("DISPATCH_FILE_LOGGING") {
            match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.logging.file_logging = true,
                "0" | "false" | "no" | "off" => self.logging.file_logging = false,
                _ => {}
            }
        }
    }

    /// Build the catalog, falling back to the built-in one
    pub fn catalog(&self) -> Result<Catalog> {
        match &self.catalog {
            Some(items) => Catalog::new(items.clone()).context("Invalid catalog in config"),
            None => Ok(Catalog::default()),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for log files
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Write a log file in addition to the console
    #[serde(default = "default_file_logging")]
    pub file_logging: bool,
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_file_logging() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            dir: default_log_dir(),
            file_logging: default_file_logging(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::path::PathBuf;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "order-dispatch-{}-{}.json",
            name,
            std::process::id()
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert!(config.catalog.is_none());
        assert_eq!(config.logging.dir, "logs");
        assert!(config.logging.file_logging);
        assert_eq!(config.catalog().unwrap(), Catalog::default());
    }

    #[test]
    fn test_catalog_override_from_file() {
        let path = write_temp(
            "catalog",
            r#"{
                "catalog": [
                    { "name": "Wheelchair", "purchase_price": "7500", "rental_price_per_hour": "35.5" }
                ],
                "logging": { "file_logging": false }
            }"#,
        );

        let config = Config::from_file(&path).unwrap();
        let catalog = config.catalog().unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(catalog.len(), 1);
        let chair = catalog.item_by_name("Wheelchair").unwrap();
        assert_eq!(chair.rental_price_per_hour, dec!(35.5));
        assert_eq!(config.logging.dir, "logs");
    }

    #[test]
    fn test_invalid_catalog_is_rejected() {
        let config: Config = serde_json::from_str(
            r#"{ "catalog": [ { "name": "Bad", "purchase_price": "-1", "rental_price_per_hour": "1" } ] }"#,
        )
        .unwrap();
        assert!(config.catalog().is_err());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = Config::from_file("/definitely/not/here.json").unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.json"));
    }
}
