//! Configuration management for the EasyTravel administration tool.
//!
//! The TOML file has two tables: `[logging]` for this tool and `[travel]`,
//! the same [`TravelConfig`] the plugin runtime reads. A missing file is
//! created with defaults on first use.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use travelport_system::TravelConfig;

fn default_log_level() -> String {
    "info".to_string()
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
    /// TravelPort settings shared with the plugin
    #[serde(default)]
    pub travel: TravelConfig,
}

/// Logging system configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at the
    /// specified path and returns the default configuration.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The loaded or default configuration, or an error if loading/creation failed.
    pub fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            std::fs::write(path, toml_content)?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error string describing the issue.
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        self.travel.validate().map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert_eq!(config.travel.ports_file, "travelports.txt");
        assert_eq!(config.travel.depart_delay_ticks, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("easytravel.toml");

        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());

        let reloaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[logging]
level = "debug"

[travel]
ports_file = "/srv/minecraft/plugins/EasyTravel/ports.txt"
refund_on_cancel = false

[travel.messages]
arrived = "Welcome to {{name}}!"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.json_format);
        assert_eq!(config.travel.ports_file, "/srv/minecraft/plugins/EasyTravel/ports.txt");
        assert!(!config.travel.refund_on_cancel);
        assert_eq!(config.travel.arrival_notice_delay_ticks, 20);
        assert_eq!(config.travel.messages.arrived, "Welcome to {name}!");
        assert_eq!(config.travel.messages.departing, "Departing from {name}...");
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "warn".to_string();
        config.travel.ports_file = " ".to_string();
        let error = config.validate().unwrap_err();
        assert!(error.contains("ports_file"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[logging\nlevel = ").unwrap();
        assert!(AppConfig::load_from_file(file.path()).is_err());
    }
}
