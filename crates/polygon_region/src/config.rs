//! Configuration management for the region host.
//!
//! This module handles loading, validation, and conversion of host configuration
//! from TOML files and command-line arguments.

use region_engine::{EngineConfig, LoadFailurePolicy, RegionDefaults};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

fn default_storage_path() -> String {
    "regions.json".to_string()
}

fn default_autosave_interval() -> u64 {
    300
}

fn default_health_interval() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Region file settings
    #[serde(default)]
    pub storage: StorageSettings,
    /// Settings applied to regions confirmed from marker selections
    #[serde(default)]
    pub regions: RegionDefaults,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Periodic health reporting
    #[serde(default)]
    pub monitoring: MonitoringSettings,
}

/// Where regions are persisted and how often.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Path of the region document
    #[serde(default = "default_storage_path")]
    pub path: String,
    /// Seconds between automatic saves (0 disables autosave)
    #[serde(default = "default_autosave_interval")]
    pub autosave_interval_secs: u64,
    /// What to do when the region file cannot be decoded at startup
    #[serde(default)]
    pub on_load_error: LoadErrorAction,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            autosave_interval_secs: default_autosave_interval(),
            on_load_error: LoadErrorAction::default(),
        }
    }
}

/// Config-file spelling of [`LoadFailurePolicy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadErrorAction {
    #[default]
    Abort,
    StartEmpty,
}

impl From<LoadErrorAction> for LoadFailurePolicy {
    fn from(action: LoadErrorAction) -> Self {
        match action {
            LoadErrorAction::Abort => LoadFailurePolicy::Abort,
            LoadErrorAction::StartEmpty => LoadFailurePolicy::StartEmpty,
        }
    }
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringSettings {
    /// Seconds between health reports (0 disables them)
    #[serde(default = "default_health_interval")]
    pub health_interval_secs: u64,
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            health_interval_secs: default_health_interval(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file, writing the defaults to `path`
    /// first if it does not exist yet.
    pub async fn load_from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Builds the engine configuration from these settings.
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            storage_path: PathBuf::from(&self.storage.path),
            load_failure: self.storage.on_load_error.into(),
            defaults: self.regions.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.storage.path.trim().is_empty() {
            return Err("Storage path cannot be empty".to_string());
        }

        if !self.regions.min_y.is_finite() || !self.regions.max_y.is_finite() {
            return Err("Region default vertical bounds must be finite".to_string());
        }
        if self.regions.min_y > self.regions.max_y {
            return Err(format!(
                "Region default min_y ({}) must not exceed max_y ({})",
                self.regions.min_y, self.regions.max_y
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use region_engine::FlagState;
    use tempfile::NamedTempFile;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();

        assert_eq!(config.storage.path, "regions.json");
        assert_eq!(config.storage.autosave_interval_secs, 300);
        assert_eq!(config.storage.on_load_error, LoadErrorAction::Abort);

        assert_eq!(config.regions.min_y, -64.0);
        assert_eq!(config.regions.max_y, 320.0);
        assert_eq!(config.regions.priority, 0);
        assert_eq!(config.regions.flags.len(), 7);

        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert_eq!(config.monitoring.health_interval_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_from_nonexistent_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("polygon_region.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config.storage.path, "regions.json");

        // The defaults are written out and read back unchanged.
        assert!(path.exists());
        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded.regions, config.regions);
        assert_eq!(reloaded.storage.autosave_interval_secs, 300);
    }

    #[tokio::test]
    async fn test_load_from_existing_file() {
        let toml_content = r#"
[storage]
path = "/srv/world/regions.json"
autosave_interval_secs = 0
on_load_error = "start_empty"

[regions]
min_y = 0.0
max_y = 255.0
priority = 2

[regions.flags]
pvp = "deny"

[logging]
level = "debug"
json_format = true
"#;

        let temp_file = NamedTempFile::new().unwrap();
        tokio::fs::write(temp_file.path(), toml_content).await.unwrap();

        let config = AppConfig::load_from_file(&temp_file.path().to_path_buf())
            .await
            .unwrap();

        assert_eq!(config.storage.path, "/srv/world/regions.json");
        assert_eq!(config.storage.autosave_interval_secs, 0);
        assert_eq!(config.storage.on_load_error, LoadErrorAction::StartEmpty);
        assert_eq!(config.regions.max_y, 255.0);
        assert_eq!(config.regions.priority, 2);
        assert_eq!(config.regions.flags.len(), 1);
        assert_eq!(config.regions.flags.get("pvp"), Some(&FlagState::Deny));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
        assert_eq!(config.monitoring.health_interval_secs, 60);
    }

    #[tokio::test]
    async fn test_load_invalid_toml() {
        let temp_file = NamedTempFile::new().unwrap();
        tokio::fs::write(temp_file.path(), "[storage\npath = ")
            .await
            .unwrap();

        let result = AppConfig::load_from_file(&temp_file.path().to_path_buf()).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_to_engine_config_conversion() {
        let mut config = AppConfig::default();
        config.storage.path = "data/regions.json".to_string();
        config.storage.on_load_error = LoadErrorAction::StartEmpty;
        config.regions.priority = 9;

        let engine_config = config.to_engine_config();
        assert_eq!(engine_config.storage_path, PathBuf::from("data/regions.json"));
        assert_eq!(engine_config.load_failure, LoadFailurePolicy::StartEmpty);
        assert_eq!(engine_config.defaults.priority, 9);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = AppConfig::default();
        config.storage.path = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.regions.min_y = 100.0;
        config.regions.max_y = 10.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.regions.max_y = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_valid_log_levels() {
        let mut config = AppConfig::default();
        for level in ["trace", "debug", "info", "warn", "error"] {
            config.logging.level = level.to_string();
            assert!(config.validate().is_ok(), "level {level} should be valid");
        }
    }
}
