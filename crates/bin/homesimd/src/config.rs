//! Daemon configuration — TOML file with environment variable overrides.
//!
//! Looks for `homesimd.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::path::{Path, PathBuf};

use homesim_adapter_virtual::DeviceSpec;
use serde::Deserialize;

/// Default daemon configuration file.
pub const CONFIG_FILE: &str = "homesimd.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub simulation: SimulationSection,
    /// Devices of the simulated room. Empty means one of each kind.
    pub devices: Vec<DeviceSpec>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
    /// Optional log file, written in addition to the console.
    pub file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    /// Scenario file (`.toml` or `.json`). Built-in defaults when absent.
    pub scenario: Option<PathBuf>,
}

impl Config {
    /// Load configuration from [`CONFIG_FILE`] (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if
    /// the result is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file(Path::new(CONFIG_FILE))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HOMESIM_SCENARIO") {
            self.simulation.scenario = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("HOMESIM_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("HOMESIM_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::Validation(
                "logging filter must not be empty".to_string(),
            ));
        }
        if let Some(device) = self.devices.iter().find(|d| d.name.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "{} device without a name",
                device.kind
            )));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "homesimd=info,homesim=info,homesim_app=info".to_string(),
            file: None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
