//! Scenario file loading.
//!
//! The format follows the file extension: `.toml` or `.json`. A JSON
//! document may also use the flat shape with top-level
//! `target_temperature` / `target_humidity` keys, which seed both the
//! initial readings and every scenario target.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use homesim_domain::config::SimulationConfig;
use homesim_domain::environment::ScenarioTargets;
use homesim_domain::error::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML scenario")]
    Toml(#[from] toml::de::Error),
    #[error("failed to parse JSON scenario")]
    Json(#[from] serde_json::Error),
    #[error("invalid scenario: {0}")]
    Validation(#[from] ValidationError),
    #[error("unsupported scenario format {0:?}, expected .toml or .json")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    /// Pick the format from the file extension.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat(extension)),
        }
    }
}

/// JSON document, possibly in the flat shape.
#[derive(Deserialize)]
struct JsonDocument {
    #[serde(flatten)]
    config: SimulationConfig,
    target_temperature: Option<f64>,
    target_humidity: Option<f64>,
}

impl JsonDocument {
    fn into_config(self) -> SimulationConfig {
        let mut config = self.config;
        if self.target_temperature.is_none() && self.target_humidity.is_none() {
            return config;
        }
        let temperature = self
            .target_temperature
            .unwrap_or(config.environment.temperature);
        let humidity = self.target_humidity.unwrap_or(config.environment.humidity);
        config.environment.temperature = temperature;
        config.environment.humidity = humidity;
        config.scenarios = ScenarioTargets::flat(temperature, humidity);
        config
    }
}

/// Parse and validate a scenario document.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the document is malformed or invalid.
pub fn parse(content: &str, format: Format) -> Result<SimulationConfig, ConfigError> {
    let config = match format {
        Format::Toml => toml::from_str::<SimulationConfig>(content)?,
        Format::Json => serde_json::from_str::<JsonDocument>(content)?.into_config(),
    };
    config.validate()?;
    Ok(config)
}

/// Read, parse and validate the scenario file at `path`.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file is missing, malformed or invalid.
pub fn load(path: &Path) -> Result<SimulationConfig, ConfigError> {
    let format = Format::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse(&content, format)?;
    tracing::debug!(
        path = %path.display(),
        events = config.events.len(),
        "scenario loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use homesim_domain::hazard::HazardKind;

    #[test]
    fn should_pick_format_from_extension() {
        assert_eq!(
            Format::from_path(Path::new("day.toml")).unwrap(),
            Format::Toml
        );
        assert_eq!(
            Format::from_path(Path::new("env/DAY.JSON")).unwrap(),
            Format::Json
        );
        assert!(matches!(
            Format::from_path(Path::new("day.yaml")),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == "yaml"
        ));
    }

    #[test]
    fn should_parse_empty_toml_with_defaults() {
        let config = parse("", Format::Toml).unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = r#"
            [environment]
            temperature = 20.5
            humidity = 45.0
            occupancy = 2

            [scenarios.night]
            temperature = 18.0
            humidity = 60.0
            variation = 0.05

            [emergency]
            co2_threshold = 1200.0
            high_temperature_threshold = 35.0

            [timing]
            start_minute = 360
            duration_minutes = 120
            seed = 42

            [[events]]
            name = "cooking"
            trigger_time = 420
            delta_temperature = 1.5
            delta_co2 = 150.0

            [[events]]
            name = "kitchen fire"
            trigger_time = 450
            hazard = "fire"
        "#;

        let config = parse(toml, Format::Toml).unwrap();

        assert!((config.environment.temperature - 20.5).abs() < f64::EPSILON);
        assert_eq!(config.environment.occupancy, 2);
        assert!((config.scenarios.night.temperature - 18.0).abs() < f64::EPSILON);
        assert!((config.scenarios.morning.temperature - 21.0).abs() < f64::EPSILON);
        assert_eq!(config.emergency.high_temperature_threshold, Some(35.0));
        assert_eq!(config.timing.start_minute, 360);
        assert_eq!(config.timing.seed, Some(42));
        assert_eq!(config.events.len(), 2);
        assert_eq!(config.events[1].hazard, Some(HazardKind::Fire));
    }

    #[test]
    fn should_accept_flat_json_document() {
        let json = r#"{
            "target_temperature": 24.0,
            "target_humidity": 40.0,
            "events": [
                { "name": "party", "trigger_time": 1200, "delta_co2": 300.0, "delta_occupancy": 5 }
            ]
        }"#;

        let config = parse(json, Format::Json).unwrap();

        assert!((config.environment.temperature - 24.0).abs() < f64::EPSILON);
        assert!((config.environment.humidity - 40.0).abs() < f64::EPSILON);
        assert!((config.scenarios.afternoon.temperature - 24.0).abs() < f64::EPSILON);
        assert!((config.scenarios.night.humidity - 40.0).abs() < f64::EPSILON);
        assert_eq!(config.events[0].delta_occupancy, 5);
    }

    #[test]
    fn should_start_from_flat_targets() {
        let json = r#"{ "target_temperature": 22.0, "target_humidity": 50.0 }"#;

        let state = parse(json, Format::Json).unwrap().initial_state();

        assert!((state.temperature - 22.0).abs() < f64::EPSILON);
        assert!((state.humidity - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_parse_sectioned_json_document() {
        let json = r#"{ "environment": { "temperature": 19.0 }, "timing": { "duration_minutes": 60 } }"#;

        let config = parse(json, Format::Json).unwrap();

        assert!((config.environment.temperature - 19.0).abs() < f64::EPSILON);
        assert_eq!(config.timing.duration_minutes, 60);
        assert_eq!(config.scenarios, ScenarioTargets::default());
    }

    #[test]
    fn should_reject_invalid_values() {
        let result = parse("[environment]\nhumidity = 140.0\n", Format::Toml);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_hazard_with_deltas() {
        let toml = r#"
            [[events]]
            name = "odd"
            trigger_time = 10
            hazard = "gas_leak"
            delta_co2 = 50.0
        "#;
        let result = parse(toml, Format::Toml);
        assert!(matches!(
            result,
            Err(ConfigError::Validation(ValidationError::HazardWithDeltas { .. }))
        ));
    }

    #[test]
    fn should_report_malformed_documents() {
        assert!(matches!(
            parse("invalid {{{", Format::Toml),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            parse("{ not json", Format::Json),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn should_report_missing_file() {
        let result = load(Path::new("/nonexistent/scenario.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
