//! Simulation configuration — the typed content of a scenario file.
//!
//! Every section is `#[serde(default)]`, so a document only needs to carry
//! what it changes. [`SimulationConfig::validate`] is the single gate
//! between a parsed document and a running simulation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::automation::AutomationRules;
use crate::environment::{self, EnvironmentDelta, EnvironmentState, ScenarioTargets};
use crate::error::ValidationError;
use crate::hazard::HazardKind;
use crate::schedule::{EventEffect, ScheduledEvent};
use crate::time::MINUTES_PER_DAY;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub environment: EnvironmentConfig,
    pub scenarios: ScenarioTargets,
    pub automation: AutomationRules,
    pub emergency: EmergencyConfig,
    pub timing: TimingConfig,
    pub events: Vec<EventConfig>,
}

/// Initial readings and drift tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub temperature: f64,
    pub humidity: f64,
    pub co2: f64,
    pub occupancy: u32,
    /// Fraction of the gap to the scenario target closed per drift tick.
    pub convergence_rate: f64,
    /// Daylight at 13:00, in lux.
    pub peak_daylight: f64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            temperature: 22.0,
            humidity: 50.0,
            co2: 400.0,
            occupancy: 1,
            convergence_rate: 0.05,
            peak_daylight: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyConfig {
    /// CO2 above this value (ppm) enters emergency mode.
    pub co2_threshold: f64,
    /// Simulated minutes before a CO2 emergency recovers.
    pub duration_minutes: u32,
    /// CO2 value restored on recovery.
    pub nominal_co2: f64,
    /// Temperature above which the high-temperature hazard is raised.
    pub high_temperature_threshold: Option<f64>,
}

impl Default for EmergencyConfig {
    fn default() -> Self {
        Self {
            co2_threshold: 1000.0,
            duration_minutes: 10,
            nominal_co2: 400.0,
            high_temperature_threshold: None,
        }
    }
}

/// Wall-clock pacing of the control loops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Minute of day the clock starts at, below [`MINUTES_PER_DAY`]. The
    /// clock keeps counting past midnight.
    pub start_minute: u32,
    /// Simulated minutes after which the run ends.
    pub duration_minutes: u32,
    /// Real time per simulated minute.
    pub minute_tick_ms: u64,
    pub drift_tick_ms: u64,
    pub sensor_tick_ms: u64,
    pub light_tick_ms: u64,
    pub ac_tick_ms: u64,
    pub automation_tick_ms: u64,
    pub emergency_tick_ms: u64,
    pub logging_tick_ms: u64,
    /// Simulated minutes between two status reports.
    pub report_every_minutes: u32,
    /// Seed for drift jitter. Random when absent.
    pub seed: Option<u64>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            start_minute: 0,
            duration_minutes: 1440,
            minute_tick_ms: 100,
            drift_tick_ms: 100,
            sensor_tick_ms: 100,
            light_tick_ms: 100,
            ac_tick_ms: 100,
            automation_tick_ms: 50,
            emergency_tick_ms: 50,
            logging_tick_ms: 100,
            report_every_minutes: 30,
            seed: None,
        }
    }
}

impl TimingConfig {
    #[must_use]
    pub fn minute_tick(&self) -> Duration {
        Duration::from_millis(self.minute_tick_ms)
    }

    /// Absolute minute at which the run ends.
    #[must_use]
    pub fn end_minute(&self) -> u32 {
        self.start_minute.saturating_add(self.duration_minutes)
    }

    fn intervals(&self) -> [(&'static str, u64); 8] {
        [
            ("timing.minute_tick_ms", self.minute_tick_ms),
            ("timing.drift_tick_ms", self.drift_tick_ms),
            ("timing.sensor_tick_ms", self.sensor_tick_ms),
            ("timing.light_tick_ms", self.light_tick_ms),
            ("timing.ac_tick_ms", self.ac_tick_ms),
            ("timing.automation_tick_ms", self.automation_tick_ms),
            ("timing.emergency_tick_ms", self.emergency_tick_ms),
            ("timing.logging_tick_ms", self.logging_tick_ms),
        ]
    }
}

/// One `[[events]]` entry as written in a scenario file.
///
/// Either a hazard seed (`hazard = "fire"`) or an ordinary event carrying
/// `delta_*` fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub name: String,
    pub trigger_time: u32,
    pub delta_temperature: f64,
    pub delta_humidity: f64,
    pub delta_co2: f64,
    pub delta_occupancy: i32,
    pub hazard: Option<HazardKind>,
}

impl EventConfig {
    fn delta(&self) -> EnvironmentDelta {
        EnvironmentDelta {
            temperature: self.delta_temperature,
            humidity: self.delta_humidity,
            co2: self.delta_co2,
            occupancy: self.delta_occupancy,
        }
    }

    /// Turn the entry into a validated [`ScheduledEvent`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] for a blank name and
    /// [`ValidationError::HazardWithDeltas`] for a hazard seed that also
    /// carries deltas.
    pub fn to_scheduled(&self) -> Result<ScheduledEvent, ValidationError> {
        let delta = self.delta();
        let effect = match self.hazard {
            Some(_) if !delta.is_zero() => {
                return Err(ValidationError::HazardWithDeltas {
                    name: self.name.clone(),
                });
            }
            Some(kind) => EventEffect::Hazard(kind),
            None => EventEffect::Delta(delta),
        };
        ScheduledEvent::new(self.name.clone(), self.trigger_time, effect)
    }
}

impl SimulationConfig {
    /// Check every invariant a run depends on.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let env = &self.environment;
        check_humidity("environment.humidity", env.humidity)?;
        check_non_negative("environment.co2", env.co2)?;
        check_non_negative("environment.peak_daylight", env.peak_daylight)?;
        if !(0.0..=1.0).contains(&env.convergence_rate) {
            return Err(ValidationError::OutOfRange {
                field: "environment.convergence_rate",
                min: 0.0,
                max: 1.0,
                value: env.convergence_rate,
            });
        }

        for (_, target) in self.scenarios.iter() {
            check_humidity("scenarios.humidity", target.humidity)?;
            check_non_negative("scenarios.variation", target.variation)?;
        }

        self.automation.validate()?;

        let emergency = &self.emergency;
        if emergency.co2_threshold <= 0.0 {
            return Err(ValidationError::NotPositive {
                field: "emergency.co2_threshold",
            });
        }
        if emergency.duration_minutes == 0 {
            return Err(ValidationError::NotPositive {
                field: "emergency.duration_minutes",
            });
        }
        check_non_negative("emergency.nominal_co2", emergency.nominal_co2)?;

        let timing = &self.timing;
        if timing.start_minute >= MINUTES_PER_DAY {
            return Err(ValidationError::OutOfRange {
                field: "timing.start_minute",
                min: 0.0,
                max: f64::from(MINUTES_PER_DAY - 1),
                value: f64::from(timing.start_minute),
            });
        }
        if timing.duration_minutes == 0 {
            return Err(ValidationError::NotPositive {
                field: "timing.duration_minutes",
            });
        }
        if timing.report_every_minutes == 0 {
            return Err(ValidationError::NotPositive {
                field: "timing.report_every_minutes",
            });
        }
        for (field, millis) in timing.intervals() {
            if millis == 0 {
                return Err(ValidationError::NotPositive { field });
            }
        }

        for event in &self.events {
            event.to_scheduled()?;
        }
        Ok(())
    }

    /// Events in configuration order.
    ///
    /// # Errors
    ///
    /// Returns the first invalid entry's [`ValidationError`].
    pub fn schedule(&self) -> Result<Vec<ScheduledEvent>, ValidationError> {
        self.events.iter().map(EventConfig::to_scheduled).collect()
    }

    /// Readings before the first tick.
    #[must_use]
    pub fn initial_state(&self) -> EnvironmentState {
        let start = self.timing.start_minute;
        EnvironmentState {
            temperature: self.environment.temperature,
            humidity: self.environment.humidity,
            co2: self.environment.co2,
            natural_light: environment::daylight_lux(start, self.environment.peak_daylight),
            artificial_light: 0.0,
            occupancy: self.environment.occupancy,
            minute: start,
        }
    }
}

fn check_humidity(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            min: 0.0,
            max: 100.0,
            value,
        })
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            min: 0.0,
            max: f64::INFINITY,
            value,
        })
    }
}
