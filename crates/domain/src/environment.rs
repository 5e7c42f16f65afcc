//! Environment — the physical readings of the simulated home.
//!
//! [`EnvironmentState`] is a plain value. Ownership and exclusivity are the
//! application layer's business; this module only knows how a state changes
//! when an event delta lands on it or when it drifts toward its
//! time-of-day target.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::time::{self, MINUTES_PER_DAY};

/// Minute-of-day at which natural light appears.
const SUNRISE: u32 = 6 * 60;
/// Minute-of-day at which natural light is gone.
const SUNSET: u32 = 20 * 60;

/// Time-of-day bucket, derived from the simulated clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl Scenario {
    /// Bucket for an absolute simulated minute.
    ///
    /// Morning is 06–12, afternoon 12–18, evening 18–22, night 22–06.
    #[must_use]
    pub fn from_minute(minute: u32) -> Self {
        match time::hour_of_day(minute) {
            6..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            18..=21 => Self::Evening,
            _ => Self::Night,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Drift target for one [`Scenario`].
///
/// `variation` bounds the jitter added on every drift step, for both
/// temperature (°C) and humidity (%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioTarget {
    pub temperature: f64,
    pub humidity: f64,
    #[serde(default = "default_variation")]
    pub variation: f64,
}

fn default_variation() -> f64 {
    0.2
}

impl ScenarioTarget {
    #[must_use]
    pub fn morning() -> Self {
        Self {
            temperature: 21.0,
            humidity: 50.0,
            variation: 0.2,
        }
    }

    #[must_use]
    pub fn afternoon() -> Self {
        Self {
            temperature: 25.0,
            humidity: 45.0,
            variation: 0.3,
        }
    }

    #[must_use]
    pub fn evening() -> Self {
        Self {
            temperature: 22.0,
            humidity: 50.0,
            variation: 0.2,
        }
    }

    #[must_use]
    pub fn night() -> Self {
        Self {
            temperature: 19.0,
            humidity: 55.0,
            variation: 0.1,
        }
    }
}

/// One [`ScenarioTarget`] per [`Scenario`], as found under `[scenarios.*]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioTargets {
    #[serde(default = "ScenarioTarget::morning")]
    pub morning: ScenarioTarget,
    #[serde(default = "ScenarioTarget::afternoon")]
    pub afternoon: ScenarioTarget,
    #[serde(default = "ScenarioTarget::evening")]
    pub evening: ScenarioTarget,
    #[serde(default = "ScenarioTarget::night")]
    pub night: ScenarioTarget,
}

impl Default for ScenarioTargets {
    fn default() -> Self {
        Self {
            morning: ScenarioTarget::morning(),
            afternoon: ScenarioTarget::afternoon(),
            evening: ScenarioTarget::evening(),
            night: ScenarioTarget::night(),
        }
    }
}

impl ScenarioTargets {
    /// The same temperature and humidity target for every scenario.
    ///
    /// Used for flat configuration documents that only carry a single
    /// target pair.
    #[must_use]
    pub fn flat(temperature: f64, humidity: f64) -> Self {
        let with = |base: ScenarioTarget| ScenarioTarget {
            temperature,
            humidity,
            variation: base.variation,
        };
        Self {
            morning: with(ScenarioTarget::morning()),
            afternoon: with(ScenarioTarget::afternoon()),
            evening: with(ScenarioTarget::evening()),
            night: with(ScenarioTarget::night()),
        }
    }

    #[must_use]
    pub fn for_scenario(&self, scenario: Scenario) -> &ScenarioTarget {
        match scenario {
            Scenario::Morning => &self.morning,
            Scenario::Afternoon => &self.afternoon,
            Scenario::Evening => &self.evening,
            Scenario::Night => &self.night,
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (Scenario, &ScenarioTarget)> {
        [
            (Scenario::Morning, &self.morning),
            (Scenario::Afternoon, &self.afternoon),
            (Scenario::Evening, &self.evening),
            (Scenario::Night, &self.night),
        ]
        .into_iter()
    }
}

/// Additive change applied by an ordinary scheduled event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentDelta {
    pub temperature: f64,
    pub humidity: f64,
    pub co2: f64,
    pub occupancy: i32,
}

impl EnvironmentDelta {
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.temperature == 0.0 && self.humidity == 0.0 && self.co2 == 0.0 && self.occupancy == 0
    }
}

/// Current physical readings and the simulated clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentState {
    /// °C
    pub temperature: f64,
    /// %, always within `[0, 100]`
    pub humidity: f64,
    /// ppm, never negative
    pub co2: f64,
    /// lux contributed by daylight
    pub natural_light: f64,
    /// lux contributed by powered lights
    pub artificial_light: f64,
    pub occupancy: u32,
    /// Absolute simulated minute since the start of the run.
    pub minute: u32,
}

impl EnvironmentState {
    /// Total light intensity in lux.
    #[must_use]
    pub fn light_intensity(&self) -> f64 {
        self.natural_light + self.artificial_light
    }

    #[must_use]
    pub fn minute_of_day(&self) -> u32 {
        time::minute_of_day(self.minute)
    }

    #[must_use]
    pub fn scenario(&self) -> Scenario {
        Scenario::from_minute(self.minute)
    }

    /// `HH:MM` rendering of the clock.
    #[must_use]
    pub fn clock(&self) -> String {
        time::format_clock(self.minute)
    }

    /// Apply an event delta, keeping every reading within its domain.
    pub fn apply(&mut self, delta: &EnvironmentDelta) {
        self.temperature += delta.temperature;
        self.humidity = clamp_humidity(self.humidity + delta.humidity);
        self.co2 = (self.co2 + delta.co2).max(0.0);
        self.occupancy = self.occupancy.saturating_add_signed(delta.occupancy);
    }

    /// One step of natural drift toward `target`.
    ///
    /// The gap to the target shrinks by `rate` (exponential convergence)
    /// and a jitter of at most `target.variation` is added. `noise` holds
    /// two samples in `[-1, 1]` (temperature, humidity); out-of-range
    /// samples are clamped so the jitter stays bounded.
    pub fn drift_toward(&mut self, target: &ScenarioTarget, rate: f64, noise: (f64, f64)) {
        let rate = rate.clamp(0.0, 1.0);
        let jitter = |sample: f64| sample.clamp(-1.0, 1.0) * target.variation;

        self.temperature += (target.temperature - self.temperature) * rate + jitter(noise.0);
        self.humidity = clamp_humidity(
            self.humidity + (target.humidity - self.humidity) * rate + jitter(noise.1),
        );
    }
}

fn clamp_humidity(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Daylight in lux at the given absolute minute.
///
/// Zero outside 06:00–20:00, a half-sine in between peaking at 13:00.
#[must_use]
pub fn daylight_lux(minute: u32, peak_lux: f64) -> f64 {
    let of_day = minute % MINUTES_PER_DAY;
    if !(SUNRISE..SUNSET).contains(&of_day) {
        return 0.0;
    }
    let progress = f64::from(of_day - SUNRISE) / f64::from(SUNSET - SUNRISE);
    (peak_lux * (std::f64::consts::PI * progress).sin()).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> EnvironmentState {
        EnvironmentState {
            temperature: 22.0,
            humidity: 50.0,
            co2: 400.0,
            natural_light: 0.0,
            artificial_light: 0.0,
            occupancy: 1,
            minute: 0,
        }
    }

    #[test]
    fn should_bucket_scenarios_by_hour() {
        assert_eq!(Scenario::from_minute(0), Scenario::Night);
        assert_eq!(Scenario::from_minute(5 * 60 + 59), Scenario::Night);
        assert_eq!(Scenario::from_minute(6 * 60), Scenario::Morning);
        assert_eq!(Scenario::from_minute(12 * 60), Scenario::Afternoon);
        assert_eq!(Scenario::from_minute(18 * 60), Scenario::Evening);
        assert_eq!(Scenario::from_minute(22 * 60), Scenario::Night);
        assert_eq!(Scenario::from_minute(MINUTES_PER_DAY + 7 * 60), Scenario::Morning);
    }

    #[test]
    fn should_display_scenario_label() {
        assert_eq!(Scenario::Afternoon.to_string(), "afternoon");
    }

    #[test]
    fn should_apply_delta_and_clamp_readings() {
        let mut s = state();
        s.apply(&EnvironmentDelta {
            temperature: 3.0,
            humidity: 80.0,
            co2: -1000.0,
            occupancy: -5,
        });
        assert!((s.temperature - 25.0).abs() < f64::EPSILON);
        assert!((s.humidity - 100.0).abs() < f64::EPSILON);
        assert!(s.co2.abs() < f64::EPSILON);
        assert_eq!(s.occupancy, 0);
    }

    #[test]
    fn should_add_occupancy_from_delta() {
        let mut s = state();
        s.apply(&EnvironmentDelta {
            occupancy: 3,
            ..EnvironmentDelta::default()
        });
        assert_eq!(s.occupancy, 4);
    }

    #[test]
    fn should_converge_toward_target_without_overshoot_when_noise_is_zero() {
        let mut s = state();
        s.temperature = 30.0;
        let target = ScenarioTarget {
            temperature: 20.0,
            humidity: 50.0,
            variation: 0.5,
        };
        let mut previous = s.temperature;
        for _ in 0..200 {
            s.drift_toward(&target, 0.05, (0.0, 0.0));
            assert!(s.temperature <= previous);
            assert!(s.temperature >= 20.0);
            previous = s.temperature;
        }
        assert!((s.temperature - 20.0).abs() < 0.01);
    }

    #[test]
    fn should_bound_jitter_by_variation() {
        let mut s = state();
        let target = ScenarioTarget {
            temperature: 22.0,
            humidity: 50.0,
            variation: 0.2,
        };
        s.drift_toward(&target, 0.0, (5.0, -5.0));
        assert!((s.temperature - 22.2).abs() < 1e-9);
        assert!((s.humidity - 49.8).abs() < 1e-9);
    }

    #[test]
    fn should_keep_humidity_in_range_while_drifting() {
        let mut s = state();
        s.humidity = 99.95;
        let target = ScenarioTarget {
            temperature: 22.0,
            humidity: 100.0,
            variation: 1.0,
        };
        s.drift_toward(&target, 0.5, (0.0, 1.0));
        assert!(s.humidity <= 100.0);
    }

    #[test]
    fn should_have_no_daylight_at_night() {
        assert!(daylight_lux(0, 1000.0).abs() < f64::EPSILON);
        assert!(daylight_lux(5 * 60, 1000.0).abs() < f64::EPSILON);
        assert!(daylight_lux(21 * 60, 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_peak_daylight_at_one_pm() {
        let peak = daylight_lux(13 * 60, 1000.0);
        assert!((peak - 1000.0).abs() < 1e-6);
        assert!(daylight_lux(9 * 60, 1000.0) < peak);
        assert!(daylight_lux(17 * 60, 1000.0) < peak);
    }

    #[test]
    fn should_report_total_light_intensity() {
        let mut s = state();
        s.natural_light = 250.0;
        s.artificial_light = 120.0;
        assert!((s.light_intensity() - 370.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_build_flat_targets_keeping_variations() {
        let targets = ScenarioTargets::flat(23.0, 40.0);
        for (_, target) in targets.iter() {
            assert!((target.temperature - 23.0).abs() < f64::EPSILON);
            assert!((target.humidity - 40.0).abs() < f64::EPSILON);
        }
        assert!((targets.night.variation - 0.1).abs() < f64::EPSILON);
    }
}
