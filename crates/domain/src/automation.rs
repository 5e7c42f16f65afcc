//! Automation rules — a pure function from environment to actuator plan.
//!
//! [`evaluate`] holds no state. Precedence per actuator type, strongest
//! first: occupancy override, CO2 bias, temperature/humidity band, light
//! band.

use serde::{Deserialize, Serialize};

use crate::device::{AcMode, MAX_AC_SPEED};
use crate::environment::EnvironmentState;
use crate::error::ValidationError;

/// Tunable thresholds and outputs of the automation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationRules {
    /// Above this temperature the AC cools.
    pub hot_threshold: f64,
    /// Below this temperature the AC heats.
    pub cold_threshold: f64,
    pub cool_target: f64,
    pub cool_speed: u8,
    pub heat_target: f64,
    pub heat_speed: u8,
    pub comfort_target: f64,
    pub comfort_speed: u8,
    pub humid_threshold: f64,
    pub dry_threshold: f64,
    /// Subtracted from (humid) or added to (dry) the band target.
    pub humidity_adjustment: f64,
    pub dim_lux: f64,
    pub bright_lux: f64,
    pub dim_brightness: u8,
    pub bright_brightness: u8,
    pub default_brightness: u8,
    /// Occupancy strictly above this count forces full ventilation and light.
    pub crowd_threshold: u32,
    pub crowd_brightness: u8,
    pub co2_bias_threshold: f64,
    /// Half-width of the idle band around the AC target.
    pub deadband: f64,
}

impl Default for AutomationRules {
    fn default() -> Self {
        Self {
            hot_threshold: 28.0,
            cold_threshold: 18.0,
            cool_target: 24.0,
            cool_speed: 3,
            heat_target: 26.0,
            heat_speed: 2,
            comfort_target: 22.0,
            comfort_speed: 1,
            humid_threshold: 70.0,
            dry_threshold: 40.0,
            humidity_adjustment: 1.0,
            dim_lux: 300.0,
            bright_lux: 800.0,
            dim_brightness: 80,
            bright_brightness: 20,
            default_brightness: 50,
            crowd_threshold: 3,
            crowd_brightness: 80,
            co2_bias_threshold: 1000.0,
            deadband: 0.5,
        }
    }
}

impl AutomationRules {
    /// Validate thresholds and output ranges.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when a speed or brightness is out of
    /// range, the deadband is negative or the bands overlap.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, speed) in [
            ("automation.cool_speed", self.cool_speed),
            ("automation.heat_speed", self.heat_speed),
            ("automation.comfort_speed", self.comfort_speed),
        ] {
            check_at_most(field, speed, MAX_AC_SPEED)?;
        }
        for (field, brightness) in [
            ("automation.dim_brightness", self.dim_brightness),
            ("automation.bright_brightness", self.bright_brightness),
            ("automation.default_brightness", self.default_brightness),
            ("automation.crowd_brightness", self.crowd_brightness),
        ] {
            check_at_most(field, brightness, crate::device::MAX_BRIGHTNESS)?;
        }
        if self.deadband < 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "automation.deadband",
                min: 0.0,
                max: f64::INFINITY,
                value: self.deadband,
            });
        }
        if self.cold_threshold > self.hot_threshold {
            return Err(ValidationError::OutOfRange {
                field: "automation.cold_threshold",
                min: f64::NEG_INFINITY,
                max: self.hot_threshold,
                value: self.cold_threshold,
            });
        }
        Ok(())
    }
}

fn check_at_most(field: &'static str, value: u8, max: u8) -> Result<(), ValidationError> {
    if value > max {
        return Err(ValidationError::OutOfRange {
            field,
            min: 0.0,
            max: f64::from(max),
            value: f64::from(value),
        });
    }
    Ok(())
}

/// Desired state of every air conditioner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcSetting {
    pub power: bool,
    pub mode: AcMode,
    pub target_temperature: f64,
    pub speed: u8,
}

/// Desired state of every light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightSetting {
    pub on: bool,
    pub brightness: u8,
}

impl LightSetting {
    #[must_use]
    pub fn off() -> Self {
        Self {
            on: false,
            brightness: 0,
        }
    }

    #[must_use]
    pub fn at(brightness: u8) -> Self {
        Self {
            on: brightness > 0,
            brightness,
        }
    }
}

/// Output of one rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActuatorPlan {
    pub ac: AcSetting,
    pub light: LightSetting,
}

/// Evaluate the rules against a consistent environment snapshot.
#[must_use]
pub fn evaluate(state: &EnvironmentState, rules: &AutomationRules) -> ActuatorPlan {
    ActuatorPlan {
        ac: plan_ac(state, rules),
        light: plan_light(state, rules),
    }
}

fn plan_ac(state: &EnvironmentState, rules: &AutomationRules) -> AcSetting {
    let (mut target, mut speed) = if state.temperature > rules.hot_threshold {
        (rules.cool_target, rules.cool_speed)
    } else if state.temperature < rules.cold_threshold {
        (rules.heat_target, rules.heat_speed)
    } else {
        (rules.comfort_target, rules.comfort_speed)
    };

    if state.humidity > rules.humid_threshold {
        target -= rules.humidity_adjustment;
    } else if state.humidity < rules.dry_threshold {
        target += rules.humidity_adjustment;
    }

    let mut mode = if state.temperature > target + rules.deadband {
        AcMode::Cool
    } else if state.temperature < target - rules.deadband {
        AcMode::Heat
    } else {
        AcMode::Off
    };

    if state.occupancy == 0 {
        mode = AcMode::Off;
        speed = 0;
    } else if state.occupancy > rules.crowd_threshold || state.co2 > rules.co2_bias_threshold {
        speed = MAX_AC_SPEED;
        if mode == AcMode::Off {
            // ventilate
            mode = AcMode::Cool;
        }
    } else if mode == AcMode::Off {
        speed = 0;
    }

    AcSetting {
        power: mode != AcMode::Off,
        mode,
        target_temperature: target,
        speed,
    }
}

fn plan_light(state: &EnvironmentState, rules: &AutomationRules) -> LightSetting {
    if state.occupancy == 0 {
        return LightSetting::off();
    }
    if state.occupancy > rules.crowd_threshold {
        return LightSetting::at(rules.crowd_brightness);
    }
    // Artificial light is left out so the lights do not chase their own output.
    let lux = state.natural_light;
    if lux < rules.dim_lux {
        LightSetting::at(rules.dim_brightness)
    } else if lux > rules.bright_lux {
        LightSetting::at(rules.bright_brightness)
    } else {
        LightSetting::at(rules.default_brightness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(temperature: f64) -> EnvironmentState {
        EnvironmentState {
            temperature,
            humidity: 50.0,
            co2: 400.0,
            natural_light: 500.0,
            artificial_light: 0.0,
            occupancy: 1,
            minute: 600,
        }
    }

    #[test]
    fn should_cool_hot_room_to_24_at_full_speed() {
        let plan = evaluate(&state(30.0), &AutomationRules::default());
        assert_eq!(plan.ac.mode, AcMode::Cool);
        assert!(plan.ac.power);
        assert_eq!(plan.ac.speed, 3);
        assert!((plan.ac.target_temperature - 24.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_heat_cold_room_to_26_at_speed_2() {
        let plan = evaluate(&state(15.0), &AutomationRules::default());
        assert_eq!(plan.ac.mode, AcMode::Heat);
        assert_eq!(plan.ac.speed, 2);
        assert!((plan.ac.target_temperature - 26.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_run_comfort_band_at_speed_1() {
        let plan = evaluate(&state(25.0), &AutomationRules::default());
        assert_eq!(plan.ac.mode, AcMode::Cool);
        assert_eq!(plan.ac.speed, 1);
        assert!((plan.ac.target_temperature - 22.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_idle_inside_deadband() {
        let plan = evaluate(&state(22.3), &AutomationRules::default());
        assert_eq!(plan.ac.mode, AcMode::Off);
        assert!(!plan.ac.power);
        assert_eq!(plan.ac.speed, 0);
    }

    #[test]
    fn should_lower_target_when_humid_and_raise_when_dry() {
        let mut humid = state(25.0);
        humid.humidity = 75.0;
        let plan = evaluate(&humid, &AutomationRules::default());
        assert!((plan.ac.target_temperature - 21.0).abs() < f64::EPSILON);

        let mut dry = state(30.0);
        dry.humidity = 30.0;
        let plan = evaluate(&dry, &AutomationRules::default());
        assert!((plan.ac.target_temperature - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_turn_everything_off_when_room_is_empty() {
        let mut empty = state(30.0);
        empty.occupancy = 0;
        empty.co2 = 1200.0;
        let plan = evaluate(&empty, &AutomationRules::default());
        assert_eq!(plan.ac.speed, 0);
        assert!(!plan.ac.power);
        assert_eq!(plan.light, LightSetting::off());
    }

    #[test]
    fn should_force_full_speed_and_light_when_crowded() {
        let mut crowded = state(22.0);
        crowded.occupancy = 5;
        crowded.natural_light = 900.0;
        let plan = evaluate(&crowded, &AutomationRules::default());
        assert_eq!(plan.ac.speed, 3);
        assert_eq!(plan.ac.mode, AcMode::Cool);
        assert_eq!(plan.light.brightness, 80);
    }

    #[test]
    fn should_bias_speed_to_max_on_high_co2() {
        let mut stuffy = state(15.0);
        stuffy.co2 = 1100.0;
        let plan = evaluate(&stuffy, &AutomationRules::default());
        assert_eq!(plan.ac.mode, AcMode::Heat);
        assert_eq!(plan.ac.speed, 3);
    }

    #[test]
    fn should_pick_brightness_from_natural_light() {
        let rules = AutomationRules::default();
        let mut s = state(22.0);

        s.natural_light = 100.0;
        s.artificial_light = 900.0;
        assert_eq!(evaluate(&s, &rules).light, LightSetting::at(80));

        s.natural_light = 1000.0;
        assert_eq!(evaluate(&s, &rules).light, LightSetting::at(20));

        s.natural_light = 500.0;
        assert_eq!(evaluate(&s, &rules).light, LightSetting::at(50));
    }

    #[test]
    fn should_validate_default_rules() {
        assert!(AutomationRules::default().validate().is_ok());
    }

    #[test]
    fn should_reject_speed_above_max() {
        let rules = AutomationRules {
            cool_speed: 4,
            ..AutomationRules::default()
        };
        assert!(matches!(
            rules.validate(),
            Err(ValidationError::OutOfRange {
                field: "automation.cool_speed",
                ..
            })
        ));
    }
}
