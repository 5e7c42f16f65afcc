//! Virtual environment sensor — holds the last recorded readings.

use std::sync::Mutex;

use homesim_app::ports::{DeviceHandle, DeviceResult, SensorHandle};
use homesim_domain::device::SensorSnapshot;
use homesim_domain::id::DeviceId;

use super::{Presence, lock};

#[derive(Debug, Clone, Copy)]
struct Readings {
    on: bool,
    temperature: f64,
    humidity: f64,
    co2: f64,
}

/// A simulated temperature, humidity and CO2 sensor.
///
/// Sensors start active. An inactive sensor still accepts readings; the
/// engine decides whether to feed it.
pub struct VirtualSensor {
    presence: Presence,
    readings: Mutex<Readings>,
}

impl VirtualSensor {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            presence: Presence::new(name),
            readings: Mutex::new(Readings {
                on: true,
                temperature: 0.0,
                humidity: 0.0,
                co2: 0.0,
            }),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.presence.set_available(available);
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.presence.is_available()
    }

    #[must_use]
    pub fn snapshot(&self) -> SensorSnapshot {
        let readings = *lock(&self.readings);
        SensorSnapshot {
            id: self.presence.id,
            name: self.presence.name.clone(),
            on: readings.on,
            temperature: readings.temperature,
            humidity: readings.humidity,
            co2: readings.co2,
        }
    }
}

impl DeviceHandle for VirtualSensor {
    fn id(&self) -> DeviceId {
        self.presence.id
    }

    fn name(&self) -> String {
        self.presence.name.clone()
    }

    fn is_on(&self) -> DeviceResult<bool> {
        self.presence.check()?;
        Ok(lock(&self.readings).on)
    }

    fn set_on(&self, on: bool) -> DeviceResult<()> {
        self.presence.check()?;
        lock(&self.readings).on = on;
        Ok(())
    }
}

impl SensorHandle for VirtualSensor {
    fn temperature(&self) -> DeviceResult<f64> {
        self.presence.check()?;
        Ok(lock(&self.readings).temperature)
    }

    fn humidity(&self) -> DeviceResult<f64> {
        self.presence.check()?;
        Ok(lock(&self.readings).humidity)
    }

    fn co2(&self) -> DeviceResult<f64> {
        self.presence.check()?;
        Ok(lock(&self.readings).co2)
    }

    fn record(&self, temperature: f64, humidity: f64, co2: f64) -> DeviceResult<()> {
        self.presence.check()?;
        let mut readings = lock(&self.readings);
        readings.temperature = temperature;
        readings.humidity = humidity;
        readings.co2 = co2;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_start_active_with_empty_readings() {
        let sensor = VirtualSensor::new("Hallway");
        let snapshot = sensor.snapshot();
        assert!(snapshot.on);
        assert!(snapshot.co2.abs() < f64::EPSILON);
    }

    #[test]
    fn should_record_all_readings_together() {
        let sensor = VirtualSensor::new("Hallway");
        sensor.record(21.5, 48.0, 620.0).unwrap();
        assert!((sensor.temperature().unwrap() - 21.5).abs() < f64::EPSILON);
        assert!((sensor.humidity().unwrap() - 48.0).abs() < f64::EPSILON);
        assert!((sensor.co2().unwrap() - 620.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_deactivate() {
        let sensor = VirtualSensor::new("Hallway");
        sensor.set_on(false).unwrap();
        assert!(!sensor.is_on().unwrap());
    }

    #[test]
    fn should_reject_readings_while_unavailable() {
        let sensor = VirtualSensor::new("Hallway");
        sensor.set_available(false);
        assert!(sensor.record(20.0, 40.0, 400.0).is_err());
        sensor.set_available(true);
        assert!(sensor.temperature().unwrap().abs() < f64::EPSILON);
    }
}
