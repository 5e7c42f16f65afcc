//! Virtual air conditioner — power, mode, fan speed and target temperature.

use std::sync::Mutex;

use homesim_app::ports::{AirConditionerHandle, DeviceHandle, DeviceResult};
use homesim_domain::device::{AcMode, AcSnapshot, MAX_AC_SPEED};
use homesim_domain::id::DeviceId;

use super::{Presence, lock};

/// Target temperature of a freshly created unit.
pub const DEFAULT_TARGET_TEMPERATURE: f64 = 25.0;

#[derive(Debug, Clone, Copy)]
struct State {
    on: bool,
    mode: AcMode,
    speed: u8,
    target_temperature: f64,
}

/// A simulated air conditioner.
///
/// Speeds above [`MAX_AC_SPEED`] are clamped.
pub struct VirtualAirConditioner {
    presence: Presence,
    state: Mutex<State>,
}

impl VirtualAirConditioner {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            presence: Presence::new(name),
            state: Mutex::new(State {
                on: false,
                mode: AcMode::Off,
                speed: 0,
                target_temperature: DEFAULT_TARGET_TEMPERATURE,
            }),
        }
    }

    /// Make every read and write fail until set back to `true`.
    pub fn set_available(&self, available: bool) {
        self.presence.set_available(available);
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.presence.is_available()
    }

    /// Current attributes, readable even while unavailable.
    #[must_use]
    pub fn snapshot(&self) -> AcSnapshot {
        let state = *lock(&self.state);
        AcSnapshot {
            id: self.presence.id,
            name: self.presence.name.clone(),
            on: state.on,
            mode: state.mode,
            speed: state.speed,
            target_temperature: state.target_temperature,
        }
    }
}

impl DeviceHandle for VirtualAirConditioner {
    fn id(&self) -> DeviceId {
        self.presence.id
    }

    fn name(&self) -> String {
        self.presence.name.clone()
    }

    fn is_on(&self) -> DeviceResult<bool> {
        self.presence.check()?;
        Ok(lock(&self.state).on)
    }

    fn set_on(&self, on: bool) -> DeviceResult<()> {
        self.presence.check()?;
        lock(&self.state).on = on;
        Ok(())
    }
}

impl AirConditionerHandle for VirtualAirConditioner {
    fn target_temperature(&self) -> DeviceResult<f64> {
        self.presence.check()?;
        Ok(lock(&self.state).target_temperature)
    }

    fn set_target_temperature(&self, celsius: f64) -> DeviceResult<()> {
        self.presence.check()?;
        lock(&self.state).target_temperature = celsius;
        Ok(())
    }

    fn speed(&self) -> DeviceResult<u8> {
        self.presence.check()?;
        Ok(lock(&self.state).speed)
    }

    fn set_speed(&self, speed: u8) -> DeviceResult<()> {
        self.presence.check()?;
        lock(&self.state).speed = speed.min(MAX_AC_SPEED);
        Ok(())
    }

    fn mode(&self) -> DeviceResult<AcMode> {
        self.presence.check()?;
        Ok(lock(&self.state).mode)
    }

    fn set_mode(&self, mode: AcMode) -> DeviceResult<()> {
        self.presence.check()?;
        lock(&self.state).mode = mode;
        Ok(())
    }
}
