//! Virtual light — power and brightness.

use std::sync::Mutex;

use homesim_app::ports::{DeviceHandle, DeviceResult, LightHandle};
use homesim_domain::device::{LightSnapshot, MAX_BRIGHTNESS};
use homesim_domain::id::DeviceId;

use super::{Presence, lock};

/// A simulated dimmable light.
pub struct VirtualLight {
    presence: Presence,
    state: Mutex<(bool, u8)>,
}

impl VirtualLight {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            presence: Presence::new(name),
            state: Mutex::new((false, 0)),
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
    pub fn snapshot(&self) -> LightSnapshot {
        let (on, brightness) = *lock(&self.state);
        LightSnapshot {
            id: self.presence.id,
            name: self.presence.name.clone(),
            on,
            brightness,
        }
    }
}

impl DeviceHandle for VirtualLight {
    fn id(&self) -> DeviceId {
        self.presence.id
    }

    fn name(&self) -> String {
        self.presence.name.clone()
    }

    fn is_on(&self) -> DeviceResult<bool> {
        self.presence.check()?;
        Ok(lock(&self.state).0)
    }

    fn set_on(&self, on: bool) -> DeviceResult<()> {
        self.presence.check()?;
        lock(&self.state).0 = on;
        Ok(())
    }
}

impl LightHandle for VirtualLight {
    fn brightness(&self) -> DeviceResult<u8> {
        self.presence.check()?;
        Ok(lock(&self.state).1)
    }

    fn set_brightness(&self, percent: u8) -> DeviceResult<()> {
        self.presence.check()?;
        lock(&self.state).1 = percent.min(MAX_BRIGHTNESS);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_off() {
        let light = VirtualLight::new("Desk lamp");
        let snapshot = light.snapshot();
        assert!(!snapshot.on);
        assert_eq!(snapshot.brightness, 0);
        assert_eq!(snapshot.name, "Desk lamp");
    }

    #[test]
    fn should_turn_on_and_dim() {
        let light = VirtualLight::new("lamp");
        light.set_on(true).unwrap();
        light.set_brightness(50).unwrap();
        assert!(light.is_on().unwrap());
        assert_eq!(light.brightness().unwrap(), 50);
    }

    #[test]
    fn should_clamp_brightness() {
        let light = VirtualLight::new("lamp");
        light.set_brightness(180).unwrap();
        assert_eq!(light.brightness().unwrap(), MAX_BRIGHTNESS);
    }

    #[test]
    fn should_fail_while_unavailable() {
        let light = VirtualLight::new("lamp");
        light.set_available(false);
        assert!(light.brightness().is_err());
        assert!(!light.is_available());
    }
}
