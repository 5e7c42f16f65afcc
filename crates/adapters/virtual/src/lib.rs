//! # homesim-adapter-virtual
//!
//! In-memory device catalog used by the daemon and by integration tests.
//!
//! ## Provided devices
//!
//! | Device | Capabilities |
//! |--------|--------------|
//! | [`VirtualAirConditioner`] | power, mode (`off`/`cool`/`heat`), fan speed 0–3, target temperature |
//! | [`VirtualLight`] | power, brightness 0–100 % |
//! | [`VirtualSensor`] | active flag, temperature, humidity, CO2 |
//!
//! Every device can be marked unavailable to exercise the transient-read
//! path of the engine.
//!
//! ## Dependency rule
//!
//! Depends on `homesim-app` (port traits) and `homesim-domain` only.

mod devices;

use std::sync::Arc;

use serde::Deserialize;

use homesim_app::ports::{DeviceCatalog, DeviceHandle};
use homesim_domain::device::{DeviceKind, DeviceSnapshots};
use homesim_domain::id::DeviceId;

pub use devices::{VirtualAirConditioner, VirtualLight, VirtualSensor};

/// One device entry of the daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceSpec {
    pub kind: DeviceKind,
    pub name: String,
}

impl DeviceSpec {
    #[must_use]
    pub fn new(kind: DeviceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// The devices of one simulated room.
///
/// The catalog owns the devices; the engine only borrows handles.
#[derive(Default)]
pub struct VirtualCatalog {
    air_conditioners: Vec<Arc<VirtualAirConditioner>>,
    lights: Vec<Arc<VirtualLight>>,
    sensors: Vec<Arc<VirtualSensor>>,
}

impl VirtualCatalog {
    /// One air conditioner, one light and one sensor.
    #[must_use]
    pub fn demo() -> Self {
        Self::from_specs(&[
            DeviceSpec::new(DeviceKind::AirConditioner, "Virtual AC"),
            DeviceSpec::new(DeviceKind::Light, "Virtual Light"),
            DeviceSpec::new(DeviceKind::Sensor, "Virtual Sensor"),
        ])
    }

    #[must_use]
    pub fn from_specs(specs: &[DeviceSpec]) -> Self {
        let mut catalog = Self::default();
        for spec in specs {
            match spec.kind {
                DeviceKind::AirConditioner => {
                    catalog.add_air_conditioner(spec.name.clone());
                }
                DeviceKind::Light => {
                    catalog.add_light(spec.name.clone());
                }
                DeviceKind::Sensor => {
                    catalog.add_sensor(spec.name.clone());
                }
            }
        }
        catalog
    }

    pub fn add_air_conditioner(&mut self, name: impl Into<String>) -> Arc<VirtualAirConditioner> {
        let device = Arc::new(VirtualAirConditioner::new(name));
        self.air_conditioners.push(Arc::clone(&device));
        device
    }

    pub fn add_light(&mut self, name: impl Into<String>) -> Arc<VirtualLight> {
        let device = Arc::new(VirtualLight::new(name));
        self.lights.push(Arc::clone(&device));
        device
    }

    pub fn add_sensor(&mut self, name: impl Into<String>) -> Arc<VirtualSensor> {
        let device = Arc::new(VirtualSensor::new(name));
        self.sensors.push(Arc::clone(&device));
        device
    }

    /// Remove a device of any kind. Returns whether it was found.
    pub fn remove(&mut self, id: DeviceId) -> bool {
        let before = self.len();
        self.air_conditioners.retain(|d| d.id() != id);
        self.lights.retain(|d| d.id() != id);
        self.sensors.retain(|d| d.id() != id);
        self.len() != before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.air_conditioners.len() + self.lights.len() + self.sensors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attributes of every device, ignoring availability.
    #[must_use]
    pub fn snapshots(&self) -> DeviceSnapshots {
        DeviceSnapshots {
            air_conditioners: self
                .air_conditioners
                .iter()
                .map(|d| d.snapshot())
                .collect(),
            lights: self.lights.iter().map(|d| d.snapshot()).collect(),
            sensors: self.sensors.iter().map(|d| d.snapshot()).collect(),
        }
    }
}

impl DeviceCatalog for VirtualCatalog {
    type AirConditioner = VirtualAirConditioner;
    type Light = VirtualLight;
    type Sensor = VirtualSensor;

    fn air_conditioners(&self) -> Vec<Arc<VirtualAirConditioner>> {
        self.air_conditioners.clone()
    }

    fn lights(&self) -> Vec<Arc<VirtualLight>> {
        self.lights.clone()
    }

    fn sensors(&self) -> Vec<Arc<VirtualSensor>> {
        self.sensors.clone()
    }
}
