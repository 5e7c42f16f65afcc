//! Device catalog port — the capability surface the engine drives.
//!
//! Devices belong to an external catalog. The engine only reads and writes
//! their published attributes, one capability trait per device kind, and
//! asks the catalog for the current per-kind lists on every pass.
//!
//! Accessors are synchronous: automation writes and emergency shutdowns run
//! while the emergency controller's monitor is held, and that monitor must
//! never be held across an `.await`.

use std::sync::Arc;

use homesim_domain::device::AcMode;
use homesim_domain::error::TransientReadError;
use homesim_domain::id::DeviceId;

/// Result of a single device access.
pub type DeviceResult<T> = Result<T, TransientReadError>;

/// Capabilities shared by every device.
pub trait DeviceHandle: Send + Sync {
    fn id(&self) -> DeviceId;

    fn name(&self) -> String;

    /// # Errors
    ///
    /// Returns a [`TransientReadError`] if the device cannot be reached.
    fn is_on(&self) -> DeviceResult<bool>;

    /// # Errors
    ///
    /// Returns a [`TransientReadError`] if the device cannot be reached.
    fn set_on(&self, on: bool) -> DeviceResult<()>;
}

/// Air conditioner capabilities.
///
/// Every accessor fails with a [`TransientReadError`] when the device is
/// unreachable.
#[allow(clippy::missing_errors_doc)]
pub trait AirConditionerHandle: DeviceHandle {
    fn target_temperature(&self) -> DeviceResult<f64>;
    fn set_target_temperature(&self, celsius: f64) -> DeviceResult<()>;
    fn speed(&self) -> DeviceResult<u8>;
    fn set_speed(&self, speed: u8) -> DeviceResult<()>;
    fn mode(&self) -> DeviceResult<AcMode>;
    fn set_mode(&self, mode: AcMode) -> DeviceResult<()>;
}

/// Light capabilities.
#[allow(clippy::missing_errors_doc)]
pub trait LightHandle: DeviceHandle {
    /// Brightness in percent.
    fn brightness(&self) -> DeviceResult<u8>;
    fn set_brightness(&self, percent: u8) -> DeviceResult<()>;
}

/// Sensor capabilities. The engine pushes the environment readings into
/// active sensors.
#[allow(clippy::missing_errors_doc)]
pub trait SensorHandle: DeviceHandle {
    fn temperature(&self) -> DeviceResult<f64>;
    fn humidity(&self) -> DeviceResult<f64>;
    fn co2(&self) -> DeviceResult<f64>;
    fn record(&self, temperature: f64, humidity: f64, co2: f64) -> DeviceResult<()>;
}

/// Per-kind device lists.
///
/// The engine never creates or removes devices; lists are fetched again on
/// every pass so catalog changes are picked up.
pub trait DeviceCatalog: Send + Sync {
    type AirConditioner: AirConditionerHandle + 'static;
    type Light: LightHandle + 'static;
    type Sensor: SensorHandle + 'static;

    fn air_conditioners(&self) -> Vec<Arc<Self::AirConditioner>>;
    fn lights(&self) -> Vec<Arc<Self::Light>>;
    fn sensors(&self) -> Vec<Arc<Self::Sensor>>;
}

impl<T: DeviceCatalog> DeviceCatalog for Arc<T> {
    type AirConditioner = T::AirConditioner;
    type Light = T::Light;
    type Sensor = T::Sensor;

    fn air_conditioners(&self) -> Vec<Arc<Self::AirConditioner>> {
        (**self).air_conditioners()
    }

    fn lights(&self) -> Vec<Arc<Self::Light>> {
        (**self).lights()
    }

    fn sensors(&self) -> Vec<Arc<Self::Sensor>> {
        (**self).sensors()
    }
}
