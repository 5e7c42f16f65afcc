//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the simulation engine and the outside
//! world. They are defined here (in `app`) so that both the engine and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod device_catalog;
pub mod event_bus;

pub use device_catalog::{
    AirConditionerHandle, DeviceCatalog, DeviceHandle, DeviceResult, LightHandle, SensorHandle,
};
pub use event_bus::EventPublisher;
