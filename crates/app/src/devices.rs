//! Reading device state through the catalog port.

use homesim_domain::device::{AcSnapshot, DeviceSnapshots, LightSnapshot, SensorSnapshot};
use homesim_domain::error::TransientReadError;
use homesim_domain::event::{EventType, SimEvent};

use crate::ports::{
    AirConditionerHandle, DeviceCatalog, DeviceHandle, DeviceResult, LightHandle, SensorHandle,
};

/// Read every device of the catalog.
///
/// Unreachable devices are left out of the snapshot and returned as errors.
pub fn snapshot<C: DeviceCatalog>(catalog: &C) -> (DeviceSnapshots, Vec<TransientReadError>) {
    let mut snapshots = DeviceSnapshots::default();
    let mut errors = Vec::new();

    for ac in catalog.air_conditioners() {
        match read_ac(ac.as_ref()) {
            Ok(snapshot) => snapshots.air_conditioners.push(snapshot),
            Err(err) => errors.push(err),
        }
    }
    for light in catalog.lights() {
        match read_light(light.as_ref()) {
            Ok(snapshot) => snapshots.lights.push(snapshot),
            Err(err) => errors.push(err),
        }
    }
    for sensor in catalog.sensors() {
        match read_sensor(sensor.as_ref()) {
            Ok(snapshot) => snapshots.sensors.push(snapshot),
            Err(err) => errors.push(err),
        }
    }

    (snapshots, errors)
}

/// Whether any air conditioner may be powered, plus the units that could
/// not be read. An unreadable unit counts as powered.
pub fn any_ac_on<C: DeviceCatalog>(catalog: &C) -> (bool, Vec<TransientReadError>) {
    let mut on = false;
    let mut errors = Vec::new();
    for ac in catalog.air_conditioners() {
        match ac.is_on() {
            Ok(powered) => on |= powered,
            Err(err) => {
                on = true;
                errors.push(err);
            }
        }
    }
    (on, errors)
}

/// Journal record for a device skipped this tick.
pub fn unavailable(err: &TransientReadError, minute: u32) -> SimEvent {
    tracing::debug!(device_id = %err.device_id, reason = %err.reason, "skipping device");
    SimEvent::debug(EventType::DeviceUnavailable, minute, err.to_string()).with_device(err.device_id)
}

fn read_ac<A: AirConditionerHandle + ?Sized>(ac: &A) -> DeviceResult<AcSnapshot> {
    Ok(AcSnapshot {
        id: ac.id(),
        name: ac.name(),
        on: ac.is_on()?,
        mode: ac.mode()?,
        speed: ac.speed()?,
        target_temperature: ac.target_temperature()?,
    })
}

fn read_light<L: LightHandle + ?Sized>(light: &L) -> DeviceResult<LightSnapshot> {
    Ok(LightSnapshot {
        id: light.id(),
        name: light.name(),
        on: light.is_on()?,
        brightness: light.brightness()?,
    })
}

fn read_sensor<S: SensorHandle + ?Sized>(sensor: &S) -> DeviceResult<SensorSnapshot> {
    Ok(SensorSnapshot {
        id: sensor.id(),
        name: sensor.name(),
        on: sensor.is_on()?,
        temperature: sensor.temperature()?,
        humidity: sensor.humidity()?,
        co2: sensor.co2()?,
    })
}
