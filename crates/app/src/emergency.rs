//! Emergency controller — the NORMAL / EMERGENCY state machine.
//!
//! Emergency mode is entered when CO2 exceeds the hazard threshold or when
//! a hazard (fire, gas leak, high temperature) is raised. While it lasts,
//! automation output never reaches a device: every automation write goes
//! through [`EmergencyController::gate`], which runs it under the same
//! monitor as the shutdown actions.
//!
//! A CO2 emergency recovers on its own after the configured duration.
//! Hazard flags only clear through [`EmergencyController::clear_hazard`].
//!
//! Methods never publish. They return the journal records to publish once
//! the monitor has been released.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use homesim_domain::config::EmergencyConfig;
use homesim_domain::device::{AcMode, MAX_AC_SPEED};
use homesim_domain::environment::EnvironmentState;
use homesim_domain::event::{EventType, SimEvent};
use homesim_domain::hazard::{HazardFlags, HazardKind};
use homesim_domain::id::DeviceId;
use homesim_domain::time::format_clock;

use crate::ports::{
    AirConditionerHandle, DeviceCatalog, DeviceHandle, DeviceResult, LightHandle,
};

/// AC target used for maximum cooling.
pub const MAX_COOLING_TARGET: f64 = 18.0;

#[derive(Debug, Default)]
struct Monitor {
    /// Minute a CO2 emergency started, if one is running.
    co2_since: Option<u32>,
    hazards: HazardFlags,
    activations: u32,
}

impl Monitor {
    fn in_emergency(&self) -> bool {
        self.co2_since.is_some() || self.hazards.any_detected()
    }
}

/// Point-in-time view of the controller, used by status reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmergencyStatus {
    pub active: bool,
    pub co2_since: Option<u32>,
    /// Minute at which a running CO2 emergency recovers.
    pub co2_recovery_at: Option<u32>,
    pub hazards: Vec<HazardKind>,
}

pub struct EmergencyController {
    config: EmergencyConfig,
    active: AtomicBool,
    monitor: Mutex<Monitor>,
}

impl EmergencyController {
    #[must_use]
    pub fn new(config: EmergencyConfig) -> Self {
        Self {
            config,
            active: AtomicBool::new(false),
            monitor: Mutex::new(Monitor::default()),
        }
    }

    /// Lock-free check polled by every control loop.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Number of NORMAL → EMERGENCY transitions so far.
    #[must_use]
    pub fn activations(&self) -> u32 {
        self.lock().activations
    }

    #[must_use]
    pub fn status(&self) -> EmergencyStatus {
        let monitor = self.lock();
        EmergencyStatus {
            active: monitor.in_emergency(),
            co2_since: monitor.co2_since,
            co2_recovery_at: monitor
                .co2_since
                .map(|since| since.saturating_add(self.config.duration_minutes)),
            hazards: monitor.hazards.detected(),
        }
    }

    /// Run a write that must not happen in emergency mode: automation
    /// output, natural drift, scheduled deltas.
    ///
    /// Returns `None` without calling `write` during an emergency. `write`
    /// runs under the monitor, so no transition can interleave with it.
    pub fn gate<R>(&self, write: impl FnOnce() -> R) -> Option<R> {
        let monitor = self.lock();
        if monitor.in_emergency() {
            return None;
        }
        Some(write())
    }

    /// Enter emergency mode if CO2 exceeds the threshold.
    ///
    /// The shutdown (AC off, lights off, sensors inactive) runs once per
    /// activation.
    pub fn check_co2<C: DeviceCatalog>(
        &self,
        state: &EnvironmentState,
        catalog: &C,
    ) -> Vec<SimEvent> {
        if state.co2 <= self.config.co2_threshold {
            return Vec::new();
        }
        let mut monitor = self.lock();
        if monitor.co2_since.is_some() {
            return Vec::new();
        }

        let minute = state.minute;
        let recovery_at = minute.saturating_add(self.config.duration_minutes);
        let mut events = vec![
            SimEvent::alert(
                EventType::EmergencyEntered,
                minute,
                format!(
                    "CO2 at {:.0} ppm exceeds {:.0} ppm, emergency mode until {}",
                    state.co2,
                    self.config.co2_threshold,
                    format_clock(recovery_at)
                ),
            )
            .with_data(serde_json::json!({
                "co2": state.co2,
                "threshold": self.config.co2_threshold,
                "recovery_at": recovery_at,
            })),
        ];
        power_off_air_conditioners(catalog, minute, &mut events);
        power_off_lights(catalog, minute, &mut events);
        set_sensors_active(catalog, false, minute, &mut events);

        if !monitor.in_emergency() {
            monitor.activations += 1;
        }
        monitor.co2_since = Some(minute);
        self.sync_flag(&monitor);
        events
    }

    /// Raise the high-temperature hazard if the reading is above the
    /// configured threshold.
    pub fn check_temperature<C: DeviceCatalog>(
        &self,
        state: &EnvironmentState,
        catalog: &C,
    ) -> Vec<SimEvent> {
        match self.config.high_temperature_threshold {
            Some(threshold) if state.temperature > threshold => {
                self.raise_hazard(HazardKind::HighTemperature, state.minute, catalog)
            }
            _ => Vec::new(),
        }
    }

    /// Raise a hazard and run its one-shot safety action.
    ///
    /// Raising a hazard that is already detected does nothing and returns
    /// no record.
    pub fn raise_hazard<C: DeviceCatalog>(
        &self,
        kind: HazardKind,
        minute: u32,
        catalog: &C,
    ) -> Vec<SimEvent> {
        let mut monitor = self.lock();
        let was_in_emergency = monitor.in_emergency();
        monitor.hazards.raise(kind);
        if !monitor.hazards.needs_action(kind) {
            return Vec::new();
        }

        let message = match kind {
            HazardKind::Fire | HazardKind::GasLeak => {
                format!("{kind} detected: power cut to lights and air conditioners")
            }
            HazardKind::HighTemperature => {
                format!("{kind} detected: lights off, air conditioners at maximum cooling")
            }
        };
        let mut events = vec![
            SimEvent::alert(EventType::HazardRaised, minute, message)
                .with_data(serde_json::json!({ "hazard": kind })),
        ];
        match kind {
            HazardKind::Fire | HazardKind::GasLeak => {
                power_off_air_conditioners(catalog, minute, &mut events);
                power_off_lights(catalog, minute, &mut events);
            }
            HazardKind::HighTemperature => {
                power_off_lights(catalog, minute, &mut events);
                max_cooling(catalog, minute, &mut events);
            }
        }

        let handled = monitor.hazards.mark_handled(kind);
        debug_assert!(handled.is_ok(), "one-shot for {kind} ran twice");
        if let Err(violation) = handled {
            tracing::error!(%violation, "hazard one-shot repeated");
            events.push(SimEvent::alert(
                EventType::InvariantViolated,
                minute,
                violation.to_string(),
            ));
        }

        if !was_in_emergency {
            monitor.activations += 1;
        }
        self.sync_flag(&monitor);
        events
    }

    /// Whether the running CO2 emergency has lasted its full duration.
    #[must_use]
    pub fn co2_recovery_due(&self, minute: u32) -> bool {
        self.lock()
            .co2_since
            .is_some_and(|since| minute >= since.saturating_add(self.config.duration_minutes))
    }

    /// CO2 level restored by a recovery.
    #[must_use]
    pub fn nominal_co2(&self) -> f64 {
        self.config.nominal_co2
    }

    /// Finish a CO2 emergency: re-enable sensors and leave the CO2 variant.
    ///
    /// The caller resets the environment CO2 to [`Self::nominal_co2`]
    /// before calling this, so the next check does not re-enter.
    pub fn complete_co2_recovery<C: DeviceCatalog>(
        &self,
        minute: u32,
        catalog: &C,
    ) -> Vec<SimEvent> {
        let mut monitor = self.lock();
        let Some(since) = monitor.co2_since.take() else {
            return Vec::new();
        };

        let mut events = Vec::new();
        set_sensors_active(catalog, true, minute, &mut events);
        let remaining = monitor.hazards.detected();
        let message = if remaining.is_empty() {
            format!(
                "CO2 reset to {:.0} ppm, sensors re-enabled, back to normal mode",
                self.config.nominal_co2
            )
        } else {
            format!(
                "CO2 reset to {:.0} ppm, sensors re-enabled, emergency continues for hazards",
                self.config.nominal_co2
            )
        };
        events.insert(
            0,
            SimEvent::info(EventType::EmergencyRecovered, minute, message).with_data(
                serde_json::json!({
                    "since": since,
                    "co2": self.config.nominal_co2,
                    "hazards": remaining,
                }),
            ),
        );
        self.sync_flag(&monitor);
        events
    }

    /// Clear a hazard flag. This is the only way a hazard ends.
    pub fn clear_hazard(&self, kind: HazardKind, minute: u32) -> Vec<SimEvent> {
        let mut monitor = self.lock();
        if !monitor.hazards.clear(kind) {
            return Vec::new();
        }
        let mut events = vec![
            SimEvent::info(EventType::HazardCleared, minute, format!("{kind} cleared"))
                .with_data(serde_json::json!({ "hazard": kind })),
        ];
        if !monitor.in_emergency() {
            events.push(SimEvent::info(
                EventType::EmergencyRecovered,
                minute,
                "all hazards cleared, back to normal mode",
            ));
        }
        self.sync_flag(&monitor);
        events
    }

    fn sync_flag(&self, monitor: &Monitor) {
        self.active.store(monitor.in_emergency(), Ordering::Release);
    }

    fn lock(&self) -> MutexGuard<'_, Monitor> {
        self.monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn record_write(
    result: DeviceResult<()>,
    device_id: DeviceId,
    name: &str,
    minute: u32,
    action: &str,
) -> SimEvent {
    match result {
        Ok(()) => SimEvent::debug(EventType::ActuatorChanged, minute, format!("{name}: {action}"))
            .with_device(device_id),
        Err(err) => SimEvent::alert(
            EventType::DeviceUnavailable,
            minute,
            format!("{name}: could not {action}: {}", err.reason),
        )
        .with_device(device_id),
    }
}

fn power_off_air_conditioners<C: DeviceCatalog>(
    catalog: &C,
    minute: u32,
    events: &mut Vec<SimEvent>,
) {
    for ac in catalog.air_conditioners() {
        let result = ac
            .set_on(false)
            .and_then(|()| ac.set_mode(AcMode::Off))
            .and_then(|()| ac.set_speed(0));
        events.push(record_write(result, ac.id(), &ac.name(), minute, "power off"));
    }
}

fn power_off_lights<C: DeviceCatalog>(catalog: &C, minute: u32, events: &mut Vec<SimEvent>) {
    for light in catalog.lights() {
        let result = light.set_on(false).and_then(|()| light.set_brightness(0));
        events.push(record_write(
            result,
            light.id(),
            &light.name(),
            minute,
            "switch off",
        ));
    }
}

fn max_cooling<C: DeviceCatalog>(catalog: &C, minute: u32, events: &mut Vec<SimEvent>) {
    for ac in catalog.air_conditioners() {
        let result = ac
            .set_on(true)
            .and_then(|()| ac.set_mode(AcMode::Cool))
            .and_then(|()| ac.set_target_temperature(MAX_COOLING_TARGET))
            .and_then(|()| ac.set_speed(MAX_AC_SPEED));
        events.push(record_write(
            result,
            ac.id(),
            &ac.name(),
            minute,
            "cool at maximum",
        ));
    }
}

fn set_sensors_active<C: DeviceCatalog>(
    catalog: &C,
    active: bool,
    minute: u32,
    events: &mut Vec<SimEvent>,
) {
    let action = if active { "re-enable" } else { "deactivate" };
    for sensor in catalog.sensors() {
        let result = sensor.set_on(active);
        events.push(record_write(result, sensor.id(), &sensor.name(), minute, action));
    }
}
