//! Automation engine — turns rule output into device writes.
//!
//! The rules themselves are a pure function in the domain crate. The engine
//! evaluates them and pushes the resulting plan to every air conditioner
//! and light, through the emergency controller's gate so nothing is written
//! while emergency mode is active.

use std::sync::Arc;

use homesim_domain::automation::{self, AcSetting, ActuatorPlan, AutomationRules, LightSetting};
use homesim_domain::environment::EnvironmentState;
use homesim_domain::event::{EventType, SimEvent};

use crate::devices;
use crate::emergency::EmergencyController;
use crate::ports::{
    AirConditionerHandle, DeviceCatalog, DeviceHandle, DeviceResult, LightHandle,
};

pub struct AutomationEngine<C> {
    catalog: Arc<C>,
    rules: AutomationRules,
}

impl<C> AutomationEngine<C>
where
    C: DeviceCatalog,
{
    pub fn new(catalog: Arc<C>, rules: AutomationRules) -> Self {
        Self { catalog, rules }
    }

    #[must_use]
    pub fn plan(&self, state: &EnvironmentState) -> ActuatorPlan {
        automation::evaluate(state, &self.rules)
    }

    /// Push `plan` to the devices unless emergency mode is active.
    ///
    /// Returns `None` when the emergency controller blocked the write,
    /// otherwise one record per changed or unreachable device. Unreachable
    /// devices are skipped for this tick.
    pub fn apply(
        &self,
        plan: &ActuatorPlan,
        minute: u32,
        emergency: &EmergencyController,
    ) -> Option<Vec<SimEvent>> {
        emergency.gate(|| self.write(plan, minute))
    }

    fn write(&self, plan: &ActuatorPlan, minute: u32) -> Vec<SimEvent> {
        let mut events = Vec::new();

        for ac in self.catalog.air_conditioners() {
            match apply_ac(ac.as_ref(), &plan.ac) {
                Ok(false) => {}
                Ok(true) => events.push(
                    SimEvent::debug(
                        EventType::ActuatorChanged,
                        minute,
                        format!(
                            "{}: {} to {:.1}°C at speed {}",
                            ac.name(),
                            plan.ac.mode,
                            plan.ac.target_temperature,
                            plan.ac.speed
                        ),
                    )
                    .with_device(ac.id())
                    .with_data(serde_json::json!(plan.ac)),
                ),
                Err(err) => events.push(devices::unavailable(&err, minute)),
            }
        }

        for light in self.catalog.lights() {
            match apply_light(light.as_ref(), &plan.light) {
                Ok(false) => {}
                Ok(true) => events.push(
                    SimEvent::debug(
                        EventType::ActuatorChanged,
                        minute,
                        format!("{}: brightness {}%", light.name(), plan.light.brightness),
                    )
                    .with_device(light.id())
                    .with_data(serde_json::json!(plan.light)),
                ),
                Err(err) => events.push(devices::unavailable(&err, minute)),
            }
        }

        events
    }
}

/// Write `setting` if it differs from the device state. Returns whether
/// anything was written.
fn apply_ac<A: AirConditionerHandle + ?Sized>(ac: &A, setting: &AcSetting) -> DeviceResult<bool> {
    let unchanged = ac.is_on()? == setting.power
        && ac.mode()? == setting.mode
        && ac.speed()? == setting.speed
        && (ac.target_temperature()? - setting.target_temperature).abs() < f64::EPSILON;
    if unchanged {
        return Ok(false);
    }
    ac.set_on(setting.power)?;
    ac.set_mode(setting.mode)?;
    ac.set_target_temperature(setting.target_temperature)?;
    ac.set_speed(setting.speed)?;
    Ok(true)
}

fn apply_light<L: LightHandle + ?Sized>(light: &L, setting: &LightSetting) -> DeviceResult<bool> {
    if light.is_on()? == setting.on && light.brightness()? == setting.brightness {
        return Ok(false);
    }
    light.set_on(setting.on)?;
    light.set_brightness(setting.brightness)?;
    Ok(true)
}
