//! AC feedback: powered air conditioners pull the room toward their target.
//!
//! Keeps running during emergencies, since it is driven by the devices and
//! not by natural drift.

use std::ops::ControlFlow;

use homesim_domain::device::AcMode;
use homesim_domain::environment::EnvironmentDelta;
use homesim_domain::error::SimError;

use super::{ControlLoop, Shared};
use crate::ports::{AirConditionerHandle, DeviceCatalog, DeviceResult, EventPublisher};

/// °C moved per tick and per speed step.
const TEMPERATURE_STEP: f64 = 0.05;
/// % humidity moved per tick and per speed step.
const HUMIDITY_STEP: f64 = 0.02;

pub(crate) struct AirConditioningLoop<C, P> {
    shared: Shared<C, P>,
}

impl<C, P> AirConditioningLoop<C, P> {
    pub(crate) fn new(shared: Shared<C, P>) -> Self {
        Self { shared }
    }
}

/// Effect of one air conditioner at `temperature`, or `None` when it is
/// idle or already at its target.
pub(crate) fn feedback(
    mode: AcMode,
    speed: u8,
    target: f64,
    temperature: f64,
) -> Option<EnvironmentDelta> {
    let speed = f64::from(speed);
    match mode {
        AcMode::Cool if temperature > target => Some(EnvironmentDelta {
            temperature: -TEMPERATURE_STEP * speed,
            humidity: -HUMIDITY_STEP * speed,
            ..EnvironmentDelta::default()
        }),
        AcMode::Heat if temperature < target => Some(EnvironmentDelta {
            temperature: TEMPERATURE_STEP * speed,
            humidity: HUMIDITY_STEP * speed / 2.0,
            ..EnvironmentDelta::default()
        }),
        _ => None,
    }
}

fn read_powered<A: AirConditionerHandle + ?Sized>(
    ac: &A,
) -> DeviceResult<Option<(AcMode, u8, f64)>> {
    if !ac.is_on()? {
        return Ok(None);
    }
    Ok(Some((ac.mode()?, ac.speed()?, ac.target_temperature()?)))
}

impl<C, P> ControlLoop for AirConditioningLoop<C, P>
where
    C: DeviceCatalog + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    const NAME: &'static str = "air_conditioning";

    async fn tick(&mut self) -> Result<ControlFlow<()>, SimError> {
        let state = self.shared.env.snapshot().await?;

        let mut total = EnvironmentDelta::default();
        let mut unreachable = Vec::new();
        for ac in self.shared.catalog.air_conditioners() {
            let (mode, speed, target) = match read_powered(ac.as_ref()) {
                Ok(Some(setting)) => setting,
                Ok(None) => continue,
                Err(err) => {
                    unreachable.push(err);
                    continue;
                }
            };
            if let Some(delta) = feedback(mode, speed, target, state.temperature) {
                total.temperature += delta.temperature;
                total.humidity += delta.humidity;
            }
        }

        if !total.is_zero() {
            self.shared.env.apply(total).await?;
        }
        self.shared
            .publish_unavailable(unreachable, state.minute)
            .await;
        Ok(ControlFlow::Continue(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_cool_and_dry_while_above_target() {
        let delta = feedback(AcMode::Cool, 3, 24.0, 30.0).unwrap();
        assert!((delta.temperature + 0.15).abs() < 1e-9);
        assert!((delta.humidity + 0.06).abs() < 1e-9);
    }

    #[test]
    fn should_heat_and_add_half_humidity_while_below_target() {
        let delta = feedback(AcMode::Heat, 2, 26.0, 15.0).unwrap();
        assert!((delta.temperature - 0.1).abs() < 1e-9);
        assert!((delta.humidity - 0.02).abs() < 1e-9);
    }

    #[test]
    fn should_do_nothing_once_target_reached_or_idle() {
        assert!(feedback(AcMode::Cool, 3, 24.0, 24.0).is_none());
        assert!(feedback(AcMode::Heat, 3, 24.0, 25.0).is_none());
        assert!(feedback(AcMode::Off, 3, 24.0, 30.0).is_none());
    }
}
