//! Light feedback: powered lights add artificial light to the room.

use std::ops::ControlFlow;

use homesim_domain::error::SimError;

use super::{ControlLoop, Shared};
use crate::ports::{DeviceCatalog, DeviceResult, EventPublisher, LightHandle};

/// Lux added by one light per percent of brightness.
pub(crate) const LUX_PER_PERCENT: f64 = 3.0;

pub(crate) struct LightLoop<C, P> {
    shared: Shared<C, P>,
}

impl<C, P> LightLoop<C, P> {
    pub(crate) fn new(shared: Shared<C, P>) -> Self {
        Self { shared }
    }
}

/// Lux a light adds right now.
fn read_output<L: LightHandle + ?Sized>(light: &L) -> DeviceResult<f64> {
    if !light.is_on()? {
        return Ok(0.0);
    }
    Ok(f64::from(light.brightness()?) * LUX_PER_PERCENT)
}

impl<C, P> ControlLoop for LightLoop<C, P>
where
    C: DeviceCatalog + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    const NAME: &'static str = "lights";

    async fn tick(&mut self) -> Result<ControlFlow<()>, SimError> {
        let mut artificial = 0.0;
        let mut unreachable = Vec::new();
        for light in self.shared.catalog.lights() {
            match read_output(light.as_ref()) {
                Ok(lux) => artificial += lux,
                // contributes nothing this tick
                Err(err) => unreachable.push(err),
            }
        }

        let state = self
            .shared
            .env
            .modify(move |s| s.artificial_light = artificial)
            .await?;
        self.shared
            .publish_unavailable(unreachable, state.minute)
            .await;
        Ok(ControlFlow::Continue(()))
    }
}
