//! Sensor sync: active sensors mirror the environment readings.

use std::ops::ControlFlow;

use homesim_domain::error::SimError;

use super::{ControlLoop, Shared};
use crate::ports::{DeviceCatalog, DeviceHandle, EventPublisher, SensorHandle};

pub(crate) struct SensorLoop<C, P> {
    shared: Shared<C, P>,
}

impl<C, P> SensorLoop<C, P> {
    pub(crate) fn new(shared: Shared<C, P>) -> Self {
        Self { shared }
    }
}

impl<C, P> ControlLoop for SensorLoop<C, P>
where
    C: DeviceCatalog + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    const NAME: &'static str = "sensors";

    async fn tick(&mut self) -> Result<ControlFlow<()>, SimError> {
        let state = self.shared.env.snapshot().await?;

        let mut unreachable = Vec::new();
        for sensor in self.shared.catalog.sensors() {
            let result = sensor.is_on().and_then(|on| {
                if on {
                    sensor.record(state.temperature, state.humidity, state.co2)
                } else {
                    Ok(())
                }
            });
            if let Err(err) = result {
                unreachable.push(err);
            }
        }
        self.shared
            .publish_unavailable(unreachable, state.minute)
            .await;
        Ok(ControlFlow::Continue(()))
    }
}
