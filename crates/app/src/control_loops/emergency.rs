//! Emergency check: hazard thresholds and CO2 recovery.

use std::ops::ControlFlow;

use homesim_domain::error::SimError;

use super::{ControlLoop, Shared};
use crate::ports::{DeviceCatalog, EventPublisher};

pub(crate) struct EmergencyLoop<C, P> {
    shared: Shared<C, P>,
}

impl<C, P> EmergencyLoop<C, P> {
    pub(crate) fn new(shared: Shared<C, P>) -> Self {
        Self { shared }
    }
}

impl<C, P> ControlLoop for EmergencyLoop<C, P>
where
    C: DeviceCatalog + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    const NAME: &'static str = "emergency";

    async fn tick(&mut self) -> Result<ControlFlow<()>, SimError> {
        let shared = &self.shared;
        let catalog = shared.catalog.as_ref();
        let state = shared.env.snapshot().await?;

        let records = shared.emergency.check_co2(&state, catalog);
        shared.publish_all(records).await;
        let records = shared.emergency.check_temperature(&state, catalog);
        shared.publish_all(records).await;

        if shared.emergency.co2_recovery_due(state.minute) {
            let nominal = shared.emergency.nominal_co2();
            // reset first so the next check cannot re-enter
            let state = shared.env.modify(move |s| s.co2 = nominal).await?;
            let records = shared
                .emergency
                .complete_co2_recovery(state.minute, catalog);
            shared.publish_all(records).await;
        }
        Ok(ControlFlow::Continue(()))
    }
}
