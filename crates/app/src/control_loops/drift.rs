//! Natural drift toward the scenario target, plus daylight.
//!
//! Frozen while emergency mode is active. Temperature and humidity only
//! drift while no air conditioner is powered; an unreachable one counts as
//! powered.

use std::ops::ControlFlow;
use std::sync::Arc;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use homesim_domain::environment::{self, ScenarioTargets};
use homesim_domain::error::SimError;

use super::{ControlLoop, Shared};
use crate::devices;
use crate::ports::{DeviceCatalog, EventPublisher};

pub(crate) struct DriftLoop<C, P> {
    shared: Shared<C, P>,
    targets: ScenarioTargets,
    rate: f64,
    peak_daylight: f64,
    rng: ChaCha8Rng,
}

impl<C, P> DriftLoop<C, P> {
    pub(crate) fn new(
        shared: Shared<C, P>,
        targets: ScenarioTargets,
        rate: f64,
        peak_daylight: f64,
        rng: ChaCha8Rng,
    ) -> Self {
        Self {
            shared,
            targets,
            rate,
            peak_daylight,
            rng,
        }
    }
}

impl<C, P> ControlLoop for DriftLoop<C, P>
where
    C: DeviceCatalog + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    const NAME: &'static str = "drift";

    async fn tick(&mut self) -> Result<ControlFlow<()>, SimError> {
        if self.shared.emergency.is_active() {
            return Ok(ControlFlow::Continue(()));
        }

        let (ac_on, unreachable) = devices::any_ac_on(self.shared.catalog.as_ref());
        let noise = (
            self.rng.gen_range(-1.0..=1.0),
            self.rng.gen_range(-1.0..=1.0),
        );
        let targets = self.targets.clone();
        let rate = self.rate;
        let peak = self.peak_daylight;
        let emergency = Arc::clone(&self.shared.emergency);

        // re-checked by the owner, so a step never lands after activation
        let drifted = self
            .shared
            .env
            .modify_if(move |s| {
                emergency
                    .gate(|| {
                        s.natural_light = environment::daylight_lux(s.minute, peak);
                        if !ac_on {
                            let target = *targets.for_scenario(s.scenario());
                            s.drift_toward(&target, rate, noise);
                        }
                    })
                    .is_some()
            })
            .await?;

        if !unreachable.is_empty() {
            let minute = match drifted {
                Some(state) => state.minute,
                None => self.shared.env.snapshot().await?.minute,
            };
            self.shared.publish_unavailable(unreachable, minute).await;
        }
        Ok(ControlFlow::Continue(()))
    }
}
