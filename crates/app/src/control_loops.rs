//! Periodic control loops driven by the simulation.
//!
//! Each loop runs in its own task with its own tick interval. A loop is a
//! value implementing [`ControlLoop`]; [`drive`] ticks it until the
//! shutdown token is cancelled or the loop asks to stop, then hands the
//! value back so the orchestrator can read what it collected.

mod air_conditioning;
mod clock;
mod drift;
mod emergency;
mod events;
mod lights;
mod reporting;
mod sensors;

use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use homesim_domain::error::{SimError, TransientReadError};
use homesim_domain::event::SimEvent;

use crate::devices;
use crate::emergency::EmergencyController;
use crate::environment::EnvironmentHandle;
use crate::ports::{DeviceCatalog, EventPublisher};

pub(crate) use air_conditioning::AirConditioningLoop;
pub(crate) use clock::ClockLoop;
pub(crate) use drift::DriftLoop;
pub(crate) use emergency::EmergencyLoop;
pub(crate) use events::EventLoop;
pub(crate) use lights::LightLoop;
pub(crate) use reporting::ReportLoop;
pub(crate) use sensors::SensorLoop;

pub(crate) trait ControlLoop: Send {
    const NAME: &'static str;

    /// One pass. `Break` ends the loop.
    fn tick(&mut self) -> impl Future<Output = Result<ControlFlow<()>, SimError>> + Send;
}

/// Tick `control` every `period` until `shutdown` is cancelled or the loop
/// breaks. Tick errors are logged and the loop carries on.
pub(crate) async fn drive<L: ControlLoop>(
    mut control: L,
    period: Duration,
    shutdown: CancellationToken,
) -> L {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::debug!(control_loop = L::NAME, ?period, "control loop started");

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = interval.tick() => {
                match control.tick().await {
                    Ok(ControlFlow::Continue(())) => {}
                    Ok(ControlFlow::Break(())) => break,
                    Err(err) => {
                        tracing::warn!(control_loop = L::NAME, error = %err, "tick failed");
                    }
                }
            }
        }
    }

    tracing::debug!(control_loop = L::NAME, "control loop stopped");
    control
}

/// Handles every loop needs.
pub(crate) struct Shared<C, P> {
    pub(crate) env: EnvironmentHandle,
    pub(crate) catalog: Arc<C>,
    pub(crate) publisher: Arc<P>,
    pub(crate) emergency: Arc<EmergencyController>,
}

impl<C, P> Clone for Shared<C, P> {
    fn clone(&self) -> Self {
        Self {
            env: self.env.clone(),
            catalog: Arc::clone(&self.catalog),
            publisher: Arc::clone(&self.publisher),
            emergency: Arc::clone(&self.emergency),
        }
    }
}

impl<C, P> Shared<C, P>
where
    C: DeviceCatalog,
    P: EventPublisher + Send + Sync,
{
    pub(crate) async fn publish(&self, event: SimEvent) {
        if let Err(err) = self.publisher.publish(event).await {
            tracing::warn!(error = %err, "failed to publish journal record");
        }
    }

    pub(crate) async fn publish_all(&self, events: Vec<SimEvent>) {
        for event in events {
            self.publish(event).await;
        }
    }

    /// Journal the devices skipped this tick.
    pub(crate) async fn publish_unavailable(&self, errors: Vec<TransientReadError>, minute: u32) {
        for err in errors {
            self.publish(devices::unavailable(&err, minute)).await;
        }
    }
}
