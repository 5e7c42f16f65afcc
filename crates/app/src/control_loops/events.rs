//! Scheduled events and automation.
//!
//! Each tick fires the due events in configuration order, then evaluates
//! the automation rules on a fresh snapshot and pushes the plan through the
//! emergency gate. Nothing is checked while emergency mode is active, so an
//! event whose minute passed during an emergency fires on the first tick
//! after recovery.

use std::ops::ControlFlow;
use std::sync::Arc;

use homesim_domain::error::SimError;
use homesim_domain::event::{EventType, SimEvent};
use homesim_domain::schedule::{EventEffect, ScheduledEvent};

use super::{ControlLoop, Shared};
use crate::automation_engine::AutomationEngine;
use crate::devices;
use crate::ports::{DeviceCatalog, EventPublisher};
use crate::scheduler::EventScheduler;

pub(crate) struct EventLoop<C, P> {
    shared: Shared<C, P>,
    scheduler: EventScheduler,
    engine: AutomationEngine<C>,
    fired: Vec<String>,
}

impl<C, P> EventLoop<C, P> {
    pub(crate) fn new(
        shared: Shared<C, P>,
        scheduler: EventScheduler,
        engine: AutomationEngine<C>,
    ) -> Self {
        Self {
            shared,
            scheduler,
            engine,
            fired: Vec::new(),
        }
    }

    /// Names of the fired events in firing order, and how many never fired.
    pub(crate) fn into_outcome(self) -> (Vec<String>, usize) {
        let pending = self.scheduler.pending();
        (self.fired, pending)
    }
}

impl<C, P> EventLoop<C, P>
where
    C: DeviceCatalog + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    /// Apply one due event. Returns `false`, leaving it pending, when
    /// emergency mode blocked it.
    async fn fire(&mut self, event: &ScheduledEvent, minute: u32) -> Result<bool, SimError> {
        let mut data = match event.effect {
            EventEffect::Delta(delta) => {
                let emergency = Arc::clone(&self.shared.emergency);
                let applied = self
                    .shared
                    .env
                    .modify_if(move |s| emergency.gate(|| s.apply(&delta)).is_some())
                    .await?;
                let Some(after) = applied else {
                    return Ok(false);
                };
                serde_json::json!({
                    "event": event.name,
                    "trigger_minute": event.trigger_minute,
                    "delta": delta,
                    "environment": after,
                })
            }
            EventEffect::Hazard(kind) => {
                if self.shared.emergency.is_active() {
                    return Ok(false);
                }
                serde_json::json!({
                    "event": event.name,
                    "trigger_minute": event.trigger_minute,
                    "hazard": kind,
                })
            }
        };

        tracing::info!(event = %event.name, minute, "scheduled event fired");
        self.fired.push(event.name.clone());
        let (snapshots, _) = devices::snapshot(self.shared.catalog.as_ref());
        data["devices"] = serde_json::json!(snapshots);

        match event.effect {
            EventEffect::Delta(delta) => {
                let record = SimEvent::info(
                    EventType::EventFired,
                    minute,
                    format!(
                        "{}: temperature {:+.1}°C, humidity {:+.1}%, CO2 {:+.0} ppm, occupancy {:+}",
                        event.name, delta.temperature, delta.humidity, delta.co2, delta.occupancy
                    ),
                )
                .with_data(data);
                self.shared.publish(record).await;
            }
            EventEffect::Hazard(kind) => {
                let record = SimEvent::alert(
                    EventType::EventFired,
                    minute,
                    format!("{}: {kind} hazard", event.name),
                )
                .with_data(data);
                self.shared.publish(record).await;
                let records =
                    self.shared
                        .emergency
                        .raise_hazard(kind, minute, self.shared.catalog.as_ref());
                self.shared.publish_all(records).await;
            }
        }
        Ok(true)
    }
}

impl<C, P> ControlLoop for EventLoop<C, P>
where
    C: DeviceCatalog + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    const NAME: &'static str = "events";

    async fn tick(&mut self) -> Result<ControlFlow<()>, SimError> {
        if self.shared.emergency.is_active() {
            return Ok(ControlFlow::Continue(()));
        }

        let minute = self.shared.env.snapshot().await?.minute;
        while let Some((index, event)) = self
            .scheduler
            .next_due(minute)
            .map(|(index, event)| (index, event.clone()))
        {
            if !self.fire(&event, minute).await? {
                break;
            }
            self.scheduler.mark_fired(index);
        }

        let state = self.shared.env.snapshot().await?;
        let plan = self.engine.plan(&state);
        if let Some(records) = self
            .engine
            .apply(&plan, state.minute, &self.shared.emergency)
        {
            self.shared.publish_all(records).await;
        }
        Ok(ControlFlow::Continue(()))
    }
}
