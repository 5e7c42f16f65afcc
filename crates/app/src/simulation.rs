//! Simulation orchestrator — owns the environment and supervises the
//! control loops.
//!
//! ```text
//! Simulation::start
//!     │
//!     ├─► environment owner task (single writer of EnvironmentState)
//!     ├─► clock        one simulated minute per minute_tick
//!     ├─► drift        scenario drift + daylight (frozen in emergency)
//!     ├─► sensors      environment → active sensors
//!     ├─► lights       powered lights → artificial light
//!     ├─► air_conditioning  powered ACs → temperature/humidity
//!     ├─► events       scheduled events + automation (suspended in emergency)
//!     ├─► emergency    CO2 / temperature thresholds, CO2 recovery
//!     └─► reporting    periodic status report
//! ```
//!
//! The run ends when the clock reaches the configured duration or when
//! [`Simulation::stop`] is called. Every loop is joined before `start`
//! returns.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use homesim_domain::config::SimulationConfig;
use homesim_domain::environment::EnvironmentState;
use homesim_domain::error::{InvariantViolation, SimError, ValidationError};
use homesim_domain::event::{EventType, SimEvent};
use homesim_domain::hazard::HazardKind;
use homesim_domain::schedule::ScheduledEvent;

use crate::automation_engine::AutomationEngine;
use crate::config::{self, ConfigError};
use crate::control_loops::{
    self, AirConditioningLoop, ClockLoop, DriftLoop, EmergencyLoop, EventLoop, LightLoop,
    ReportLoop, SensorLoop, Shared,
};
use crate::emergency::{EmergencyController, EmergencyStatus};
use crate::environment::{self, EnvironmentHandle};
use crate::ports::{DeviceCatalog, EventPublisher};
use crate::scheduler::EventScheduler;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The clock reached the configured duration.
    Completed,
    /// [`Simulation::stop`] was called.
    Stopped,
}

/// Outcome of [`Simulation::start`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub final_state: EnvironmentState,
    pub minutes_simulated: u32,
    /// Names of the scheduled events that fired, in firing order.
    pub fired_events: Vec<String>,
    /// Scheduled events that never fired.
    pub pending_events: usize,
    pub emergency_activations: u32,
    pub stop_reason: StopReason,
}

pub struct Simulation<C, P> {
    config: SimulationConfig,
    schedule: Vec<ScheduledEvent>,
    catalog: Arc<C>,
    publisher: Arc<P>,
    emergency: Arc<EmergencyController>,
    shutdown: CancellationToken,
    started: AtomicBool,
    finished: watch::Sender<bool>,
    environment: Mutex<Option<EnvironmentHandle>>,
    last_state: Mutex<EnvironmentState>,
}

impl<C, P> Simulation<C, P>
where
    C: DeviceCatalog + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    /// Build a simulation from a validated configuration.
    ///
    /// The environment starts from the configured initial readings.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the configuration is invalid.
    pub fn new(
        config: SimulationConfig,
        catalog: Arc<C>,
        publisher: Arc<P>,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        let schedule = config.schedule()?;
        let initial = config.initial_state();
        let emergency = Arc::new(EmergencyController::new(config.emergency.clone()));
        let (finished, _) = watch::channel(false);

        Ok(Self {
            config,
            schedule,
            catalog,
            publisher,
            emergency,
            shutdown: CancellationToken::new(),
            started: AtomicBool::new(false),
            finished,
            environment: Mutex::new(None),
            last_state: Mutex::new(initial),
        })
    }

    /// Load a scenario file and build a simulation from it.
    ///
    /// A failure is reported as an ALERT record through `publisher` before
    /// being returned; no loop is started.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed or
    /// validated.
    #[tracing::instrument(skip(catalog, publisher))]
    pub async fn load(
        path: &Path,
        catalog: Arc<C>,
        publisher: Arc<P>,
    ) -> Result<Self, ConfigError> {
        let built = config::load(path)
            .and_then(|config| Self::new(config, catalog, Arc::clone(&publisher)).map_err(Into::into));
        if let Err(err) = &built {
            tracing::error!(error = %err, "configuration rejected");
            let record = SimEvent::alert(
                EventType::ConfigurationFailed,
                0,
                format!("cannot load {}: {err}", path.display()),
            )
            .with_data(serde_json::json!({ "path": path.display().to_string() }));
            if let Err(publish_err) = publisher.publish(record).await {
                tracing::warn!(error = %publish_err, "failed to publish journal record");
            }
        }
        built
    }

    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[must_use]
    pub fn is_emergency(&self) -> bool {
        self.emergency.is_active()
    }

    #[must_use]
    pub fn emergency_status(&self) -> EmergencyStatus {
        self.emergency.status()
    }

    /// Consistent copy of the environment.
    ///
    /// Before the run this is the initial state, after it the final one.
    pub async fn snapshot(&self) -> EnvironmentState {
        let handle = self.lock_environment().clone();
        if let Some(handle) = handle {
            if let Ok(state) = handle.snapshot().await {
                return state;
            }
        }
        self.lock_last_state().clone()
    }

    /// Clear a hazard flag. Returns whether it was detected.
    ///
    /// Emergency mode ends once no hazard remains and no CO2 emergency runs.
    pub async fn clear_hazard(&self, kind: HazardKind) -> bool {
        let minute = self.snapshot().await.minute;
        let records = self.emergency.clear_hazard(kind, minute);
        let cleared = !records.is_empty();
        for record in records {
            if let Err(err) = self.publisher.publish(record).await {
                tracing::warn!(error = %err, "failed to publish journal record");
            }
        }
        cleared
    }

    /// Run the simulation until the clock reaches the configured duration or
    /// [`Simulation::stop`] is called.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation::AlreadyStarted`] on a second call.
    #[tracing::instrument(skip(self))]
    pub async fn start(&self) -> Result<RunSummary, SimError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(InvariantViolation::AlreadyStarted.into());
        }

        let initial = self.lock_last_state().clone();
        let start_minute = initial.minute;
        let timing = &self.config.timing;
        tracing::info!(
            start = %initial.clock(),
            duration_minutes = timing.duration_minutes,
            events = self.schedule.len(),
            "simulation started"
        );

        let (env, owner) = environment::spawn(initial.clone());
        *self.lock_environment() = Some(env.clone());
        let shared = Shared {
            env: env.clone(),
            catalog: Arc::clone(&self.catalog),
            publisher: Arc::clone(&self.publisher),
            emergency: Arc::clone(&self.emergency),
        };
        shared
            .publish(
                SimEvent::info(
                    EventType::SimulationStarted,
                    start_minute,
                    format!(
                        "simulation started at {} for {} minutes with {} scheduled events",
                        initial.clock(),
                        timing.duration_minutes,
                        self.schedule.len()
                    ),
                )
                .with_data(serde_json::json!({ "environment": initial })),
            )
            .await;

        let token = self.shutdown.clone();
        let ms = Duration::from_millis;
        let clock = tokio::spawn(control_loops::drive(
            ClockLoop::new(env.clone(), timing.end_minute()),
            timing.minute_tick(),
            token.clone(),
        ));
        let events = tokio::spawn(control_loops::drive(
            EventLoop::new(
                shared.clone(),
                EventScheduler::new(self.schedule.clone()),
                AutomationEngine::new(Arc::clone(&self.catalog), self.config.automation.clone()),
            ),
            ms(timing.automation_tick_ms),
            token.clone(),
        ));
        let seed = timing.seed.unwrap_or_else(rand::random);
        let workers: Vec<JoinHandle<()>> = vec![
            spawn_loop(
                DriftLoop::new(
                    shared.clone(),
                    self.config.scenarios.clone(),
                    self.config.environment.convergence_rate,
                    self.config.environment.peak_daylight,
                    ChaCha8Rng::seed_from_u64(seed),
                ),
                ms(timing.drift_tick_ms),
                token.clone(),
            ),
            spawn_loop(
                SensorLoop::new(shared.clone()),
                ms(timing.sensor_tick_ms),
                token.clone(),
            ),
            spawn_loop(
                LightLoop::new(shared.clone()),
                ms(timing.light_tick_ms),
                token.clone(),
            ),
            spawn_loop(
                AirConditioningLoop::new(shared.clone()),
                ms(timing.ac_tick_ms),
                token.clone(),
            ),
            spawn_loop(
                EmergencyLoop::new(shared.clone()),
                ms(timing.emergency_tick_ms),
                token.clone(),
            ),
            spawn_loop(
                ReportLoop::new(shared.clone(), start_minute, timing.report_every_minutes),
                ms(timing.logging_tick_ms),
                token.clone(),
            ),
        ];

        // the clock ends first, at the configured duration or on stop()
        let stop_reason = match clock.await {
            Ok(clock) if clock.reached_end() => StopReason::Completed,
            Ok(_) => StopReason::Stopped,
            Err(err) => {
                tracing::error!(error = %err, "clock loop failed");
                StopReason::Stopped
            }
        };
        token.cancel();

        for worker in workers {
            if let Err(err) = worker.await {
                tracing::error!(error = %err, "control loop failed");
            }
        }
        let (fired_events, pending_events) = match events.await {
            Ok(events) => events.into_outcome(),
            Err(err) => {
                tracing::error!(error = %err, "events loop failed");
                (Vec::new(), self.schedule.len())
            }
        };

        let final_state = env.snapshot().await.unwrap_or(initial);
        self.lock_environment().take();
        *self.lock_last_state() = final_state.clone();
        let publisher = Arc::clone(&shared.publisher);
        drop(shared);
        drop(env);
        if let Err(err) = owner.await {
            tracing::error!(error = %err, "environment owner failed");
        }

        let summary = RunSummary {
            minutes_simulated: final_state.minute.saturating_sub(start_minute),
            final_state,
            fired_events,
            pending_events,
            emergency_activations: self.emergency.activations(),
            stop_reason,
        };
        tracing::info!(
            minutes = summary.minutes_simulated,
            fired = summary.fired_events.len(),
            pending = summary.pending_events,
            reason = ?summary.stop_reason,
            "simulation stopped"
        );
        let record = SimEvent::info(
            EventType::SimulationStopped,
            summary.final_state.minute,
            format!(
                "simulation stopped after {} minutes ({:?})",
                summary.minutes_simulated, summary.stop_reason
            ),
        )
        .with_data(serde_json::json!(summary));
        if let Err(err) = publisher.publish(record).await {
            tracing::warn!(error = %err, "failed to publish journal record");
        }

        self.finished.send_replace(true);
        Ok(summary)
    }

    /// Signal every loop to stop and wait for the run to be joined.
    ///
    /// Idempotent. Returns immediately if the simulation never started.
    pub async fn stop(&self) {
        self.shutdown.cancel();
        if !self.started.load(Ordering::SeqCst) {
            return;
        }
        let mut finished = self.finished.subscribe();
        // the sender lives as long as `self`
        let _ = finished.wait_for(|done| *done).await;
    }

    fn lock_environment(&self) -> MutexGuard<'_, Option<EnvironmentHandle>> {
        self.environment
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_last_state(&self) -> MutexGuard<'_, EnvironmentState> {
        self.last_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn spawn_loop<L>(control: L, period: Duration, shutdown: CancellationToken) -> JoinHandle<()>
where
    L: control_loops::ControlLoop + 'static,
{
    tokio::spawn(async move {
        control_loops::drive(control, period, shutdown).await;
    })
}
