//! # homesimd — homesim daemon
//!
//! Composition root that wires the virtual devices, the journal and the
//! simulation engine together, then runs one scenario.
//!
//! ## Responsibilities
//! - Parse configuration (CLI argument, env vars, config file)
//! - Install the `tracing` subscriber (console, optional file)
//! - Build the virtual device catalog and the in-process journal bus
//! - Load the scenario and run the simulation
//! - Stop the simulation on Ctrl-C and flush the journal
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no simulation logic belongs here.

mod config;
mod journal;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use homesim_adapter_virtual::VirtualCatalog;
use homesim_app::event_bus::InProcessEventBus;
use homesim_app::simulation::Simulation;
use homesim_domain::config::SimulationConfig;

use crate::config::{Config, LoggingConfig};

const JOURNAL_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = Config::load().context("failed to load daemon configuration")?;
    if let Some(scenario) = std::env::args_os().nth(1) {
        config.simulation.scenario = Some(PathBuf::from(scenario));
    }
    init_tracing(&config.logging)?;

    let bus = Arc::new(InProcessEventBus::new(JOURNAL_CAPACITY));
    let sink = tokio::spawn(journal::forward(bus.subscribe()));

    let catalog = Arc::new(if config.devices.is_empty() {
        VirtualCatalog::demo()
    } else {
        VirtualCatalog::from_specs(&config.devices)
    });
    tracing::info!(devices = catalog.len(), "device catalog ready");

    let built = match &config.simulation.scenario {
        Some(path) => Simulation::load(path, catalog, Arc::clone(&bus))
            .await
            .with_context(|| format!("failed to load scenario {}", path.display())),
        None => Simulation::new(SimulationConfig::default(), catalog, Arc::clone(&bus))
            .context("invalid built-in scenario"),
    };
    let simulation = match built {
        Ok(simulation) => Arc::new(simulation),
        Err(err) => {
            drop(bus);
            let _ = sink.await;
            return Err(err);
        }
    };

    let interrupt = tokio::spawn({
        let simulation = Arc::clone(&simulation);
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, stopping simulation");
                simulation.stop().await;
            }
        }
    });

    let summary = simulation.start().await.context("simulation failed")?;
    interrupt.abort();
    tracing::info!(
        minutes = summary.minutes_simulated,
        fired = ?summary.fired_events,
        pending = summary.pending_events,
        emergencies = summary.emergency_activations,
        reason = ?summary.stop_reason,
        final_state = %summary.final_state.clock(),
        "run finished"
    );

    drop(simulation);
    drop(bus);
    let forwarded = sink.await.context("journal sink failed")?;
    tracing::debug!(forwarded, "journal flushed");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&logging.filter)
        .with_context(|| format!("invalid log filter {:?}", logging.filter))?;

    let file_layer = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(())
}
