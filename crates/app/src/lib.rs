//! # homesim-app
//!
//! Simulation engine — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement:
//!   - `DeviceCatalog` — the air conditioners, lights and sensors of the room
//!   - `EventPublisher` — sink for journal records
//! - Own the environment through a single-writer actor task
//! - Fire scheduled events, evaluate automation rules and run the emergency
//!   controller from independent control loops
//! - Load scenario files and orchestrate a run through [`simulation::Simulation`]
//!
//! ## Dependency rule
//! Depends on `homesim-domain` only (plus `tokio` for tasks, channels and
//! timers). Never imports adapter crates. Adapters depend on *this* crate,
//! not the reverse.

pub mod automation_engine;
pub mod config;
pub(crate) mod control_loops;
pub mod devices;
pub mod emergency;
pub mod environment;
pub mod event_bus;
pub mod ports;
pub mod scheduler;
pub mod simulation;

#[cfg(test)]
pub(crate) mod testing;
