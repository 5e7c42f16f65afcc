//! # homesim-domain
//!
//! Pure domain model for the homesim smart-home simulation.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, the simulated clock
//! - Define the **environment** (physical readings, scenario targets, drift math)
//! - Define **devices** as seen by the engine (kinds, AC modes, snapshots)
//! - Define the **schedule** (timed events and hazard seeds)
//! - Define **hazards** and their one-shot bookkeeping
//! - Define the **automation rules** (a pure function of the environment)
//! - Define **journal records** (leveled log entries produced by the engine)
//! - Define the **simulation configuration** and its validation
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod automation;
pub mod config;
pub mod device;
pub mod environment;
pub mod event;
pub mod hazard;
pub mod schedule;
