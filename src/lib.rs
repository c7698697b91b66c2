//! # raillamp
//!
//! Motion-activated handrail lighting controller.
//!
//! The library holds everything the `raillamp` binary runs, split so the
//! control logic can be driven by scripted fakes in tests.
//!
//! - **Entry point**: [`Raillamp`] wires configuration, hardware and HTTP, then
//!   hands over to the main loop in `core`.
//! - **Control**: `core::Controller` runs one tick of motion, schedule, fade
//!   and telemetry logic.
//! - **Scheduling**: `schedule` resolves the daily lighting window, remotely
//!   fetched or described in the config, plus the manual arm override.
//! - **Output**: `light` fades the fixture, `telemetry` queues and delivers
//!   events to an HTTP endpoint.
//! - **Infrastructure**: configuration, logging, signals, instance locking
//!   and the status file.

#[macro_use]
pub mod logger;

pub mod args;
pub mod commands;
pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod io;
pub mod light;
pub mod motion;
pub mod network;
pub mod schedule;
pub mod status;
pub mod telemetry;
pub mod time_source;
pub mod transport;

mod raillamp;

#[cfg(any(test, feature = "testing-support"))]
pub mod testing;

pub use raillamp::Raillamp;
