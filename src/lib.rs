//! Home energy-management simulator.
//!
//! Tracks household devices against a grid power budget, drives them from
//! timers and fixed-length appliance cycles, and advances a minute-stepped
//! clock through a single day.

#[cfg(feature = "api")]
pub mod api;
pub mod cli;
/// Textual command language executed against the engine.
pub mod command;
pub mod config;
pub mod devices;
pub mod error;
pub mod io;
pub mod reporting;
pub mod runner;
/// Clock, timers, power controller, and engine.
pub mod sim;

pub use error::{Result, SimError};
