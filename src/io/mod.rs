//! Telemetry and report export.

pub mod export;
