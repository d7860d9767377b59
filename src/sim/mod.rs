mod active;
/// Minute-stepped simulation clock and time-of-day conversion.
pub mod clock;
pub mod controller;
pub mod engine;
/// Power balance helpers for budget enforcement.
pub mod power_balance;
/// Per-device timer table.
pub mod schedule;
pub mod types;
