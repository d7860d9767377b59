//! Core simulation types: tick records and state transitions.

use std::fmt;

use super::clock::{Minute, format_hhmm};

/// A device state change observed during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// A timer switched the device on.
    Started(String),
    /// A timer switched the device off.
    Stopped(String),
    /// An auto device finished its cycle.
    CycleCompleted(String),
    /// The budget controller forced the device off.
    Shed(String),
}

impl Transition {
    pub fn device_id(&self) -> &str {
        match self {
            Self::Started(id) | Self::Stopped(id) | Self::CycleCompleted(id) | Self::Shed(id) => id,
        }
    }

    /// Stable lowercase label used in exports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Started(_) => "started",
            Self::Stopped(_) => "stopped",
            Self::CycleCompleted(_) => "cycle_completed",
            Self::Shed(_) => "shed",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.label(), self.device_id())
    }
}

/// Complete record of one clock tick.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Minute of the day this tick resolved.
    pub minute: Minute,
    /// State changes in the order they happened.
    pub transitions: Vec<Transition>,
    /// Net active power after the tick (kW; negative = grid draw).
    pub total_kw: f64,
    /// Allowed grid draw magnitude after the tick (kW).
    pub allowed_kw: f64,
    /// Number of active devices after the tick.
    pub active_count: usize,
}

impl StepResult {
    /// Returns `true` when the tick changed any device state.
    pub fn has_transitions(&self) -> bool {
        !self.transitions.is_empty()
    }

    /// Transitions joined with `;`, as written to telemetry exports.
    pub fn transitions_joined(&self) -> String {
        self.transitions
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | net={:>6.2} kW  allowed={:>5.2} kW  active={:>2} | {}",
            format_hhmm(self.minute),
            self.total_kw,
            self.allowed_kw,
            self.active_count,
            self.transitions_joined(),
        )
    }
}
