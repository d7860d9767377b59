//! Error types for the scheduling core.

use thiserror::Error;

use crate::sim::clock::Minute;

/// Failures surfaced by the device registry, power controller, and clock.
///
/// Every variant except [`SimError::PowerBudgetUnsatisfiable`] is
/// recoverable: the failing operation leaves all state untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("unknown device \"{0}\"")]
    UnknownDevice(String),

    #[error("device id \"{0}\" is already registered")]
    DuplicateId(String),

    #[error("invalid time \"{0}\", expected HH:MM between 00:00 and 23:59")]
    InvalidTimeFormat(String),

    #[error("cannot move clock from minute {current} to minute {target}")]
    InvalidTarget { current: Minute, target: Minute },

    /// No shed-eligible device is left while the budget is still exceeded.
    #[error(
        "power budget unsatisfiable while activating \"{device_id}\": \
         {total_kw:.2} kW active, {allowed_kw:.2} kW allowed"
    )]
    PowerBudgetUnsatisfiable {
        device_id: String,
        total_kw: f64,
        allowed_kw: f64,
    },
}

impl SimError {
    /// Returns `true` for faults that signal a broken configuration rather
    /// than a rejected request.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::PowerBudgetUnsatisfiable { .. })
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
