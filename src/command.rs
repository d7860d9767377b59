use std::str::FromStr;

use thiserror::Error;

use crate::error::SimError;
use crate::reporting::{device_report, energy_report};
use crate::sim::clock::{Minute, parse_hhmm};
use crate::sim::engine::Engine;
use crate::sim::types::StepResult;

/// One parsed line of the household command language.
///
/// | Text | Command |
/// |---|---|
/// | `set <dev> on` / `set <dev> off` | [`Command::SetOn`] / [`Command::SetOff`] |
/// | `set <dev> HH:MM [HH:MM]` | [`Command::SetTimer`] |
/// | `rm <dev>` | [`Command::RemoveTimer`] |
/// | `show` / `show <dev>` | [`Command::ShowAll`] / [`Command::ShowDevice`] |
/// | `set time HH:MM` | [`Command::SetTime`] |
/// | `reset time` / `reset timers` / `reset all` | resets |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetOn(String),
    SetOff(String),
    SetTimer {
        device: String,
        start: Minute,
        stop: Option<Minute>,
    },
    RemoveTimer(String),
    ShowAll,
    ShowDevice(String),
    SetTime(Minute),
    ResetTime,
    ResetTimers,
    ResetAll,
}

/// Reasons a command line could not be parsed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unrecognized command \"{0}\"")]
    Unrecognized(String),

    #[error("invalid time \"{0}\", expected HH:MM between 00:00 and 23:59")]
    InvalidTime(String),

    #[error("timer stop {stop} must be after start {start}")]
    StopNotAfterStart { start: String, stop: String },
}

/// What executing a command did, for the caller to log or print.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// State changed (or a no-op) with nothing further to report.
    Applied,
    /// A device was switched on; these ids were shed to stay in budget.
    Activated { shed: Vec<String> },
    /// The clock moved; one result per resolved minute.
    Advanced { ticks: Vec<StepResult> },
    /// A rendered report.
    Report(String),
}

fn time(token: &str) -> Result<Minute, CommandError> {
    parse_hhmm(token).map_err(|_| CommandError::InvalidTime(token.to_string()))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let unrecognized = || CommandError::Unrecognized(line.trim().to_string());

        match tokens.as_slice() {
            [] => Err(CommandError::Empty),
            ["set", "time", t] => Ok(Self::SetTime(time(t)?)),
            ["set", dev, "on"] => Ok(Self::SetOn((*dev).to_string())),
            ["set", dev, "off"] => Ok(Self::SetOff((*dev).to_string())),
            ["set", dev, start] => Ok(Self::SetTimer {
                device: (*dev).to_string(),
                start: time(start)?,
                stop: None,
            }),
            ["set", dev, start, stop] => {
                let start_min = time(start)?;
                let stop_min = time(stop)?;
                if stop_min <= start_min {
                    return Err(CommandError::StopNotAfterStart {
                        start: (*start).to_string(),
                        stop: (*stop).to_string(),
                    });
                }
                Ok(Self::SetTimer {
                    device: (*dev).to_string(),
                    start: start_min,
                    stop: Some(stop_min),
                })
            }
            ["rm", dev] => Ok(Self::RemoveTimer((*dev).to_string())),
            ["show"] => Ok(Self::ShowAll),
            ["show", dev] => Ok(Self::ShowDevice((*dev).to_string())),
            ["reset", "time"] => Ok(Self::ResetTime),
            ["reset", "timers"] => Ok(Self::ResetTimers),
            ["reset", "all"] => Ok(Self::ResetAll),
            _ => Err(unrecognized()),
        }
    }
}

impl Command {
    /// Runs the command against the engine.
    ///
    /// # Errors
    ///
    /// Propagates the engine's [`SimError`]; recoverable errors leave the
    /// engine unchanged.
    pub fn execute(&self, engine: &mut Engine) -> Result<Outcome, SimError> {
        match self {
            Self::SetOn(id) => {
                let shed = engine.activate_device(id)?;
                Ok(Outcome::Activated { shed })
            }
            Self::SetOff(id) => {
                if engine.controller().device(id).is_none() {
                    return Err(SimError::UnknownDevice(id.clone()));
                }
                engine.deactivate_device(id);
                Ok(Outcome::Applied)
            }
            Self::SetTimer { device, start, stop } => {
                engine.schedule_timer(device, *start, *stop)?;
                Ok(Outcome::Applied)
            }
            Self::RemoveTimer(id) => {
                if engine.controller().device(id).is_none() {
                    return Err(SimError::UnknownDevice(id.clone()));
                }
                engine.cancel_timer(id);
                Ok(Outcome::Applied)
            }
            Self::ShowAll => Ok(Outcome::Report(energy_report(engine))),
            Self::ShowDevice(id) => engine
                .controller()
                .device(id)
                .map(|d| Outcome::Report(device_report(d)))
                .ok_or_else(|| SimError::UnknownDevice(id.clone())),
            Self::SetTime(minute) => {
                let ticks = engine.advance_time_to(*minute)?.to_vec();
                Ok(Outcome::Advanced { ticks })
            }
            Self::ResetTime => {
                engine.reset_clock();
                Ok(Outcome::Applied)
            }
            Self::ResetTimers => {
                engine.reset_timers();
                Ok(Outcome::Applied)
            }
            Self::ResetAll => {
                engine.reset_all();
                Ok(Outcome::Applied)
            }
        }
    }
}
