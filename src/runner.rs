//! Scenario runner: builds a household from configuration and plays its
//! script against the engine.

use tracing::{debug, info, warn};

use crate::command::{Command, Outcome};
use crate::config::ScenarioConfig;
use crate::error::{Result, SimError};
use crate::sim::clock::parse_hhmm;
use crate::sim::controller::PowerController;
use crate::sim::engine::Engine;

/// Everything a scenario run produced.
#[derive(Debug)]
pub struct RunReport {
    /// Engine in its final state, with the full tick history.
    pub engine: Engine,
    /// Rendered output of every `show` command, in script order.
    pub reports: Vec<String>,
    /// Script lines rejected with a recoverable error: `(line index, message)`.
    pub rejected: Vec<(usize, String)>,
    /// The fault that stopped the script early, if any.
    pub aborted: Option<SimError>,
}

impl RunReport {
    /// Whether the whole script ran.
    pub fn completed(&self) -> bool {
        self.aborted.is_none()
    }
}

/// Registers the configured devices and initial timers on a fresh engine.
///
/// # Errors
///
/// - [`SimError::DuplicateId`] for a repeated device id.
/// - [`SimError::InvalidTimeFormat`] for a malformed timer time.
/// - [`SimError::UnknownDevice`] for a timer naming no device.
///
/// # Panics
///
/// Panics if `grid.max_power_kw` is not positive. Run
/// [`ScenarioConfig::validate`] first.
pub fn build_engine(cfg: &ScenarioConfig) -> Result<Engine> {
    let controller =
        PowerController::with_production(cfg.grid.max_power_kw, cfg.grid.production_id());
    let mut engine = Engine::new(controller);

    for device in &cfg.devices {
        engine.register_device(device.to_device())?;
    }
    for timer in &cfg.timers {
        let start = parse_hhmm(&timer.start)?;
        let stop = timer.stop.as_deref().map(parse_hhmm).transpose()?;
        engine.schedule_timer(&timer.device, start, stop)?;
    }

    debug!(
        devices = cfg.devices.len(),
        timers = cfg.timers.len(),
        max_grid_kw = cfg.grid.max_power_kw,
        "household built"
    );
    Ok(engine)
}

/// Builds the household and executes every script line in order.
///
/// Recoverable command failures are logged and skipped. A budget fault stops
/// the script; the engine is returned as it stood at that point.
///
/// # Errors
///
/// Returns the [`build_engine`] error if the household cannot be built.
pub fn run_scenario(cfg: &ScenarioConfig) -> Result<RunReport> {
    let mut engine = build_engine(cfg)?;
    let mut reports = Vec::new();
    let mut rejected = Vec::new();
    let mut aborted = None;

    for (index, line) in cfg.script.iter().enumerate() {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                warn!(line = index, "skipping \"{line}\": {e}");
                rejected.push((index, e.to_string()));
                continue;
            }
        };

        match command.execute(&mut engine) {
            Ok(Outcome::Activated { shed }) if !shed.is_empty() => {
                info!(at = %engine.current_time(), ?shed, "\"{line}\" shed devices");
            }
            Ok(Outcome::Advanced { ticks }) => {
                for tick in ticks.iter().filter(|t| t.has_transitions()) {
                    debug!("{tick}");
                }
            }
            Ok(Outcome::Report(text)) => reports.push(text),
            Ok(_) => debug!(at = %engine.current_time(), "applied \"{line}\""),
            Err(e) if e.is_fatal() => {
                warn!(line = index, at = %engine.current_time(), "script stopped: {e}");
                aborted = Some(e);
                break;
            }
            Err(e) => {
                warn!(line = index, "rejected \"{line}\": {e}");
                rejected.push((index, e.to_string()));
            }
        }
    }

    Ok(RunReport {
        engine,
        reports,
        rejected,
        aborted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeviceConfig, TimerConfig};

    fn device(id: &str, power_kw: f64, priority: i32, can_shed: bool) -> DeviceConfig {
        DeviceConfig {
            id: id.to_string(),
            power_kw,
            priority,
            can_shed,
            ..DeviceConfig::default()
        }
    }

    #[test]
    fn every_preset_runs_to_completion() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name).unwrap();
            let report = run_scenario(&cfg).unwrap();
            assert!(report.completed(), "preset {name} aborted: {:?}", report.aborted);
            assert!(report.rejected.is_empty(), "preset {name}: {:?}", report.rejected);
            assert!(!report.reports.is_empty());
        }
    }

    #[test]
    fn demo_sheds_heater_when_oven_starts() {
        let report = run_scenario(&ScenarioConfig::demo()).unwrap();
        let engine = &report.engine;
        assert_eq!(engine.current_minute(), 21 * 60);
        let oven_start = engine
            .history()
            .iter()
            .find(|t| t.minute == 18 * 60 + 30)
            .map(|t| t.transitions_joined());
        assert_eq!(oven_start.as_deref(), Some("started:oven;shed:heater"));
        assert!(engine.is_device_active("tv"));
        assert!(engine.is_device_active("fridge"));
        assert!(!engine.is_device_active("heater"));
    }

    #[test]
    fn recoverable_errors_are_skipped() {
        let mut cfg = ScenarioConfig::default();
        cfg.devices.push(device("tv", -0.2, 1, true));
        cfg.script = vec![
            "set ghost on".to_string(),
            "gibberish".to_string(),
            "set tv on".to_string(),
            "set time 00:10".to_string(),
            "set time 00:05".to_string(),
        ];
        let report = run_scenario(&cfg).unwrap();
        assert!(report.completed());
        assert_eq!(
            report.rejected.iter().map(|(i, _)| *i).collect::<Vec<_>>(),
            vec![0, 1, 4]
        );
        assert!(report.engine.is_device_active("tv"));
        assert_eq!(report.engine.current_minute(), 10);
    }

    #[test]
    fn budget_fault_stops_script() {
        let mut cfg = ScenarioConfig::default();
        cfg.grid.max_power_kw = 1.0;
        cfg.devices.push(device("pump", -3.0, 5, false));
        cfg.script = vec!["set pump on".to_string(), "set time 01:00".to_string()];
        let report = run_scenario(&cfg).unwrap();
        assert!(matches!(
            report.aborted,
            Some(SimError::PowerBudgetUnsatisfiable { .. })
        ));
        assert_eq!(report.engine.current_minute(), 0);
        assert!(!report.engine.is_device_active("pump"));
    }

    #[test]
    fn timer_fault_keeps_earlier_ticks() {
        let mut cfg = ScenarioConfig::default();
        cfg.grid.max_power_kw = 1.0;
        cfg.devices.push(device("pump", -3.0, 5, false));
        cfg.timers.push(TimerConfig {
            device: "pump".to_string(),
            start: "00:30".to_string(),
            stop: None,
        });
        cfg.script = vec!["set time 01:00".to_string(), "show".to_string()];
        let report = run_scenario(&cfg).unwrap();
        assert!(!report.completed());
        assert_eq!(report.engine.current_minute(), 30);
        assert_eq!(report.engine.history().len(), 29);
        assert!(report.reports.is_empty());
    }

    #[test]
    fn build_rejects_duplicate_devices() {
        let mut cfg = ScenarioConfig::default();
        cfg.devices.push(device("tv", -0.2, 1, true));
        cfg.devices.push(device("tv", -0.3, 1, true));
        assert_eq!(
            build_engine(&cfg).err(),
            Some(SimError::DuplicateId("tv".to_string()))
        );
    }
}
