//! API response and query types.
//!
//! Telemetry field names follow the tick CSV export columns.

use serde::{Deserialize, Serialize};

use crate::devices::Device;
use crate::sim::clock::{Minute, format_hhmm};
use crate::sim::engine::Engine;
use crate::sim::schedule::Timer;
use crate::sim::types::StepResult;

/// Snapshot of the household at the end of the run.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    /// Current minute of the day.
    pub minute: Minute,
    /// Current time as `HH:MM`.
    pub time: String,
    /// Configured maximum grid draw (kW).
    pub max_grid_kw: f64,
    /// Production device raising the budget, if any.
    pub production_device: Option<String>,
    /// Net active power (kW; negative = grid draw).
    pub total_kw: f64,
    /// Allowed grid draw magnitude (kW).
    pub allowed_kw: f64,
    /// Every registered device, ordered by id.
    pub devices: Vec<DeviceRecord>,
    /// Pending timers.
    pub timers: Vec<Timer>,
    /// Number of ticks resolved so far.
    pub tick_count: usize,
}

impl From<&Engine> for StateResponse {
    fn from(engine: &Engine) -> Self {
        let controller = engine.controller();
        Self {
            minute: engine.current_minute(),
            time: engine.current_time(),
            max_grid_kw: controller.max_grid_kw(),
            production_device: controller.production_id().map(str::to_string),
            total_kw: controller.total_active_kw(),
            allowed_kw: controller.allowed_kw(),
            devices: controller.devices().map(DeviceRecord::from).collect(),
            timers: controller.schedule().iter().cloned().collect(),
            tick_count: engine.history().len(),
        }
    }
}

/// A device with its metered energy and running cycle end.
#[derive(Debug, Serialize)]
pub struct DeviceRecord {
    #[serde(flatten)]
    pub device: Device,
    /// Energy metered since the last reset (kWh).
    pub energy_kwh: f64,
    /// End of the running auto cycle (`HH:MM`).
    pub cycle_ends: Option<String>,
}

impl From<&Device> for DeviceRecord {
    fn from(d: &Device) -> Self {
        Self {
            device: d.clone(),
            energy_kwh: d.metered_energy_kwh(),
            cycle_ends: d.cycle_end_minute().map(format_hhmm),
        }
    }
}

/// Single tick record.
#[derive(Debug, Serialize)]
pub struct TelemetryRecord {
    /// Minute of the day the tick resolved.
    pub minute: Minute,
    /// Same minute as `HH:MM`.
    pub time: String,
    /// Net active power after the tick (kW).
    pub total_kw: f64,
    /// Allowed grid draw after the tick (kW).
    pub allowed_kw: f64,
    /// Active devices after the tick.
    pub active_count: usize,
    /// Transitions as `label:device` strings, in order.
    pub transitions: Vec<String>,
}

impl From<&StepResult> for TelemetryRecord {
    fn from(r: &StepResult) -> Self {
        Self {
            minute: r.minute,
            time: format_hhmm(r.minute),
            total_kw: r.total_kw,
            allowed_kw: r.allowed_kw,
            active_count: r.active_count,
            transitions: r.transitions.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Optional range query parameters for the telemetry endpoint.
#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    /// First minute (inclusive).
    pub from: Option<Minute>,
    /// Last minute (inclusive).
    pub to: Option<Minute>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::Transition;

    #[test]
    fn telemetry_record_from_step_result_maps_fields() {
        let step = StepResult {
            minute: 605,
            transitions: vec![
                Transition::Started("oven".into()),
                Transition::Shed("heater".into()),
            ],
            total_kw: -2.4,
            allowed_kw: 3.5,
            active_count: 2,
        };
        let record = TelemetryRecord::from(&step);

        assert_eq!(record.minute, 605);
        assert_eq!(record.time, "10:05");
        assert_eq!(record.total_kw, -2.4);
        assert_eq!(record.allowed_kw, 3.5);
        assert_eq!(record.active_count, 2);
        assert_eq!(record.transitions, vec!["started:oven", "shed:heater"]);
    }

    #[test]
    fn device_record_flattens_device_fields() {
        let mut dw = Device::auto("dw", "Dishwasher", -1.5, 3, 90);
        dw.activate(600);
        let json = serde_json::to_value(DeviceRecord::from(&dw)).unwrap();

        assert_eq!(json["id"], "dw");
        assert_eq!(json["kind"], "auto");
        assert_eq!(json["is_on"], true);
        assert_eq!(json["duration_minutes"], 90);
        assert_eq!(json["cycle_ends"], "11:30");
        assert_eq!(json["energy_kwh"], 0.0);
    }
}
