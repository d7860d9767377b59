//! TOML-based scenario configuration and preset definitions.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::command::Command;
use crate::devices::Device;
use crate::sim::clock::{MINUTES_PER_DAY, parse_hhmm};
use crate::sim::controller::{DEFAULT_MAX_GRID_KW, DEFAULT_PRODUCTION_ID};

/// Top-level scenario configuration parsed from TOML.
///
/// All sections have defaults. Load from TOML with
/// [`ScenarioConfig::from_toml_file`] or use one of the built-in presets
/// through [`ScenarioConfig::from_preset`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Grid budget parameters.
    #[serde(default)]
    pub grid: GridConfig,
    /// Household devices, registered in declaration order.
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
    /// Timers registered before the script runs.
    #[serde(default)]
    pub timers: Vec<TimerConfig>,
    /// Command lines executed in order.
    #[serde(default)]
    pub script: Vec<String>,
}

/// Grid budget parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Maximum draw from the grid (kW, must be > 0).
    pub max_power_kw: f64,
    /// Id of the production device raising the budget while on. An empty
    /// string disables production accounting.
    pub production_device: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            max_power_kw: DEFAULT_MAX_GRID_KW,
            production_device: DEFAULT_PRODUCTION_ID.to_string(),
        }
    }
}

impl GridConfig {
    /// Production device id, or `None` when disabled.
    pub fn production_id(&self) -> Option<&str> {
        Some(self.production_device.as_str()).filter(|id| !id.is_empty())
    }
}

/// One household device.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    /// Unique device id used in commands.
    pub id: String,
    /// Display name; defaults to the id.
    pub name: Option<String>,
    /// Rated power (kW; negative = consumption, positive = production).
    pub power_kw: f64,
    /// Higher priorities are kept on longer.
    pub priority: i32,
    /// Device variant: `"manual"` or `"auto"`.
    pub kind: String,
    /// Whether a manual device may be shed by the budget controller.
    pub can_shed: bool,
    /// Cycle length of an auto device (minutes).
    pub duration_minutes: Option<u32>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: None,
            power_kw: 0.0,
            priority: 0,
            kind: "manual".to_string(),
            can_shed: true,
            duration_minutes: None,
        }
    }
}

impl DeviceConfig {
    fn manual(id: &str, name: &str, power_kw: f64, priority: i32, can_shed: bool) -> Self {
        Self {
            id: id.to_string(),
            name: Some(name.to_string()),
            power_kw,
            priority,
            can_shed,
            ..Self::default()
        }
    }

    fn auto(id: &str, name: &str, power_kw: f64, priority: i32, duration_minutes: u32) -> Self {
        Self {
            id: id.to_string(),
            name: Some(name.to_string()),
            power_kw,
            priority,
            kind: "auto".to_string(),
            duration_minutes: Some(duration_minutes),
            ..Self::default()
        }
    }

    /// Builds the device. Call on validated configuration only; an auto
    /// device without a duration falls back to a one-minute cycle.
    pub fn to_device(&self) -> Device {
        let name = self.name.as_deref().unwrap_or(&self.id);
        if self.kind == "auto" {
            Device::auto(
                &self.id,
                name,
                self.power_kw,
                self.priority,
                self.duration_minutes.unwrap_or(1).max(1),
            )
        } else {
            Device::manual(&self.id, name, self.power_kw, self.priority, self.can_shed)
        }
    }
}

/// A timer registered at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimerConfig {
    /// Device id.
    pub device: String,
    /// Start time (`HH:MM`).
    pub start: String,
    /// Optional stop time (`HH:MM`), after `start`.
    #[serde(default)]
    pub stop: Option<String>,
}

impl TimerConfig {
    fn new(device: &str, start: &str, stop: Option<&str>) -> Self {
        Self {
            device: device.to_string(),
            start: start.to_string(),
            stop: stop.map(str::to_string),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"devices[2].duration_minutes"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Available preset names.
    pub const PRESETS: &[&str] = &["demo", "tight_budget", "solar_day"];

    /// A typical day: solar on a timer, appliance cycles, and an evening oven
    /// timer that sheds the heater.
    pub fn demo() -> Self {
        Self {
            grid: GridConfig::default(),
            devices: vec![
                DeviceConfig::manual("fridge", "Refrigerator", -0.4, 10, false),
                DeviceConfig::manual("solar", "Solar panels", 1.5, 9, false),
                DeviceConfig::manual("tv", "Television", -0.2, 2, true),
                DeviceConfig::manual("heater", "Electric heater", -2.0, 1, true),
                DeviceConfig::manual("oven", "Oven", -2.0, 5, true),
                DeviceConfig::auto("washer", "Washing machine", -2.0, 3, 110),
                DeviceConfig::auto("dishwasher", "Dishwasher", -1.5, 4, 120),
            ],
            timers: vec![
                TimerConfig::new("solar", "08:00", Some("17:00")),
                TimerConfig::new("washer", "09:30", None),
                TimerConfig::new("oven", "18:30", Some("19:30")),
            ],
            script: vec![
                "set fridge on".to_string(),
                "set time 07:00".to_string(),
                "set heater on".to_string(),
                "set time 10:00".to_string(),
                "set dishwasher 10:30".to_string(),
                "set time 13:00".to_string(),
                "set heater off".to_string(),
                "set tv 20:00 23:00".to_string(),
                "set time 18:00".to_string(),
                "set heater on".to_string(),
                "set time 21:00".to_string(),
                "show".to_string(),
            ],
        }
    }

    /// Same household on a 2.5 kW contract: heavy shedding.
    pub fn tight_budget() -> Self {
        let mut cfg = Self::demo();
        cfg.grid.max_power_kw = 2.5;
        cfg.script = vec![
            "set fridge on".to_string(),
            "set heater on".to_string(),
            "set tv on".to_string(),
            "set oven on".to_string(),
            "set time 12:00".to_string(),
            "show".to_string(),
        ];
        cfg
    }

    /// Daytime loads running on solar surplus.
    pub fn solar_day() -> Self {
        let mut cfg = Self::demo();
        cfg.devices.retain(|d| d.id != "solar");
        cfg.devices
            .push(DeviceConfig::manual("solar", "Solar panels", 4.0, 9, false));
        cfg.timers = vec![
            TimerConfig::new("solar", "07:00", Some("19:00")),
            TimerConfig::new("washer", "11:00", None),
            TimerConfig::new("dishwasher", "11:00", None),
            TimerConfig::new("oven", "12:00", Some("13:00")),
        ];
        cfg.script = vec![
            "set fridge on".to_string(),
            "set time 12:30".to_string(),
            "show".to_string(),
            "set time 20:00".to_string(),
            "show".to_string(),
        ];
        cfg
    }

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "demo" => Ok(Self::demo()),
            "tight_budget" => Ok(Self::tight_budget()),
            "solar_day" => Ok(Self::solar_day()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if !(self.grid.max_power_kw > 0.0 && self.grid.max_power_kw.is_finite()) {
            errors.push(ConfigError::new("grid.max_power_kw", "must be a finite value > 0"));
        }

        let mut ids = HashSet::new();
        for (i, d) in self.devices.iter().enumerate() {
            let field = |name: &str| format!("devices[{i}].{name}");
            if d.id.is_empty() || d.id.chars().any(char::is_whitespace) {
                errors.push(ConfigError::new(field("id"), "must be non-empty without whitespace"));
            } else if !ids.insert(d.id.as_str()) {
                errors.push(ConfigError::new(field("id"), format!("duplicate id \"{}\"", d.id)));
            }
            if !d.power_kw.is_finite() {
                errors.push(ConfigError::new(field("power_kw"), "must be finite"));
            }
            match (d.kind.as_str(), d.duration_minutes) {
                ("auto", Some(m)) if m > 0 && m < MINUTES_PER_DAY => {}
                ("auto", _) => {
                    errors.push(ConfigError::new(
                        field("duration_minutes"),
                        format!("auto devices need a duration between 1 and {}", MINUTES_PER_DAY - 1),
                    ));
                }
                ("manual", None) => {}
                ("manual", Some(_)) => {
                    errors.push(ConfigError::new(field("duration_minutes"), "only valid for auto devices"));
                }
                (other, _) => {
                    errors.push(ConfigError::new(
                        field("kind"),
                        format!("must be \"manual\" or \"auto\", got \"{other}\""),
                    ));
                }
            }
        }

        for (i, t) in self.timers.iter().enumerate() {
            let field = |name: &str| format!("timers[{i}].{name}");
            if !ids.contains(t.device.as_str()) {
                errors.push(ConfigError::new(field("device"), format!("unknown device \"{}\"", t.device)));
            }
            let start = parse_hhmm(&t.start);
            if let Err(e) = &start {
                errors.push(ConfigError::new(field("start"), e.to_string()));
            }
            if let Some(stop) = &t.stop {
                match (start, parse_hhmm(stop)) {
                    (_, Err(e)) => errors.push(ConfigError::new(field("stop"), e.to_string())),
                    (Ok(a), Ok(b)) if b <= a => {
                        errors.push(ConfigError::new(field("stop"), "must be after start"));
                    }
                    _ => {}
                }
            }
        }

        for (i, line) in self.script.iter().enumerate() {
            if let Err(e) = line.parse::<Command>() {
                errors.push(ConfigError::new(format!("script[{i}]"), e.to_string()));
            }
        }

        errors
    }
}
