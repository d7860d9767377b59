//! Device entity and its manual/auto variants.

use serde::Serialize;

use crate::sim::clock::Minute;

/// Variant-specific device behaviour.
///
/// Shutdown eligibility and cycle logic dispatch on this tag instead of
/// through a trait object, so the controller can inspect it directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceKind {
    /// Toggled explicitly by the user or by timers.
    Manual {
        /// Whether the budget controller may force this device off.
        can_shed: bool,
    },
    /// Runs a fixed-length cycle once started, then turns itself off.
    Auto {
        /// Cycle length in minutes.
        duration_minutes: Minute,
        /// Minute at which the current cycle started.
        cycle_start_minute: Minute,
        /// Whether a cycle is currently running.
        cycle_in_progress: bool,
    },
}

/// An electrical device tracked by the household controller.
///
/// Power follows the production convention: negative values consume from
/// the grid, positive values (e.g. solar) produce.
///
/// # Examples
///
/// ```
/// use hems_sim::devices::Device;
///
/// let mut washer = Device::auto("washer", "Washing machine", -2.0, 3, 90);
/// washer.activate(600);
/// assert!(!washer.cycle_due(689));
/// assert!(washer.cycle_due(690));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    id: String,
    name: String,
    power_kw: f64,
    priority: i32,
    is_on: bool,
    #[serde(flatten)]
    kind: DeviceKind,
    /// Minutes this device has spent switched on since the last reset.
    on_minutes: u32,
}

impl Device {
    /// Creates an inactive manual device.
    pub fn manual(
        id: impl Into<String>,
        name: impl Into<String>,
        power_kw: f64,
        priority: i32,
        can_shed: bool,
    ) -> Self {
        Self::with_kind(id, name, power_kw, priority, DeviceKind::Manual { can_shed })
    }

    /// Creates an inactive auto-cycle device.
    ///
    /// # Panics
    ///
    /// Panics if `duration_minutes` is zero.
    pub fn auto(
        id: impl Into<String>,
        name: impl Into<String>,
        power_kw: f64,
        priority: i32,
        duration_minutes: Minute,
    ) -> Self {
        assert!(duration_minutes > 0, "auto cycle duration must be > 0");
        Self::with_kind(
            id,
            name,
            power_kw,
            priority,
            DeviceKind::Auto {
                duration_minutes,
                cycle_start_minute: 0,
                cycle_in_progress: false,
            },
        )
    }

    fn with_kind(
        id: impl Into<String>,
        name: impl Into<String>,
        power_kw: f64,
        priority: i32,
        kind: DeviceKind,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            power_kw,
            priority,
            is_on: false,
            kind,
            on_minutes: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rated power in kW (negative = consumption).
    pub fn power_kw(&self) -> f64 {
        self.power_kw
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn kind(&self) -> &DeviceKind {
        &self.kind
    }

    /// Short variant label used in reports.
    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            DeviceKind::Manual { .. } => "manual",
            DeviceKind::Auto { .. } => "auto",
        }
    }

    /// Returns `true` for devices that feed power into the household.
    pub fn is_producer(&self) -> bool {
        self.power_kw > 0.0
    }

    /// Switches the device on. Auto devices stamp `minute` as cycle start.
    ///
    /// Calling this on a device that is already on changes nothing, so a
    /// running cycle is never restarted.
    pub fn activate(&mut self, minute: Minute) {
        if self.is_on {
            return;
        }
        self.is_on = true;
        if let DeviceKind::Auto {
            cycle_start_minute,
            cycle_in_progress,
            ..
        } = &mut self.kind
        {
            *cycle_start_minute = minute;
            *cycle_in_progress = true;
        }
    }

    /// Switches the device off and ends any running cycle.
    pub fn deactivate(&mut self) {
        self.is_on = false;
        if let DeviceKind::Auto {
            cycle_in_progress, ..
        } = &mut self.kind
        {
            *cycle_in_progress = false;
        }
    }

    /// Whether the budget controller may force this device off right now.
    pub fn can_shed_now(&self) -> bool {
        match self.kind {
            DeviceKind::Manual { can_shed } => can_shed,
            DeviceKind::Auto { .. } => true,
        }
    }

    /// Energy in kWh over `minutes` at the current state.
    ///
    /// Uses rated power, so an inactive device always reports zero.
    pub fn energy_kwh(&self, minutes: u32) -> f64 {
        if self.is_on {
            self.power_kw * f64::from(minutes) / 60.0
        } else {
            0.0
        }
    }

    /// Returns `true` when an auto cycle is running and has lasted its full
    /// duration at `minute`. Always `false` for manual devices.
    pub fn cycle_due(&self, minute: Minute) -> bool {
        match self.kind {
            DeviceKind::Auto {
                duration_minutes,
                cycle_start_minute,
                cycle_in_progress,
            } => cycle_in_progress && minute.saturating_sub(cycle_start_minute) >= duration_minutes,
            DeviceKind::Manual { .. } => false,
        }
    }

    /// Minute at which the running auto cycle ends, if any.
    pub fn cycle_end_minute(&self) -> Option<Minute> {
        match self.kind {
            DeviceKind::Auto {
                duration_minutes,
                cycle_start_minute,
                cycle_in_progress: true,
            } => Some(cycle_start_minute.saturating_add(duration_minutes)),
            _ => None,
        }
    }

    pub fn on_minutes(&self) -> u32 {
        self.on_minutes
    }

    /// Energy actually metered since the last reset (kWh).
    pub fn metered_energy_kwh(&self) -> f64 {
        self.power_kw * f64::from(self.on_minutes) / 60.0
    }

    /// Credits one minute to the meter if the device is on.
    pub(crate) fn meter_minute(&mut self) {
        if self.is_on {
            self.on_minutes += 1;
        }
    }

    pub(crate) fn reset_meter(&mut self) {
        self.on_minutes = 0;
    }
}
