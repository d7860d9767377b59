//! Device registry and power-budget controller.

use std::collections::BTreeMap;

use crate::devices::{Device, DeviceKind};
use crate::error::{Result, SimError};

use super::active::ActiveIndex;
use super::clock::Minute;
use super::power_balance::{allowed_draw_kw, total_active_kw, within_budget};
use super::schedule::Schedule;
use super::types::{StepResult, Transition};

/// Grid limit used when none is configured (kW).
pub const DEFAULT_MAX_GRID_KW: f64 = 3.5;

/// Id of the production device whose output raises the allowed draw.
pub const DEFAULT_PRODUCTION_ID: &str = "solar";

/// Owns every device, the active index, and the timer table, and keeps the
/// household within its grid budget.
///
/// Budget enforcement runs after every activation: while net consumption
/// exceeds `max_grid_kw` (plus the production device's output when it is
/// on), the lowest-priority shed-eligible device is switched off.
///
/// # Examples
///
/// ```
/// use hems_sim::devices::Device;
/// use hems_sim::sim::controller::PowerController;
///
/// let mut pc = PowerController::new(3.5);
/// pc.register(Device::manual("kettle", "Kettle", -2.0, 1, true)).unwrap();
/// pc.register(Device::manual("fridge", "Fridge", -2.0, 5, false)).unwrap();
///
/// pc.activate("kettle", 0).unwrap();
/// let shed = pc.activate("fridge", 0).unwrap();
/// assert_eq!(shed, vec!["kettle".to_string()]);
/// assert!((pc.total_active_kw() - -2.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct PowerController {
    devices: BTreeMap<String, Device>,
    active: ActiveIndex,
    schedule: Schedule,
    max_grid_kw: f64,
    production_id: Option<String>,
}

impl PowerController {
    /// Creates a controller with the default production device id.
    ///
    /// # Panics
    ///
    /// Panics if `max_grid_kw` is not positive.
    pub fn new(max_grid_kw: f64) -> Self {
        Self::with_production(max_grid_kw, Some(DEFAULT_PRODUCTION_ID))
    }

    /// Creates a controller with an explicit (or no) production device id.
    ///
    /// # Panics
    ///
    /// Panics if `max_grid_kw` is not positive.
    pub fn with_production(max_grid_kw: f64, production_id: Option<&str>) -> Self {
        assert!(max_grid_kw > 0.0, "max_grid_kw must be > 0");
        Self {
            devices: BTreeMap::new(),
            active: ActiveIndex::default(),
            schedule: Schedule::new(),
            max_grid_kw,
            production_id: production_id.map(str::to_string),
        }
    }

    /// Adds a device, switched off.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::DuplicateId`] if the id is already registered.
    pub fn register(&mut self, mut device: Device) -> Result<()> {
        if self.devices.contains_key(device.id()) {
            return Err(SimError::DuplicateId(device.id().to_string()));
        }
        device.deactivate();
        self.devices.insert(device.id().to_string(), device);
        Ok(())
    }

    /// Removes a device, switching it off and dropping its timer first.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownDevice`] if the id is not registered.
    pub fn unregister(&mut self, id: &str) -> Result<Device> {
        if !self.devices.contains_key(id) {
            return Err(SimError::UnknownDevice(id.to_string()));
        }
        self.deactivate(id);
        self.schedule.cancel(id);
        self.devices
            .remove(id)
            .ok_or_else(|| SimError::UnknownDevice(id.to_string()))
    }

    /// Switches a device on at `minute` and enforces the budget.
    ///
    /// Returns the ids shed to restore the budget, in shedding order. The
    /// device just switched on may be among them. Already-active devices are
    /// left alone.
    ///
    /// # Errors
    ///
    /// - [`SimError::UnknownDevice`] if the id is not registered.
    /// - [`SimError::PowerBudgetUnsatisfiable`] if no shed-eligible device
    ///   is left while over budget. Nothing is changed in that case.
    pub fn activate(&mut self, id: &str, minute: Minute) -> Result<Vec<String>> {
        let device = self
            .devices
            .get(id)
            .ok_or_else(|| SimError::UnknownDevice(id.to_string()))?;
        if device.is_on() {
            return Ok(Vec::new());
        }

        let shed = self.plan_shedding(device)?;

        if let Some(device) = self.devices.get_mut(id) {
            device.activate(minute);
            self.active.insert(id, device.priority());
        }
        for victim in &shed {
            self.deactivate(victim);
        }
        Ok(shed)
    }

    /// Switches a device off. Returns `false` when there was nothing to do
    /// (unknown id or already off).
    pub fn deactivate(&mut self, id: &str) -> bool {
        match self.devices.get_mut(id) {
            Some(device) if device.is_on() => {
                let started_at = cycle_start(device);
                device.deactivate();
                self.active.remove(id);
                self.consume_cycle_timer(id, started_at);
                true
            }
            _ => false,
        }
    }

    /// Drops a stop-less timer once the auto cycle it started has ended,
    /// whether the cycle completed, was shed, or was switched off.
    fn consume_cycle_timer(&mut self, id: &str, started_at: Option<Minute>) {
        let spent = self
            .schedule
            .get(id)
            .is_some_and(|t| t.stop_minute.is_none() && Some(t.start_minute) == started_at);
        if spent {
            self.schedule.cancel(id);
        }
    }

    /// Works out which devices to shed if `incoming` were switched on,
    /// without touching any state.
    fn plan_shedding(&self, incoming: &Device) -> Result<Vec<String>> {
        let mut candidates: Vec<&Device> = self
            .active
            .iter()
            .filter_map(|id| self.devices.get(id))
            .collect();
        // New activations sort after every active device of equal priority.
        let pos = candidates.partition_point(|d| d.priority() <= incoming.priority());
        candidates.insert(pos, incoming);

        let mut on = vec![true; candidates.len()];
        let mut shed = Vec::new();

        loop {
            let live = || candidates.iter().zip(&on).filter(|(_, on)| **on).map(|(d, _)| *d);
            let total_kw = total_active_kw(live().map(Device::power_kw));
            let production_kw = live()
                .find(|d| self.is_production(d.id()))
                .map(Device::power_kw);
            let allowed_kw = allowed_draw_kw(self.max_grid_kw, production_kw);

            if within_budget(total_kw, allowed_kw) {
                return Ok(shed);
            }

            let victim = (0..candidates.len()).find(|&i| on[i] && candidates[i].can_shed_now());
            let Some(i) = victim else {
                return Err(SimError::PowerBudgetUnsatisfiable {
                    device_id: incoming.id().to_string(),
                    total_kw,
                    allowed_kw,
                });
            };
            on[i] = false;
            shed.push(candidates[i].id().to_string());
        }
    }

    fn is_production(&self, id: &str) -> bool {
        self.production_id.as_deref() == Some(id)
    }

    /// Registers a timer for a device, superseding any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownDevice`] if the id is not registered.
    pub fn schedule_timer(
        &mut self,
        id: &str,
        start_minute: Minute,
        stop_minute: Option<Minute>,
    ) -> Result<()> {
        if !self.devices.contains_key(id) {
            return Err(SimError::UnknownDevice(id.to_string()));
        }
        self.schedule.schedule(id, start_minute, stop_minute);
        Ok(())
    }

    /// Drops the timer for a device, if any.
    pub fn cancel_timer(&mut self, id: &str) {
        self.schedule.cancel(id);
    }

    /// Drops every timer.
    pub fn clear_timers(&mut self) {
        self.schedule.clear();
    }

    /// Resolves everything due at `minute`.
    ///
    /// Devices active entering the tick are metered for one minute first.
    /// Then, in order: timer starts, timer stops, auto cycle completions.
    ///
    /// # Errors
    ///
    /// Propagates [`SimError::PowerBudgetUnsatisfiable`] from a timer start;
    /// the rest of the tick is not resolved.
    pub fn resolve_tick(&mut self, minute: Minute) -> Result<StepResult> {
        for device in self.devices.values_mut() {
            device.meter_minute();
        }

        let due = self.schedule.due_at(minute);
        let mut transitions = Vec::new();

        for timer in due.iter().filter(|t| t.start_minute == minute) {
            let id = timer.device_id.as_str();
            if !self.devices.contains_key(id) || self.is_active(id) {
                continue;
            }
            let shed = self.activate(id, minute)?;
            transitions.push(Transition::Started(id.to_string()));
            transitions.extend(shed.into_iter().map(Transition::Shed));
        }

        for timer in due.iter().filter(|t| t.stop_minute == Some(minute)) {
            let id = timer.device_id.as_str();
            if self.deactivate(id) {
                transitions.push(Transition::Stopped(id.to_string()));
            }
            self.schedule.invalidate(id);
        }

        let completed: Vec<String> = self
            .active
            .iter()
            .filter_map(|id| self.devices.get(id))
            .filter(|d| d.cycle_due(minute))
            .map(|d| d.id().to_string())
            .collect();
        for id in completed {
            self.deactivate(&id);
            transitions.push(Transition::CycleCompleted(id));
        }

        self.schedule.purge();

        Ok(StepResult {
            minute,
            transitions,
            total_kw: self.total_active_kw(),
            allowed_kw: self.allowed_kw(),
            active_count: self.active.len(),
        })
    }

    /// Switches every device off, zeroes the meters, and drops all timers.
    pub fn reset(&mut self) {
        for device in self.devices.values_mut() {
            device.deactivate();
            device.reset_meter();
        }
        self.active.clear();
        self.schedule.clear();
    }

    /// Returns `false` for unknown ids.
    pub fn is_active(&self, id: &str) -> bool {
        self.active.contains(id)
    }

    /// Energy over `minutes` at the device's current state (kWh).
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownDevice`] if the id is not registered.
    pub fn energy_of(&self, id: &str, minutes: u32) -> Result<f64> {
        self.devices
            .get(id)
            .map(|d| d.energy_kwh(minutes))
            .ok_or_else(|| SimError::UnknownDevice(id.to_string()))
    }

    /// Energy over `minutes` for every device, ordered by id.
    pub fn energy_of_all(&self, minutes: u32) -> Vec<(String, f64)> {
        self.devices
            .values()
            .map(|d| (d.id().to_string(), d.energy_kwh(minutes)))
            .collect()
    }

    /// Net rated power of the active devices (kW).
    pub fn total_active_kw(&self) -> f64 {
        total_active_kw(
            self.active
                .iter()
                .filter_map(|id| self.devices.get(id))
                .map(Device::power_kw),
        )
    }

    /// Allowed grid draw given the current production state (kW).
    pub fn allowed_kw(&self) -> f64 {
        let production_kw = self
            .production_id
            .as_deref()
            .and_then(|id| self.devices.get(id))
            .filter(|d| d.is_on())
            .map(Device::power_kw);
        allowed_draw_kw(self.max_grid_kw, production_kw)
    }

    /// Active ids, lowest priority first.
    pub fn active_ids(&self) -> impl Iterator<Item = &str> {
        self.active.iter()
    }

    pub fn device(&self, id: &str) -> Option<&Device> {
        self.devices.get(id)
    }

    /// All devices ordered by id.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn max_grid_kw(&self) -> f64 {
        self.max_grid_kw
    }

    pub fn production_id(&self) -> Option<&str> {
        self.production_id.as_deref()
    }
}

fn cycle_start(device: &Device) -> Option<Minute> {
    match device.kind() {
        DeviceKind::Auto {
            cycle_start_minute,
            cycle_in_progress: true,
            ..
        } => Some(*cycle_start_minute),
        _ => None,
    }
}
