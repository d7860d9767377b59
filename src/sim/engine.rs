//! Household engine tying the clock to the power controller.

use crate::devices::Device;
use crate::error::Result;

use super::clock::{Clock, Minute, format_hhmm};
use super::controller::PowerController;
use super::types::StepResult;

/// Simulation engine owning the clock and the power controller.
///
/// This is the whole operation surface offered to command handling and
/// reporting; nothing outside it mutates devices or timers. Every tick the
/// clock resolves is recorded in an append-only history.
#[derive(Debug, Clone)]
pub struct Engine {
    clock: Clock,
    controller: PowerController,
    history: Vec<StepResult>,
}

impl Engine {
    /// Creates an engine at 00:00 around the given controller.
    pub fn new(controller: PowerController) -> Self {
        Self {
            clock: Clock::new(),
            controller,
            history: Vec::new(),
        }
    }

    pub fn register_device(&mut self, device: Device) -> Result<()> {
        self.controller.register(device)
    }

    pub fn unregister_device(&mut self, id: &str) -> Result<()> {
        self.controller.unregister(id).map(|_| ())
    }

    /// Switches a device on at the current minute.
    ///
    /// Returns the ids shed by budget enforcement.
    pub fn activate_device(&mut self, id: &str) -> Result<Vec<String>> {
        self.controller.activate(id, self.clock.now())
    }

    pub fn deactivate_device(&mut self, id: &str) {
        self.controller.deactivate(id);
    }

    pub fn is_device_active(&self, id: &str) -> bool {
        self.controller.is_active(id)
    }

    pub fn schedule_timer(&mut self, id: &str, start: Minute, stop: Option<Minute>) -> Result<()> {
        self.controller.schedule_timer(id, start, stop)
    }

    pub fn cancel_timer(&mut self, id: &str) {
        self.controller.cancel_timer(id);
    }

    /// Steps the clock minute by minute up to `target`.
    ///
    /// # Returns
    ///
    /// The results of the ticks resolved by this call.
    ///
    /// # Errors
    ///
    /// - [`crate::SimError::InvalidTarget`] if `target` is not ahead of the
    ///   clock or lies outside the day.
    /// - [`crate::SimError::PowerBudgetUnsatisfiable`] from a tick; the clock
    ///   stays on that minute and earlier ticks remain in the history.
    pub fn advance_time_to(&mut self, target: Minute) -> Result<&[StepResult]> {
        let first = self.history.len();
        let controller = &mut self.controller;
        let history = &mut self.history;
        self.clock.advance_to(target, |minute| {
            history.push(controller.resolve_tick(minute)?);
            Ok(())
        })?;
        Ok(&self.history[first..])
    }

    /// Moves the clock back to 00:00. Devices and timers are untouched.
    pub fn reset_clock(&mut self) {
        self.clock.reset();
    }

    pub fn current_minute(&self) -> Minute {
        self.clock.now()
    }

    /// Current time as `HH:MM`.
    pub fn current_time(&self) -> String {
        format_hhmm(self.clock.now())
    }

    pub fn device_energy(&self, id: &str, minutes: u32) -> Result<f64> {
        self.controller.energy_of(id, minutes)
    }

    pub fn all_devices_energy(&self, minutes: u32) -> Vec<(String, f64)> {
        self.controller.energy_of_all(minutes)
    }

    /// Drops every timer.
    pub fn reset_timers(&mut self) {
        self.controller.clear_timers();
    }

    /// Clock to 00:00, every device off, meters zeroed, timers dropped.
    pub fn reset_all(&mut self) {
        self.clock.reset();
        self.controller.reset();
    }

    /// Read-only access to the controller for reporting.
    pub fn controller(&self) -> &PowerController {
        &self.controller
    }

    /// Every tick resolved so far, across clock resets.
    pub fn history(&self) -> &[StepResult] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use crate::sim::types::Transition;

    fn engine() -> Engine {
        let mut e = Engine::new(PowerController::new(3.5));
        e.register_device(Device::manual("tv", "TV", -0.2, 1, true))
            .unwrap();
        e.register_device(Device::auto("dw", "Dishwasher", -1.5, 3, 30))
            .unwrap();
        e
    }

    #[test]
    fn activation_uses_clock_minute() {
        let mut e = engine();
        e.advance_time_to(5).unwrap();
        e.activate_device("dw").unwrap();
        e.advance_time_to(34).unwrap();
        assert!(e.is_device_active("dw"));
        let ticks = e.advance_time_to(35).unwrap();
        assert_eq!(
            ticks[0].transitions,
            vec![Transition::CycleCompleted("dw".into())]
        );
        assert!(!e.is_device_active("dw"));
    }

    #[test]
    fn advance_returns_one_result_per_minute() {
        let mut e = engine();
        assert_eq!(e.advance_time_to(10).unwrap().len(), 10);
        assert_eq!(e.advance_time_to(15).unwrap().len(), 5);
        assert_eq!(e.history().len(), 15);
        assert_eq!(e.current_time(), "00:15");
    }

    #[test]
    fn backward_target_fails_without_ticks() {
        let mut e = engine();
        e.advance_time_to(10).unwrap();
        assert!(matches!(
            e.advance_time_to(10),
            Err(SimError::InvalidTarget { .. })
        ));
        assert_eq!(e.current_minute(), 10);
        assert_eq!(e.history().len(), 10);
    }

    #[test]
    fn timers_fire_again_after_clock_reset() {
        let mut e = engine();
        e.schedule_timer("tv", 3, None).unwrap();
        e.advance_time_to(4).unwrap();
        e.deactivate_device("tv");
        e.reset_clock();
        assert!(!e.is_device_active("tv"));
        e.advance_time_to(3).unwrap();
        assert!(e.is_device_active("tv"));
    }

    #[test]
    fn reset_all_clears_state() {
        let mut e = engine();
        e.activate_device("tv").unwrap();
        e.schedule_timer("dw", 50, None).unwrap();
        e.advance_time_to(20).unwrap();
        e.reset_all();
        assert_eq!(e.current_minute(), 0);
        assert!(!e.is_device_active("tv"));
        assert!(e.controller().schedule().is_empty());
    }

    #[test]
    fn unregister_then_energy_is_unknown() {
        let mut e = engine();
        e.unregister_device("tv").unwrap();
        assert_eq!(
            e.device_energy("tv", 60),
            Err(SimError::UnknownDevice("tv".into()))
        );
        assert_eq!(e.all_devices_energy(60).len(), 1);
    }
}
