use serde::Serialize;

use super::clock::Minute;

/// A scheduled on/off instruction for one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timer {
    /// Device the timer drives.
    pub device_id: String,
    /// Minute at which the device is switched on.
    pub start_minute: Minute,
    /// Minute at which the device is switched off. `None` for auto-cycle
    /// devices, which stop on their own.
    pub stop_minute: Option<Minute>,
    /// Cleared once the timer has been consumed within a tick.
    pub valid: bool,
}

impl Timer {
    pub fn new(device_id: impl Into<String>, start_minute: Minute, stop_minute: Option<Minute>) -> Self {
        Self {
            device_id: device_id.into(),
            start_minute,
            stop_minute,
            valid: true,
        }
    }

    /// Returns `true` when the timer has an event at `minute`.
    pub fn is_due(&self, minute: Minute) -> bool {
        self.valid && (self.start_minute == minute || self.stop_minute == Some(minute))
    }
}

/// Timer table keeping at most one timer per device, in registration order.
///
/// Does not know about the device registry; the controller checks device
/// ids before scheduling.
#[derive(Debug, Default, Clone)]
pub struct Schedule {
    timers: Vec<Timer>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a timer, superseding any existing timer for the device.
    pub fn schedule(&mut self, device_id: &str, start_minute: Minute, stop_minute: Option<Minute>) {
        self.cancel(device_id);
        self.timers
            .push(Timer::new(device_id, start_minute, stop_minute));
    }

    /// Removes the timer for `device_id`. Absent timers are ignored.
    pub fn cancel(&mut self, device_id: &str) {
        self.timers.retain(|t| t.device_id != device_id);
    }

    /// Valid timers with a start or stop event at `minute`, in registration
    /// order.
    pub fn due_at(&self, minute: Minute) -> Vec<Timer> {
        self.timers
            .iter()
            .filter(|t| t.is_due(minute))
            .cloned()
            .collect()
    }

    /// Returns the timer registered for `device_id`, if any.
    pub fn get(&self, device_id: &str) -> Option<&Timer> {
        self.timers.iter().find(|t| t.device_id == device_id)
    }

    /// Marks the timer for `device_id` as consumed. It stays in the table
    /// until the next [`Schedule::purge`].
    pub fn invalidate(&mut self, device_id: &str) {
        if let Some(t) = self.timers.iter_mut().find(|t| t.device_id == device_id) {
            t.valid = false;
        }
    }

    /// Drops every consumed timer.
    pub fn purge(&mut self) {
        self.timers.retain(|t| t.valid);
    }

    /// Removes all timers.
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Timer> {
        self.timers.iter()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Schedule, Timer};

    #[test]
    fn scheduling_supersedes_previous_timer() {
        let mut s = Schedule::new();
        s.schedule("oven", 10, Some(20));
        s.schedule("oven", 30, Some(40));
        assert_eq!(s.len(), 1);
        assert_eq!(s.get("oven"), Some(&Timer::new("oven", 30, Some(40))));
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut s = Schedule::new();
        s.schedule("oven", 10, None);
        s.cancel("oven");
        s.cancel("oven");
        s.cancel("never-scheduled");
        assert!(s.is_empty());
    }

    #[test]
    fn due_at_matches_start_or_stop_in_registration_order() {
        let mut s = Schedule::new();
        s.schedule("b", 5, Some(10));
        s.schedule("a", 10, None);
        s.schedule("c", 1, Some(2));

        let due: Vec<String> = s.due_at(10).into_iter().map(|t| t.device_id).collect();
        assert_eq!(due, vec!["b".to_string(), "a".to_string()]);
        assert!(s.due_at(7).is_empty());
    }

    #[test]
    fn invalidated_timers_are_not_due_and_get_purged() {
        let mut s = Schedule::new();
        s.schedule("tv", 5, Some(10));
        s.invalidate("tv");
        assert!(s.due_at(5).is_empty());
        assert_eq!(s.len(), 1);
        s.purge();
        assert!(s.is_empty());
    }

    #[test]
    fn clear_drops_everything() {
        let mut s = Schedule::new();
        s.schedule("a", 1, None);
        s.schedule("b", 2, None);
        s.clear();
        assert_eq!(s.iter().count(), 0);
    }
}
