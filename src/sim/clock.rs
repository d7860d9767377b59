use crate::error::{Result, SimError};

/// Minutes since midnight of the simulated day.
pub type Minute = u32;

/// Number of minutes in a simulated day. Minute 1440 (24:00) is not
/// representable.
pub const MINUTES_PER_DAY: Minute = 24 * 60;

/// A simulation clock stepping through one day a minute at a time.
///
/// The `Clock` only moves forward. Every intermediate minute between the
/// current time and a target is handed to a callback, so no event between
/// the two is ever skipped.
///
/// # Examples
///
/// ```
/// use hems_sim::sim::clock::Clock;
///
/// let mut clock = Clock::new();
/// let mut minutes = Vec::new();
///
/// clock
///     .advance_to(3, |m| {
///         minutes.push(m);
///         Ok(())
///     })
///     .unwrap();
/// assert_eq!(minutes, vec![1, 2, 3]);
/// assert_eq!(clock.now(), 3);
/// ```
#[derive(Debug, Default, Clone)]
pub struct Clock {
    /// Current minute of the simulated day
    current: Minute,
}

impl Clock {
    /// Creates a clock at 00:00.
    pub fn new() -> Self {
        Self { current: 0 }
    }

    /// Returns the current minute.
    pub fn now(&self) -> Minute {
        self.current
    }

    /// Advances the clock to `target`, calling `on_tick` once per minute.
    ///
    /// The clock is set to each minute before `on_tick` runs for it. If the
    /// callback fails, the clock stays on that minute and the error is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidTarget`] if `target` is not after the
    /// current minute or falls outside the day.
    pub fn advance_to(
        &mut self,
        target: Minute,
        mut on_tick: impl FnMut(Minute) -> Result<()>,
    ) -> Result<()> {
        if target <= self.current || target >= MINUTES_PER_DAY {
            return Err(SimError::InvalidTarget {
                current: self.current,
                target,
            });
        }

        while self.current < target {
            self.current += 1;
            on_tick(self.current)?;
        }
        Ok(())
    }

    /// Resets the clock to 00:00 without touching any other state.
    pub fn reset(&mut self) {
        self.current = 0;
    }
}

/// Converts an `HH:MM` (24h) string to a minute of the day.
///
/// Accepts one or two hour digits and exactly two minute digits, between
/// `00:00` and `23:59`.
///
/// # Errors
///
/// Returns [`SimError::InvalidTimeFormat`] for malformed or out-of-range
/// input.
pub fn parse_hhmm(s: &str) -> Result<Minute> {
    let invalid = || SimError::InvalidTimeFormat(s.to_string());

    let (h, m) = s.split_once(':').ok_or_else(invalid)?;
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !digits(h) || !digits(m) || h.len() > 2 || m.len() != 2 {
        return Err(invalid());
    }

    let hours: Minute = h.parse().map_err(|_| invalid())?;
    let minutes: Minute = m.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    Ok(hours * 60 + minutes)
}

/// Formats a minute of the day as zero-padded `HH:MM`.
pub fn format_hhmm(minute: Minute) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}
