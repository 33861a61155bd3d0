use super::circuit::CircuitState;
use super::handles::ComponentId;
use indexmap::IndexMap;
use log::debug;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Timer {
    period: Duration,
    elapsed: Duration,
}

/// Interval timers of the clocks of a circuit, driven by [CircuitState::advance_clocks].
#[derive(Debug, Clone, Default)]
pub(super) struct ClockTimers {
    timers: IndexMap<ComponentId, Timer>,
}

impl ClockTimers {
    /// (Re)starts the timer of `clock`.
    pub(super) fn arm(&mut self, clock: ComponentId, period: Duration) {
        self.timers.insert(
            clock,
            Timer {
                period,
                elapsed: Duration::ZERO,
            },
        );
    }

    pub(super) fn cancel(&mut self, clock: ComponentId) {
        if self.timers.shift_remove(&clock).is_some() {
            debug!("cancelled the timer of {}", clock);
        }
    }

    pub(super) fn clear(&mut self) {
        self.timers.clear();
    }

    pub(super) fn is_armed(&self, clock: ComponentId) -> bool {
        self.timers.contains_key(&clock)
    }

    /// Adds `elapsed` to every timer and returns the clocks whose period ran out.
    ///
    /// A timer fires at most once per call, missed periods are dropped.
    fn advance(&mut self, elapsed: Duration) -> Vec<ComponentId> {
        let mut fired = Vec::new();
        for (clock, timer) in self.timers.iter_mut() {
            timer.elapsed += elapsed;
            if timer.elapsed >= timer.period {
                let remainder = timer.elapsed.as_nanos() % timer.period.as_nanos();
                timer.elapsed = Duration::from_nanos(remainder as u64);
                fired.push(*clock);
            }
        }
        fired
    }
}

impl CircuitState {
    /// Lets `elapsed` time pass for every clock.
    ///
    /// Every clock whose period ran out toggles its value, then one
    /// [propagation](CircuitState::propagate) pass runs if any clock fired.
    /// Returns the clocks that fired.
    ///
    /// # Example
    /// ```
    /// # use circuitsim::{CircuitState, Slot};
    /// # use std::time::Duration;
    /// let mut c = CircuitState::new();
    /// let k = c.clock();
    /// let o = c.output();
    /// c.connect(k, o, Slot::A).unwrap();
    /// c.set_period(k, Duration::from_millis(100)).unwrap();
    ///
    /// assert!(c.advance_clocks(Duration::from_millis(60)).is_empty());
    /// assert_eq!(c.advance_clocks(Duration::from_millis(60)), vec![k]);
    /// assert_eq!(c.component(o).unwrap().value().unwrap().to_string(), "1110");
    /// ```
    pub fn advance_clocks(&mut self, elapsed: Duration) -> Vec<ComponentId> {
        let fired = self.timers.advance(elapsed);
        for clock in &fired {
            if let Some(value) = self.components.get_mut(clock).and_then(|c| c.value_mut()) {
                value.toggle();
            }
        }
        if !fired.is_empty() {
            self.propagate();
        }
        fired
    }

    /// Fires the timer of `clock` right away: toggles its value and runs one propagation pass.
    ///
    /// Returns false and does nothing if `clock` isn't a clock of this circuit anymore.
    pub fn fire_clock(&mut self, clock: ComponentId) -> bool {
        if !self.timers.is_armed(clock) {
            return false;
        }
        match self.components.get_mut(&clock).and_then(|c| c.value_mut()) {
            Some(value) => value.toggle(),
            None => return false,
        }
        self.propagate();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Slot;

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn test_missed_periods_coalesce() {
        let mut timers = ClockTimers::default();
        let k = ComponentId(0);
        timers.arm(k, ms(10));
        assert_eq!(timers.advance(ms(35)), vec![k]);
        assert_eq!(timers.advance(ms(4)), vec![]);
        assert_eq!(timers.advance(ms(1)), vec![k]);
    }

    #[test]
    fn test_clock_drives_output() {
        let mut c = CircuitState::new();
        let k = c.clock();
        c.set_period(k, ms(10)).unwrap();
        let not = c.not1(k).unwrap();
        let o = c.output();
        c.connect(not, o, Slot::A).unwrap();
        c.propagate();
        assert_eq!(c.component(o).unwrap().value().unwrap().to_string(), "1110");

        assert_eq!(c.advance_clocks(ms(10)), vec![k]);
        assert_eq!(c.component(k).unwrap().value().unwrap().to_string(), "1110");
        assert_eq!(c.component(o).unwrap().value().unwrap().to_string(), "0001");

        assert_eq!(c.advance_clocks(ms(10)), vec![k]);
        assert_eq!(c.component(o).unwrap().value().unwrap().to_string(), "1110");
    }

    #[test]
    fn test_clocks_with_different_periods() {
        let mut c = CircuitState::new();
        let fast = c.clock();
        let slow = c.clock();
        c.set_period(fast, ms(10)).unwrap();
        c.set_period(slow, ms(25)).unwrap();

        assert_eq!(c.advance_clocks(ms(10)), vec![fast]);
        assert_eq!(c.advance_clocks(ms(10)), vec![fast]);
        assert_eq!(c.advance_clocks(ms(10)), vec![fast, slow]);
    }

    #[test]
    fn test_deleted_clock_is_cancelled() {
        let mut c = CircuitState::new();
        let k = c.clock();
        let o = c.output();
        c.connect(k, o, Slot::A).unwrap();
        c.delete(k).unwrap();

        assert!(c.advance_clocks(ms(5000)).is_empty());
        assert_eq!(c.fire_clock(k), false);
        assert_eq!(c.component(o).unwrap().value().unwrap().to_string(), "0000");
    }

    #[test]
    fn test_fire_clock() {
        let mut c = CircuitState::new();
        let k = c.clock();
        let i = c.input();
        let o = c.output();
        c.connect(k, o, Slot::A).unwrap();

        assert_eq!(c.fire_clock(k), true);
        assert_eq!(c.component(o).unwrap().value().unwrap().to_string(), "1110");
        assert_eq!(c.fire_clock(i), false);
        assert_eq!(c.component(i).unwrap().value().unwrap().to_string(), "0001");
    }

    #[test]
    fn test_set_period_restarts_timer() {
        let mut c = CircuitState::new();
        let k = c.clock();
        c.set_period(k, ms(10)).unwrap();
        c.advance_clocks(ms(9));
        c.set_period(k, ms(10)).unwrap();
        assert!(c.advance_clocks(ms(9)).is_empty());
        assert_eq!(c.advance_clocks(ms(1)), vec![k]);
    }
}
