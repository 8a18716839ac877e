//! Time-on-page countdown — one shared clock for all time triggers.

use nudge_domain::event::BehaviorEvent;

/// How long the clock keeps ticking past the longest threshold.
pub const GRACE_SECONDS: u64 = 5;

/// The shared time-on-page clock.
///
/// Created only when at least one time-on-page automation exists, and
/// self-terminates once the longest configured threshold plus a grace
/// window has elapsed. The host ticks it once per second.
#[derive(Debug)]
pub struct Countdown {
    elapsed: u64,
    stop_after: u64,
}

impl Countdown {
    /// Build the clock for the given time-on-page thresholds.
    ///
    /// Returns `None` when there are no thresholds — no automation needs
    /// the clock, so it is never started.
    #[must_use]
    pub fn for_thresholds(thresholds: impl IntoIterator<Item = u64>) -> Option<Self> {
        let longest = thresholds.into_iter().max()?;
        Some(Self {
            elapsed: 0,
            stop_after: longest + GRACE_SECONDS,
        })
    }

    /// Advance one second.
    ///
    /// Returns the elapsed-time crossing event, or `None` once the clock
    /// has stopped.
    pub fn tick(&mut self) -> Option<BehaviorEvent> {
        if self.finished() {
            return None;
        }
        let previous = self.elapsed;
        self.elapsed += 1;
        Some(BehaviorEvent::time_on_page(previous, self.elapsed))
    }

    /// True once the longest threshold plus grace has elapsed.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.elapsed >= self.stop_after
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nudge_domain::automation::Trigger;

    #[test]
    fn should_not_start_without_thresholds() {
        assert!(Countdown::for_thresholds(Vec::new()).is_none());
    }

    #[test]
    fn should_emit_crossing_events_every_second() {
        let mut clock = Countdown::for_thresholds([3]).unwrap();
        let first = clock.tick().unwrap();
        assert_eq!(first.payload_f64("previous"), Some(0.0));
        assert_eq!(first.payload_f64("elapsed"), Some(1.0));
        let second = clock.tick().unwrap();
        assert_eq!(second.payload_f64("elapsed"), Some(2.0));
    }

    #[test]
    fn should_fire_a_time_trigger_exactly_once() {
        let trigger = Trigger::TimeOnPage { seconds: 3 };
        let mut clock = Countdown::for_thresholds([3]).unwrap();

        let mut fires = 0;
        while let Some(event) = clock.tick() {
            if trigger.matches_event(&event) {
                fires += 1;
            }
        }
        assert_eq!(fires, 1);
    }

    #[test]
    fn should_stop_after_longest_threshold_plus_grace() {
        let mut clock = Countdown::for_thresholds([2, 10]).unwrap();
        let mut ticks = 0;
        while clock.tick().is_some() {
            ticks += 1;
        }
        assert_eq!(ticks, 10 + GRACE_SECONDS);
        assert!(clock.finished());
        assert!(clock.tick().is_none());
    }
}
