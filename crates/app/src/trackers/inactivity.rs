//! Inactivity watchdog — fires when the visitor idles past a threshold.

use nudge_domain::event::BehaviorEvent;

/// Watches idle time against the configured inactivity thresholds.
///
/// Any recorded interaction resets the idle counter, so each idle period
/// can fire each threshold at most once. The host ticks it once per second
/// alongside the page clock.
#[derive(Debug)]
pub struct InactivityWatchdog {
    thresholds: Vec<u64>,
    idle: u64,
}

impl InactivityWatchdog {
    /// Build a watchdog for the given inactivity thresholds.
    #[must_use]
    pub fn new(mut thresholds: Vec<u64>) -> Self {
        thresholds.sort_unstable();
        thresholds.dedup();
        Self { thresholds, idle: 0 }
    }

    /// True when no automation needs idle tracking.
    #[must_use]
    pub fn is_idle_tracking_needed(&self) -> bool {
        !self.thresholds.is_empty()
    }

    /// Reset the idle counter on any visitor interaction.
    pub fn record_activity(&mut self) {
        self.idle = 0;
    }

    /// Advance one idle second.
    ///
    /// Returns an inactivity event when a threshold lies inside the
    /// crossed `(previous, idle]` interval.
    pub fn tick(&mut self) -> Option<BehaviorEvent> {
        let previous = self.idle;
        self.idle += 1;
        let crossed = self
            .thresholds
            .iter()
            .any(|threshold| previous < *threshold && *threshold <= self.idle);
        crossed.then(|| BehaviorEvent::inactivity(previous, self.idle))
    }
}
