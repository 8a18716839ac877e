//! Scroll tracker — monotonic milestone-band gating of scroll depth.

use nudge_domain::event::BehaviorEvent;

/// Depth bands at which scroll events are emitted, in percent.
pub const SCROLL_MILESTONES: &[u32] = &[10, 25, 50, 75, 90, 100];

/// Tracks the deepest milestone band the visitor has reached.
///
/// The host samples scroll position (debounced) and calls
/// [`observe`](Self::observe); an event is emitted only when a *new
/// maximum* band is crossed, carrying the full `(previous, current]`
/// interval. Fluctuating back below a reached band never re-emits.
#[derive(Debug, Default)]
pub struct ScrollTracker {
    high_water: u32,
}

impl ScrollTracker {
    /// Start at depth zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a raw depth sample (percent of page height scrolled).
    ///
    /// Returns a scroll event when this sample crosses a new maximum
    /// milestone band.
    pub fn observe(&mut self, depth_percent: u32) -> Option<BehaviorEvent> {
        let band = SCROLL_MILESTONES
            .iter()
            .copied()
            .filter(|milestone| *milestone <= depth_percent)
            .max()
            .unwrap_or(0);

        if band <= self.high_water {
            return None;
        }
        let previous = self.high_water;
        self.high_water = band;
        Some(BehaviorEvent::scroll_depth(previous, band))
    }

    /// Deepest milestone band reached so far.
    #[must_use]
    pub fn high_water(&self) -> u32 {
        self.high_water
    }
}
