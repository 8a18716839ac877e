//! Behavior trackers — pure state machines that turn raw page samples into
//! semantic behavior events.
//!
//! The host owns the real timers and input hooks; it feeds samples and
//! ticks into these trackers and forwards the events they emit to the
//! engine. Keeping the trackers free of IO makes their gating logic
//! directly testable.

mod countdown;
mod inactivity;
mod scroll;

pub use countdown::Countdown;
pub use inactivity::InactivityWatchdog;
pub use scroll::{SCROLL_MILESTONES, ScrollTracker};
