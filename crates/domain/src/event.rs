//! Behavior events — the visitor signals that drive trigger dispatch.
//!
//! Events are produced by the host page (navigation, form submits, exit
//! intent), by the analytics core (custom events, funnel and goal signals),
//! and by the engine's own trackers (scroll depth, time on page,
//! inactivity). Threshold-style events carry the `(previous, current]`
//! interval they crossed so triggers can match each crossing exactly once.

use serde::{Deserialize, Serialize};

use crate::time::{self, Timestamp};

/// The behavioral event classes an automation trigger can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PageView,
    CustomEvent,
    ScrollDepth,
    TimeOnPage,
    Inactivity,
    FormSubmit,
    ExitIntent,
    FunnelDropoff,
    FunnelComplete,
    GoalCompleted,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::PageView => "page_view",
            Self::CustomEvent => "custom_event",
            Self::ScrollDepth => "scroll_depth",
            Self::TimeOnPage => "time_on_page",
            Self::Inactivity => "inactivity",
            Self::FormSubmit => "form_submit",
            Self::ExitIntent => "exit_intent",
            Self::FunnelDropoff => "funnel_dropoff",
            Self::FunnelComplete => "funnel_complete",
            Self::GoalCompleted => "goal_completed",
        };
        f.write_str(name)
    }
}

/// One visitor-behavior occurrence, with its free-form payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorEvent {
    pub kind: EventKind,
    /// Event-specific payload; merged over the session facts during
    /// variable interpolation.
    #[serde(default)]
    pub payload: serde_json::Value,
    pub occurred_at: Timestamp,
}

impl BehaviorEvent {
    /// Create an event with the given payload, stamped now.
    #[must_use]
    pub fn new(kind: EventKind, payload: serde_json::Value) -> Self {
        Self {
            kind,
            payload,
            occurred_at: time::now(),
        }
    }

    /// A plain page-view event.
    #[must_use]
    pub fn page_view() -> Self {
        Self::new(EventKind::PageView, serde_json::json!({}))
    }

    /// A named custom analytics event.
    #[must_use]
    pub fn custom(name: &str, properties: serde_json::Value) -> Self {
        Self::new(
            EventKind::CustomEvent,
            serde_json::json!({ "name": name, "properties": properties }),
        )
    }

    /// A scroll-depth band crossing over `(previous, depth]` percent.
    #[must_use]
    pub fn scroll_depth(previous: u32, depth: u32) -> Self {
        Self::new(
            EventKind::ScrollDepth,
            serde_json::json!({ "previous": previous, "depth": depth }),
        )
    }

    /// A time-on-page crossing over `(previous, elapsed]` seconds.
    #[must_use]
    pub fn time_on_page(previous: u64, elapsed: u64) -> Self {
        Self::new(
            EventKind::TimeOnPage,
            serde_json::json!({ "previous": previous, "elapsed": elapsed }),
        )
    }

    /// An inactivity crossing over `(previous, idle]` idle seconds.
    #[must_use]
    pub fn inactivity(previous: u64, idle: u64) -> Self {
        Self::new(
            EventKind::Inactivity,
            serde_json::json!({ "previous": previous, "idle": idle }),
        )
    }

    /// Read a string field from the payload.
    #[must_use]
    pub fn payload_str(&self, field: &str) -> Option<&str> {
        self.payload.get(field).and_then(serde_json::Value::as_str)
    }

    /// Read a numeric field from the payload.
    #[must_use]
    pub fn payload_f64(&self, field: &str) -> Option<f64> {
        self.payload.get(field).and_then(serde_json::Value::as_f64)
    }
}
