//! Trigger — the behavior-event pattern that activates an automation.

use serde::{Deserialize, Serialize};

use crate::event::{BehaviorEvent, EventKind};

/// Describes what visitor behavior should activate an automation.
///
/// Threshold variants (scroll, time, inactivity) carry a numeric bound
/// that is compared against the `(previous, current]` interval crossed by
/// the event, so each threshold fires exactly once per page as the tracked
/// value grows monotonically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// Fires on every page view matching the URL filter.
    PageView,
    /// Fires on a named custom analytics event.
    CustomEvent { name: String },
    /// Fires when scroll depth first reaches `percentage` percent.
    ScrollDepth { percentage: u32 },
    /// Fires when the visitor has been on the page for `seconds` seconds.
    TimeOnPage { seconds: u64 },
    /// Fires when the visitor has been idle for `seconds` seconds.
    Inactivity { seconds: u64 },
    /// Fires when any form on the page is submitted.
    FormSubmit,
    /// Fires when the pointer leaves the viewport towards the chrome.
    ExitIntent,
    /// Fires when the analytics core reports a funnel drop-off.
    FunnelDropoff {
        #[serde(default)]
        funnel_id: Option<String>,
    },
    /// Fires when the analytics core reports a completed funnel.
    FunnelComplete {
        #[serde(default)]
        funnel_id: Option<String>,
    },
    /// Fires when the analytics core reports a completed goal.
    GoalCompleted {
        #[serde(default)]
        goal_id: Option<String>,
    },
}

impl Trigger {
    /// Check whether this trigger matches a given behavior event.
    #[must_use]
    pub fn matches_event(&self, event: &BehaviorEvent) -> bool {
        match self {
            Self::PageView => event.kind == EventKind::PageView,
            Self::CustomEvent { name } => {
                event.kind == EventKind::CustomEvent && event.payload_str("name") == Some(name)
            }
            Self::ScrollDepth { percentage } => {
                event.kind == EventKind::ScrollDepth
                    && crossed(event, "previous", "depth", f64::from(*percentage))
            }
            Self::TimeOnPage { seconds } => {
                event.kind == EventKind::TimeOnPage
                    && crossed(event, "previous", "elapsed", precise(*seconds))
            }
            Self::Inactivity { seconds } => {
                event.kind == EventKind::Inactivity
                    && crossed(event, "previous", "idle", precise(*seconds))
            }
            Self::FormSubmit => event.kind == EventKind::FormSubmit,
            Self::ExitIntent => event.kind == EventKind::ExitIntent,
            Self::FunnelDropoff { funnel_id } => {
                event.kind == EventKind::FunnelDropoff
                    && optional_id_matches(event, "funnel_id", funnel_id.as_deref())
            }
            Self::FunnelComplete { funnel_id } => {
                event.kind == EventKind::FunnelComplete
                    && optional_id_matches(event, "funnel_id", funnel_id.as_deref())
            }
            Self::GoalCompleted { goal_id } => {
                event.kind == EventKind::GoalCompleted
                    && optional_id_matches(event, "goal_id", goal_id.as_deref())
            }
        }
    }
}

/// True when `threshold` lies inside the `(previous, current]` interval the
/// event reports. Events without the interval fields never match.
fn crossed(event: &BehaviorEvent, previous_field: &str, current_field: &str, threshold: f64) -> bool {
    let Some(previous) = event.payload_f64(previous_field) else {
        return false;
    };
    let Some(current) = event.payload_f64(current_field) else {
        return false;
    };
    previous < threshold && threshold <= current
}

/// A trigger without a configured id matches every event of its kind.
fn optional_id_matches(event: &BehaviorEvent, field: &str, expected: Option<&str>) -> bool {
    match expected {
        Some(id) => event.payload_str(field) == Some(id),
        None => true,
    }
}

#[allow(clippy::cast_precision_loss)]
fn precise(seconds: u64) -> f64 {
    seconds as f64
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PageView => f.write_str("page_view"),
            Self::CustomEvent { name } => write!(f, "custom_event({name})"),
            Self::ScrollDepth { percentage } => write!(f, "scroll_depth({percentage}%)"),
            Self::TimeOnPage { seconds } => write!(f, "time_on_page({seconds}s)"),
            Self::Inactivity { seconds } => write!(f, "inactivity({seconds}s)"),
            Self::FormSubmit => f.write_str("form_submit"),
            Self::ExitIntent => f.write_str("exit_intent"),
            Self::FunnelDropoff { .. } => f.write_str("funnel_dropoff"),
            Self::FunnelComplete { .. } => f.write_str("funnel_complete"),
            Self::GoalCompleted { .. } => f.write_str("goal_completed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_match_page_view_trigger_on_page_view_event() {
        let trigger = Trigger::PageView;
        assert!(trigger.matches_event(&BehaviorEvent::page_view()));
        assert!(!trigger.matches_event(&BehaviorEvent::scroll_depth(0, 25)));
    }

    #[test]
    fn should_match_custom_event_by_name() {
        let trigger = Trigger::CustomEvent {
            name: "signup_clicked".to_string(),
        };
        let matching = BehaviorEvent::custom("signup_clicked", serde_json::json!({}));
        let other = BehaviorEvent::custom("checkout", serde_json::json!({}));
        assert!(trigger.matches_event(&matching));
        assert!(!trigger.matches_event(&other));
    }

    #[test]
    fn should_not_fire_scroll_trigger_below_threshold() {
        let trigger = Trigger::ScrollDepth { percentage: 50 };
        assert!(!trigger.matches_event(&BehaviorEvent::scroll_depth(0, 30)));
    }

    #[test]
    fn should_fire_scroll_trigger_when_interval_covers_threshold() {
        let trigger = Trigger::ScrollDepth { percentage: 50 };
        assert!(trigger.matches_event(&BehaviorEvent::scroll_depth(30, 50)));
        assert!(trigger.matches_event(&BehaviorEvent::scroll_depth(25, 75)));
    }

    #[test]
    fn should_not_refire_scroll_trigger_on_later_intervals() {
        let trigger = Trigger::ScrollDepth { percentage: 50 };
        // The 50 mark was already crossed; (50, 75] does not contain it.
        assert!(!trigger.matches_event(&BehaviorEvent::scroll_depth(50, 75)));
    }

    #[test]
    fn should_match_time_on_page_crossing() {
        let trigger = Trigger::TimeOnPage { seconds: 10 };
        assert!(trigger.matches_event(&BehaviorEvent::time_on_page(9, 10)));
        assert!(!trigger.matches_event(&BehaviorEvent::time_on_page(10, 11)));
        assert!(!trigger.matches_event(&BehaviorEvent::time_on_page(0, 9)));
    }

    #[test]
    fn should_match_inactivity_crossing() {
        let trigger = Trigger::Inactivity { seconds: 30 };
        assert!(trigger.matches_event(&BehaviorEvent::inactivity(29, 30)));
        assert!(!trigger.matches_event(&BehaviorEvent::inactivity(30, 31)));
    }

    #[test]
    fn should_match_funnel_trigger_with_and_without_id() {
        let any = Trigger::FunnelDropoff { funnel_id: None };
        let specific = Trigger::FunnelDropoff {
            funnel_id: Some("checkout".to_string()),
        };
        let event = BehaviorEvent::new(
            EventKind::FunnelDropoff,
            serde_json::json!({ "funnel_id": "checkout" }),
        );
        let other = BehaviorEvent::new(
            EventKind::FunnelDropoff,
            serde_json::json!({ "funnel_id": "onboarding" }),
        );
        assert!(any.matches_event(&event));
        assert!(any.matches_event(&other));
        assert!(specific.matches_event(&event));
        assert!(!specific.matches_event(&other));
    }

    #[test]
    fn should_not_match_events_missing_interval_fields() {
        let trigger = Trigger::ScrollDepth { percentage: 50 };
        let bare = BehaviorEvent::new(EventKind::ScrollDepth, serde_json::json!({}));
        assert!(!trigger.matches_event(&bare));
    }

    #[test]
    fn should_display_trigger_variants() {
        assert_eq!(Trigger::PageView.to_string(), "page_view");
        assert_eq!(
            Trigger::ScrollDepth { percentage: 50 }.to_string(),
            "scroll_depth(50%)"
        );
        assert_eq!(
            Trigger::TimeOnPage { seconds: 30 }.to_string(),
            "time_on_page(30s)"
        );
    }

    #[test]
    fn should_roundtrip_trigger_through_serde_json() {
        let triggers = vec![
            Trigger::PageView,
            Trigger::CustomEvent {
                name: "signup".to_string(),
            },
            Trigger::ScrollDepth { percentage: 75 },
            Trigger::Inactivity { seconds: 60 },
            Trigger::GoalCompleted {
                goal_id: Some("g1".to_string()),
            },
        ];
        for trigger in &triggers {
            let json = serde_json::to_string(trigger).unwrap();
            let parsed: Trigger = serde_json::from_str(&json).unwrap();
            assert_eq!(&parsed, trigger);
        }
    }
}
