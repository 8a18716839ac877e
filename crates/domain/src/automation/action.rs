//! Action — the effect performed when an automation fires.

use serde::{Deserialize, Serialize};

/// The closed set of effects the executor knows how to perform.
///
/// Unknown wire kinds are rejected as a typed definition error when the
/// automation is parsed; they never reach the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Centered overlay with backdrop, dismissed by the visitor.
    ShowModal,
    /// Edge-pinned bar, auto-dismissed after a configured duration.
    ShowBanner,
    /// Corner notification, auto-dismissed after a configured duration.
    ShowToast,
    /// Inject a literal script into head or body.
    InjectScript,
    /// Navigate away after an optional delay, optionally in a new tab.
    Redirect,
    /// Show or hide an element by selector.
    ToggleElement,
    /// Emit a named tracking event with optional JSON-encoded properties.
    TrackEvent,
    /// Set a cookie with a name, value, and expiration in days.
    SetCookie,
}

impl ActionKind {
    /// Canonical wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ShowModal => "show_modal",
            Self::ShowBanner => "show_banner",
            Self::ShowToast => "show_toast",
            Self::InjectScript => "inject_script",
            Self::Redirect => "redirect",
            Self::ToggleElement => "toggle_element",
            Self::TrackEvent => "track_event",
            Self::SetCookie => "set_cookie",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured effect: a kind plus its free-form configuration map.
///
/// The configuration stays a JSON map (string or primitive values) so the
/// variable interpolator can resolve `{{token}}` placeholders in every
/// string field uniformly, whatever the action kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    #[serde(default)]
    pub config: serde_json::Map<String, serde_json::Value>,
}

impl Action {
    /// Construct an action from a kind and a JSON object configuration.
    ///
    /// # Panics
    ///
    /// Panics if `config` is not a JSON object; callers pass
    /// `serde_json::json!({...})` literals.
    #[must_use]
    pub fn new(kind: ActionKind, config: serde_json::Value) -> Self {
        match config {
            serde_json::Value::Object(map) => Self { kind, config: map },
            other => panic!("action config must be a JSON object, got {other}"),
        }
    }

    /// Read a string configuration field.
    #[must_use]
    pub fn config_str(&self, field: &str) -> Option<&str> {
        self.config.get(field).and_then(serde_json::Value::as_str)
    }

    /// Read a numeric configuration field, coercing numeric strings.
    #[must_use]
    pub fn config_f64(&self, field: &str) -> Option<f64> {
        match self.config.get(field)? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Read a boolean configuration field, accepting `"true"` / `"false"`.
    #[must_use]
    pub fn config_bool(&self, field: &str) -> Option<bool> {
        match self.config.get(field)? {
            serde_json::Value::Bool(b) => Some(*b),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_read_typed_config_fields() {
        let action = Action::new(
            ActionKind::Redirect,
            serde_json::json!({
                "url": "https://example.com",
                "delay_ms": 1500,
                "new_tab": true
            }),
        );
        assert_eq!(action.config_str("url"), Some("https://example.com"));
        assert_eq!(action.config_f64("delay_ms"), Some(1500.0));
        assert_eq!(action.config_bool("new_tab"), Some(true));
    }

    #[test]
    fn should_coerce_stringly_numbers_and_bools() {
        let action = Action::new(
            ActionKind::SetCookie,
            serde_json::json!({ "days": "30", "secure": "true" }),
        );
        assert_eq!(action.config_f64("days"), Some(30.0));
        assert_eq!(action.config_bool("secure"), Some(true));
    }

    #[test]
    fn should_return_none_for_missing_or_mistyped_fields() {
        let action = Action::new(ActionKind::TrackEvent, serde_json::json!({ "n": [1, 2] }));
        assert!(action.config_str("missing").is_none());
        assert!(action.config_f64("n").is_none());
        assert!(action.config_bool("n").is_none());
    }

    #[test]
    fn should_display_action_kind_names() {
        assert_eq!(ActionKind::ShowModal.to_string(), "show_modal");
        assert_eq!(ActionKind::SetCookie.to_string(), "set_cookie");
    }

    #[test]
    fn should_roundtrip_action_through_serde_json() {
        let action = Action::new(
            ActionKind::TrackEvent,
            serde_json::json!({ "event_name": "promo_shown" }),
        );
        let json = serde_json::to_string(&action).unwrap();
        let parsed: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, action);
    }

    #[test]
    fn should_deserialize_action_with_default_empty_config() {
        let json = serde_json::json!({ "kind": "show_modal" });
        let action: Action = serde_json::from_value(json).unwrap();
        assert_eq!(action.kind, ActionKind::ShowModal);
        assert!(action.config.is_empty());
    }
}
