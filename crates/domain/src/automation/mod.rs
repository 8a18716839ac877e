//! Automation — trigger → condition → action rules.
//!
//! Automations are produced by an external workflow builder and consumed
//! here as immutable configuration: each has one [`Trigger`], an optional
//! URL filter, a [`FrequencyPolicy`], zero or more [`Condition`]s, and an
//! ordered list of [`Action`]s. The engine never creates or edits them.

mod action;
mod condition;
mod frequency;
mod trigger;

pub use action::{Action, ActionKind};
pub use condition::{Condition, ConditionKind, Operator};
pub use frequency::FrequencyPolicy;
pub use trigger::Trigger;

use serde::{Deserialize, Serialize};

use crate::error::{NudgeError, ValidationError};
use crate::id::AutomationId;

/// A rule that reacts to visitor behavior by executing actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Automation {
    pub id: AutomationId,
    pub name: String,
    pub enabled: bool,
    pub trigger: Trigger,
    /// Optional URL pattern the current page path must match: either an
    /// exact path or a `*`-wildcard pattern.
    pub url_filter: Option<String>,
    pub frequency: FrequencyPolicy,
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
}

impl Automation {
    /// Create a builder for constructing an [`Automation`].
    #[must_use]
    pub fn builder() -> AutomationBuilder {
        AutomationBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`NudgeError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - `actions` is empty ([`ValidationError::NoActions`])
    pub fn validate(&self) -> Result<(), NudgeError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.actions.is_empty() {
            return Err(ValidationError::NoActions.into());
        }
        Ok(())
    }

    /// Check the URL filter against the current page path.
    ///
    /// No filter matches every path.
    #[must_use]
    pub fn matches_path(&self, path: &str) -> bool {
        match &self.url_filter {
            Some(pattern) => pattern_matches(pattern, path),
            None => true,
        }
    }
}

/// Match a URL filter pattern against a path.
///
/// A pattern without `*` must equal the path exactly. A pattern with `*`
/// matches permissively: each literal segment must appear in order, the
/// first anchored at the start and the last at the end.
#[must_use]
pub fn pattern_matches(pattern: &str, path: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == path;
    }

    let mut remainder = path;
    let parts: Vec<&str> = pattern.split('*').collect();
    for (index, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if index == 0 {
            match remainder.strip_prefix(part) {
                Some(rest) => remainder = rest,
                None => return false,
            }
        } else if index == parts.len() - 1 {
            match remainder.strip_suffix(part) {
                Some(rest) => remainder = rest,
                None => return false,
            }
        } else {
            match remainder.find(part) {
                Some(at) => remainder = &remainder[at + part.len()..],
                None => return false,
            }
        }
    }
    true
}

/// Step-by-step builder for [`Automation`].
#[derive(Debug, Default)]
pub struct AutomationBuilder {
    id: Option<AutomationId>,
    name: Option<String>,
    enabled: Option<bool>,
    trigger: Option<Trigger>,
    url_filter: Option<String>,
    frequency: Option<FrequencyPolicy>,
    conditions: Vec<Condition>,
    actions: Vec<Action>,
}

impl AutomationBuilder {
    #[must_use]
    pub fn id(mut self, id: AutomationId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    #[must_use]
    pub fn url_filter(mut self, pattern: impl Into<String>) -> Self {
        self.url_filter = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn frequency(mut self, frequency: FrequencyPolicy) -> Self {
        self.frequency = Some(frequency);
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Consume the builder, validate, and return an [`Automation`].
    ///
    /// # Errors
    ///
    /// Returns [`NudgeError::Validation`] if required fields are missing or empty.
    pub fn build(self) -> Result<Automation, NudgeError> {
        let automation = Automation {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            enabled: self.enabled.unwrap_or(true),
            trigger: self.trigger.unwrap_or(Trigger::PageView),
            url_filter: self.url_filter,
            frequency: self.frequency.unwrap_or_default(),
            conditions: self.conditions,
            actions: self.actions,
        };
        automation.validate()?;
        Ok(automation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_action() -> Action {
        Action::new(
            ActionKind::TrackEvent,
            serde_json::json!({ "event_name": "fired" }),
        )
    }

    fn valid_automation() -> Automation {
        Automation::builder()
            .name("Welcome modal")
            .trigger(Trigger::ScrollDepth { percentage: 50 })
            .action(valid_action())
            .build()
            .unwrap()
    }

    #[test]
    fn should_build_valid_automation_when_required_fields_provided() {
        let auto = valid_automation();
        assert_eq!(auto.name, "Welcome modal");
        assert!(auto.enabled);
        assert!(auto.conditions.is_empty());
        assert_eq!(auto.actions.len(), 1);
        assert!(auto.url_filter.is_none());
        assert_eq!(auto.frequency, FrequencyPolicy::Always);
    }

    #[test]
    fn should_default_to_page_view_trigger_when_not_specified() {
        let auto = Automation::builder()
            .name("Default trigger")
            .action(valid_action())
            .build()
            .unwrap();
        assert!(matches!(auto.trigger, Trigger::PageView));
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = Automation::builder().action(valid_action()).build();
        assert!(matches!(
            result,
            Err(NudgeError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_return_validation_error_when_actions_is_empty() {
        let result = Automation::builder().name("No actions").build();
        assert!(matches!(
            result,
            Err(NudgeError::Validation(ValidationError::NoActions))
        ));
    }

    #[test]
    fn should_accumulate_conditions_and_actions() {
        let auto = Automation::builder()
            .name("Multi")
            .condition(Condition::new(
                ConditionKind::Device,
                Operator::Equals,
                serde_json::json!("mobile"),
            ))
            .condition(Condition::new(
                ConditionKind::PageViews,
                Operator::GreaterThan,
                serde_json::json!(2),
            ))
            .action(valid_action())
            .action(valid_action())
            .build()
            .unwrap();
        assert_eq!(auto.conditions.len(), 2);
        assert_eq!(auto.actions.len(), 2);
    }

    #[test]
    fn should_match_any_path_when_no_url_filter() {
        let auto = valid_automation();
        assert!(auto.matches_path("/anything"));
    }

    #[test]
    fn should_match_exact_path_filter_only_exactly() {
        let auto = Automation::builder()
            .name("Pricing only")
            .url_filter("/pricing")
            .action(valid_action())
            .build()
            .unwrap();
        assert!(auto.matches_path("/pricing"));
        assert!(!auto.matches_path("/pricing/enterprise"));
        assert!(!auto.matches_path("/"));
    }

    #[test]
    fn should_match_wildcard_filter_permissively() {
        assert!(pattern_matches("/blog/*", "/blog/post-1"));
        assert!(!pattern_matches("/blog/*", "/shop"));
        assert!(pattern_matches("*", "/anything/at/all"));
        assert!(pattern_matches("/docs/*/install", "/docs/v2/install"));
        assert!(!pattern_matches("/docs/*/install", "/docs/v2/usage"));
    }

    #[test]
    fn should_roundtrip_automation_through_serde_json() {
        let auto = valid_automation();
        let json = serde_json::to_string(&auto).unwrap();
        let parsed: Automation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, auto.id);
        assert_eq!(parsed.name, auto.name);
        assert_eq!(parsed.enabled, auto.enabled);
        assert_eq!(parsed.actions.len(), auto.actions.len());
    }
}
