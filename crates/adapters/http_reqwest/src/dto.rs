//! Wire DTOs for the automation-fetch endpoint.
//!
//! The workflow-builder backend has emitted both snake_case and camelCase
//! field names over time, so every field accepts both spellings, and kind
//! strings are normalized before matching. Unknown trigger/condition/action
//! kinds are a typed [`DefinitionError`] — the offending automation is
//! skipped at load time, never silently no-opped.

use serde::Deserialize;
use serde_json::{Map, Value};

use nudge_domain::automation::{
    Action, ActionKind, Automation, Condition, ConditionKind, FrequencyPolicy, Operator, Trigger,
};
use nudge_domain::error::{DefinitionError, NudgeError};
use nudge_domain::id::AutomationId;

/// Response body of the active-automations endpoint.
#[derive(Debug, Deserialize)]
pub struct AutomationsResponse {
    #[serde(default)]
    pub automations: Vec<AutomationPayload>,
}

/// One automation definition as the server sends it.
#[derive(Debug, Deserialize)]
pub struct AutomationPayload {
    pub id: AutomationId,
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(alias = "triggerType")]
    pub trigger_type: String,
    #[serde(default, alias = "triggerConfig")]
    pub trigger_config: Map<String, Value>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub conditions: Vec<ConditionPayload>,
    #[serde(default)]
    pub actions: Vec<ActionPayload>,
}

/// One gating condition as the server sends it.
#[derive(Debug, Deserialize)]
pub struct ConditionPayload {
    #[serde(alias = "conditionType")]
    pub condition_type: String,
    #[serde(default = "default_operator")]
    pub operator: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default, alias = "conditionConfig")]
    pub config: Map<String, Value>,
}

/// One action as the server sends it.
#[derive(Debug, Deserialize)]
pub struct ActionPayload {
    #[serde(alias = "actionType")]
    pub action_type: String,
    #[serde(default, alias = "actionConfig")]
    pub action_config: Map<String, Value>,
}

fn default_true() -> bool {
    true
}

fn default_operator() -> String {
    "equals".to_string()
}

impl AutomationPayload {
    /// Convert the wire shape into the domain aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`NudgeError::Definition`] for unknown kinds or missing
    /// required configuration, and [`NudgeError::Validation`] when the
    /// definition violates domain invariants.
    pub fn into_domain(self) -> Result<Automation, NudgeError> {
        let trigger = parse_trigger(&self.trigger_type, &self.trigger_config)?;
        let url_filter = map_str(
            &self.trigger_config,
            &["url_pattern", "urlPattern", "url_filter", "urlFilter"],
        );
        let frequency = self
            .frequency
            .as_deref()
            .or_else(|| {
                self.trigger_config
                    .get("frequency")
                    .and_then(Value::as_str)
            })
            .map_or(FrequencyPolicy::Always, parse_frequency);

        let mut builder = Automation::builder()
            .id(self.id)
            .name(self.name)
            .enabled(self.enabled)
            .trigger(trigger)
            .frequency(frequency);
        if let Some(pattern) = url_filter {
            builder = builder.url_filter(pattern);
        }
        for condition in self.conditions {
            builder = builder.condition(condition.into_domain()?);
        }
        for action in self.actions {
            builder = builder.action(action.into_domain()?);
        }
        builder.build()
    }
}

impl ConditionPayload {
    fn into_domain(self) -> Result<Condition, DefinitionError> {
        let kind = match compact(&self.condition_type).as_str() {
            "device" | "devicetype" => ConditionKind::Device,
            "visitor" | "visitortype" => ConditionKind::Visitor,
            "language" | "locale" => ConditionKind::Language,
            "urlparam" | "queryparam" => ConditionKind::UrlParam {
                name: map_str(&self.config, &["name", "param"]).ok_or(
                    DefinitionError::MissingField {
                        kind: "url_param",
                        field: "name",
                    },
                )?,
            },
            "referrer" | "referrerurl" => ConditionKind::Referrer,
            "pageviews" | "pageviewcount" => ConditionKind::PageViews,
            "trafficsource" => ConditionKind::TrafficSource,
            "cookie" => ConditionKind::Cookie {
                name: map_str(&self.config, &["name", "cookie"]).ok_or(
                    DefinitionError::MissingField {
                        kind: "cookie",
                        field: "name",
                    },
                )?,
            },
            _ => return Err(DefinitionError::UnknownCondition(self.condition_type)),
        };
        Ok(Condition::new(kind, Operator::parse(&self.operator), self.value))
    }
}

impl ActionPayload {
    fn into_domain(self) -> Result<Action, DefinitionError> {
        let mut config = self.action_config;
        let kind = match compact(&self.action_type).as_str() {
            "showmodal" | "modal" | "showpopup" | "popup" => ActionKind::ShowModal,
            "showbanner" | "banner" => ActionKind::ShowBanner,
            "showtoast" | "toast" | "shownotification" | "notification" => ActionKind::ShowToast,
            "injectscript" | "script" => ActionKind::InjectScript,
            "redirect" => ActionKind::Redirect,
            "toggleelement" | "toggle" => ActionKind::ToggleElement,
            // Dedicated hide/show spellings fold into the toggle handler.
            "hideelement" => {
                config
                    .entry("mode".to_string())
                    .or_insert_with(|| Value::String("hide".to_string()));
                ActionKind::ToggleElement
            }
            "showelement" => {
                config
                    .entry("mode".to_string())
                    .or_insert_with(|| Value::String("show".to_string()));
                ActionKind::ToggleElement
            }
            "trackevent" | "track" => ActionKind::TrackEvent,
            "setcookie" => ActionKind::SetCookie,
            _ => return Err(DefinitionError::UnknownAction(self.action_type)),
        };
        Ok(Action { kind, config })
    }
}

fn parse_trigger(kind: &str, config: &Map<String, Value>) -> Result<Trigger, DefinitionError> {
    let trigger = match compact(kind).as_str() {
        "pageview" => Trigger::PageView,
        "customevent" | "custom" | "event" => Trigger::CustomEvent {
            name: map_str(config, &["event_name", "eventName", "name"]).ok_or(
                DefinitionError::MissingField {
                    kind: "custom_event",
                    field: "event_name",
                },
            )?,
        },
        "scroll" | "scrolldepth" => Trigger::ScrollDepth {
            percentage: truncate_u32(
                map_u64(config, &["percentage", "percent", "depth"]).ok_or(
                    DefinitionError::MissingField {
                        kind: "scroll_depth",
                        field: "percentage",
                    },
                )?,
            ),
        },
        "timeonpage" | "timer" | "time" => Trigger::TimeOnPage {
            seconds: map_u64(config, &["seconds", "duration"]).ok_or(
                DefinitionError::MissingField {
                    kind: "time_on_page",
                    field: "seconds",
                },
            )?,
        },
        "inactivity" | "idle" => Trigger::Inactivity {
            seconds: map_u64(config, &["seconds", "duration"]).ok_or(
                DefinitionError::MissingField {
                    kind: "inactivity",
                    field: "seconds",
                },
            )?,
        },
        "formsubmit" | "formsubmission" | "form" => Trigger::FormSubmit,
        "exitintent" | "exit" => Trigger::ExitIntent,
        "funneldropoff" => Trigger::FunnelDropoff {
            funnel_id: map_str(config, &["funnel_id", "funnelId"]),
        },
        "funnelcomplete" | "funnelcompleted" => Trigger::FunnelComplete {
            funnel_id: map_str(config, &["funnel_id", "funnelId"]),
        },
        "goalcompleted" | "goal" => Trigger::GoalCompleted {
            goal_id: map_str(config, &["goal_id", "goalId"]),
        },
        _ => return Err(DefinitionError::UnknownTrigger(kind.to_string())),
    };
    Ok(trigger)
}

fn parse_frequency(raw: &str) -> FrequencyPolicy {
    match compact(raw).as_str() {
        "" | "always" => FrequencyPolicy::Always,
        "once" | "oncepervisitor" => FrequencyPolicy::OncePerVisitor,
        "oncepersession" => FrequencyPolicy::OncePerSession,
        "onceperday" | "daily" => FrequencyPolicy::OncePerDay,
        other => {
            tracing::warn!(frequency = other, "unknown frequency policy; defaulting to always");
            FrequencyPolicy::Always
        }
    }
}

/// Lowercase and strip separators so `pageView`, `page_view`, and
/// `page-view` all compare equal.
fn compact(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '_' && *c != '-')
        .collect::<String>()
        .to_lowercase()
}

fn map_str(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| map.get(*key))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn map_u64(map: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|key| map.get(*key)).and_then(|value| {
        value
            .as_u64()
            .or_else(|| value.as_str().and_then(|raw| raw.trim().parse().ok()))
    })
}

#[allow(clippy::cast_possible_truncation)]
fn truncate_u32(value: u64) -> u32 {
    value.min(u64::from(u32::MAX)) as u32
}
