//! Action executor — runs a matched automation's action chain.
//!
//! Actions execute strictly in declared order; each handler is awaited
//! before the next starts. A failing handler is caught, logged, and
//! counted — it never aborts the remaining actions. The chain settles into
//! an [`ExecutionRecord`] for the delivery buffer.

use serde_json::{Map, Value};

use nudge_domain::automation::{Action, ActionKind, Automation};
use nudge_domain::error::{DefinitionError, NudgeError};
use nudge_domain::event::BehaviorEvent;
use nudge_domain::execution::{ExecutionRecord, ExecutionStatus};
use nudge_domain::id::WebsiteId;
use nudge_domain::page::PageContext;
use nudge_domain::session::SessionState;
use nudge_domain::signal::{EngineSignal, SignalKind};
use nudge_domain::time;

use crate::interpolate;
use crate::ports::{
    ButtonAction, CookieStore, OverlayButton, OverlayPresentation, OverlayStyle, PageSurface,
    ScriptPlacement, SignalPublisher,
};

/// Executes action chains against the page surface.
pub struct ActionExecutor<P, C, B> {
    website_id: WebsiteId,
    surface: P,
    cookies: C,
    publisher: B,
}

impl<P, C, B> ActionExecutor<P, C, B>
where
    P: PageSurface,
    C: CookieStore,
    B: SignalPublisher,
{
    /// Create an executor bound to one website.
    pub fn new(website_id: WebsiteId, surface: P, cookies: C, publisher: B) -> Self {
        Self {
            website_id,
            surface,
            cookies,
            publisher,
        }
    }

    /// Run the automation's actions in order and settle into a record.
    #[tracing::instrument(skip_all, fields(automation = %automation.name))]
    pub async fn run(
        &self,
        automation: &Automation,
        event: &BehaviorEvent,
        page: &PageContext,
        session: &SessionState,
    ) -> ExecutionRecord {
        let ctx = interpolate::build_context(page, session, &event.payload);

        let mut success_count = 0u32;
        let mut failure_count = 0u32;

        for action in &automation.actions {
            let resolved = Action {
                kind: action.kind,
                config: interpolate::interpolate_config(&action.config, &ctx),
            };
            match self.perform(&resolved).await {
                Ok(()) => {
                    success_count += 1;
                    let _ = self
                        .publisher
                        .publish(EngineSignal::new(
                            SignalKind::ActionPerformed,
                            Some(automation.id),
                            serde_json::json!({
                                "action": resolved.kind.as_str(),
                                "config": Value::Object(resolved.config),
                            }),
                        ))
                        .await;
                }
                Err(err) => {
                    failure_count += 1;
                    tracing::warn!(action = %resolved.kind, error = %err, "action failed");
                    let _ = self
                        .publisher
                        .publish(EngineSignal::new(
                            SignalKind::ActionFailed,
                            Some(automation.id),
                            serde_json::json!({
                                "action": resolved.kind.as_str(),
                                "error": err.to_string(),
                            }),
                        ))
                        .await;
                }
            }
        }

        let status = ExecutionStatus::from_failures(failure_count);
        let _ = self
            .publisher
            .publish(EngineSignal::new(
                SignalKind::ExecutionCompleted,
                Some(automation.id),
                serde_json::json!({
                    "status": status.to_string(),
                    "success_count": success_count,
                    "failure_count": failure_count,
                }),
            ))
            .await;

        ExecutionRecord {
            automation_id: automation.id,
            website_id: self.website_id,
            visitor_id: session.visitor_id,
            session_id: session.session_id,
            status,
            success_count,
            failure_count,
            execution_data: event.payload.clone(),
            executed_at: time::now(),
        }
    }

    /// Dispatch one resolved action to its handler.
    async fn perform(&self, action: &Action) -> Result<(), NudgeError> {
        match action.kind {
            ActionKind::ShowModal => self.show_overlay(action, OverlayStyle::Modal).await,
            ActionKind::ShowBanner => self.show_overlay(action, OverlayStyle::Banner).await,
            ActionKind::ShowToast => self.show_overlay(action, OverlayStyle::Toast).await,
            ActionKind::InjectScript => {
                let code = required_str(action, "code")?;
                let placement = match action.config_str("placement") {
                    Some("head") => ScriptPlacement::Head,
                    _ => ScriptPlacement::Body,
                };
                self.surface.inject_script(&code, placement).await
            }
            ActionKind::Redirect => {
                let url = required_str(action, "url")?;
                let new_tab = action.config_bool("new_tab").unwrap_or(false);
                let delay_ms = action
                    .config_f64("delay_ms")
                    .or_else(|| action.config_f64("delay"))
                    .unwrap_or(0.0);
                if delay_ms > 0.0 {
                    tokio::time::sleep(millis(delay_ms)).await;
                }
                self.surface.navigate(&url, new_tab).await
            }
            ActionKind::ToggleElement => {
                let selector = required_str(action, "selector")?;
                let visible = action
                    .config_bool("visible")
                    .or_else(|| action.config_str("mode").map(|mode| mode == "show"))
                    .unwrap_or(false);
                self.surface.set_visible(&selector, visible).await
            }
            ActionKind::TrackEvent => {
                let name = action
                    .config_str("event_name")
                    .or_else(|| action.config_str("name"))
                    .map(str::to_string)
                    .ok_or(DefinitionError::MissingField {
                        kind: ActionKind::TrackEvent.as_str(),
                        field: "event_name",
                    })?;
                let properties = parse_properties(action);
                self.publisher
                    .publish(EngineSignal::new(
                        SignalKind::TrackingEvent,
                        None,
                        serde_json::json!({ "name": name, "properties": properties }),
                    ))
                    .await
            }
            ActionKind::SetCookie => {
                let name = required_str(action, "name")?;
                let value = required_str(action, "value")?;
                let days = expiry_days(action);
                self.cookies.set(&name, &value, days).await
            }
        }
    }

    async fn show_overlay(
        &self,
        action: &Action,
        style: OverlayStyle,
    ) -> Result<(), NudgeError> {
        let overlay = build_overlay(action, style);
        self.surface.mount_overlay(overlay).await
    }
}

/// Assemble the overlay from structured fields or the markup override.
fn build_overlay(action: &Action, style: OverlayStyle) -> OverlayPresentation {
    let auto_dismiss = match style {
        OverlayStyle::Modal => action.config_f64("duration_ms").map(millis),
        // Banners and toasts self-dismiss even without explicit config.
        OverlayStyle::Banner | OverlayStyle::Toast => {
            Some(millis(action.config_f64("duration_ms").unwrap_or(5000.0)))
        }
    };

    OverlayPresentation {
        style,
        headline: owned(action, &["headline", "title"]),
        body: owned(action, &["body", "message"]),
        custom_markup: owned(action, &["custom_html", "markup"]),
        primary: button_from(action, "primary"),
        secondary: button_from(action, "secondary"),
        position: owned(action, &["position"]),
        auto_dismiss,
    }
}

fn button_from(action: &Action, prefix: &str) -> Option<OverlayButton> {
    let label = action.config_str(&format!("{prefix}_label"))?.to_string();
    let button_action = match action.config_str(&format!("{prefix}_action")) {
        Some("redirect") => ButtonAction::Redirect {
            url: action
                .config_str(&format!("{prefix}_url"))
                .unwrap_or_default()
                .to_string(),
            new_tab: action
                .config_bool(&format!("{prefix}_new_tab"))
                .unwrap_or(false),
        },
        _ => ButtonAction::Close,
    };
    Some(OverlayButton {
        label,
        action: button_action,
    })
}

/// Tracking-event properties arrive JSON-encoded; malformed payloads are
/// logged and replaced with an empty object rather than failing the action.
fn parse_properties(action: &Action) -> Value {
    match action.config.get("properties") {
        Some(Value::String(raw)) => match serde_json::from_str(raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(error = %err, "malformed tracking-event properties");
                Value::Object(Map::new())
            }
        },
        Some(other) => other.clone(),
        None => Value::Object(Map::new()),
    }
}

fn owned(action: &Action, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| action.config_str(key))
        .map(str::to_string)
}

fn required_str(action: &Action, field: &'static str) -> Result<String, NudgeError> {
    action
        .config_str(field)
        .map(str::to_string)
        .ok_or_else(|| {
            DefinitionError::MissingField {
                kind: action.kind.as_str(),
                field,
            }
            .into()
        })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn millis(value: f64) -> std::time::Duration {
    std::time::Duration::from_millis(value.max(0.0) as u64)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn expiry_days(action: &Action) -> u32 {
    action
        .config_f64("days")
        .or_else(|| action.config_f64("expires_days"))
        .map_or(30, |days| days.max(0.0) as u32)
}
