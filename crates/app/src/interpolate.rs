//! Variable interpolation — `{{token}}` resolution in action configs.
//!
//! The context overlays the triggering event's payload on top of a fixed
//! set of visitor/session/page facts. Unknown tokens are left verbatim so
//! a typo in a definition degrades visibly instead of erroring.

use serde_json::{Map, Value};

use nudge_domain::page::PageContext;
use nudge_domain::session::SessionState;

/// Build the interpolation context for one triggered automation.
#[must_use]
pub fn build_context(
    page: &PageContext,
    session: &SessionState,
    event_payload: &Value,
) -> Map<String, Value> {
    let mut ctx = Map::new();
    ctx.insert("visitor_id".into(), session.visitor_id.to_string().into());
    ctx.insert("session_id".into(), session.session_id.to_string().into());
    ctx.insert("locale".into(), page.locale.clone().into());
    ctx.insert("language".into(), page.language().into());
    ctx.insert("timezone".into(), page.timezone.clone().into());
    ctx.insert("referrer".into(), page.referrer.clone().into());
    ctx.insert("page_url".into(), page.url.to_string().into());
    ctx.insert("page_title".into(), page.title.clone().into());
    ctx.insert("page_path".into(), page.path().to_string().into());
    ctx.insert("device".into(), page.device_class().to_string().into());
    ctx.insert("screen_width".into(), page.screen_width.into());
    ctx.insert("screen_height".into(), page.screen_height.into());
    let now = nudge_domain::time::now();
    ctx.insert("timestamp".into(), now.timestamp().into());
    ctx.insert("date".into(), now.to_rfc3339().into());

    // Event payload wins over the static facts.
    if let Value::Object(payload) = event_payload {
        for (key, value) in payload {
            ctx.insert(key.clone(), value.clone());
        }
    }
    ctx
}

/// Resolve `{{identifier}}` tokens in a template against the context.
///
/// Tokens missing from the context are left as literal text.
#[must_use]
pub fn interpolate(template: &str, ctx: &Map<String, Value>) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let Some(close) = rest[open + 2..].find("}}") else {
            break;
        };
        let token = rest[open + 2..open + 2 + close].trim();
        output.push_str(&rest[..open]);
        match ctx.get(token) {
            Some(value) => output.push_str(&render(value)),
            // Unknown token: keep the raw placeholder.
            None => output.push_str(&rest[open..open + 2 + close + 2]),
        }
        rest = &rest[open + 2 + close + 2..];
    }
    output.push_str(rest);
    output
}

/// Apply [`interpolate`] to every string-valued field of an action config.
/// Non-string fields pass through unchanged.
#[must_use]
pub fn interpolate_config(
    config: &Map<String, Value>,
    ctx: &Map<String, Value>,
) -> Map<String, Value> {
    config
        .iter()
        .map(|(key, value)| {
            let resolved = match value {
                Value::String(template) => Value::String(interpolate(template, ctx)),
                other => other.clone(),
            };
            (key.clone(), resolved)
        })
        .collect()
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
