//! Condition evaluator — gates an automation on runtime signals.
//!
//! Evaluation is conjunctive: the first failing condition short-circuits
//! and discards the automation for this event. Comparison semantics are
//! deliberately loose (string equality, substring contains, numeric
//! coercion for ordering) to match what definition authors expect.

use nudge_domain::automation::{Condition, ConditionKind, Operator};
use nudge_domain::page::PageContext;
use nudge_domain::session::SessionState;

use crate::ports::CookieStore;

/// The runtime signals a condition can read.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub page: &'a PageContext,
    pub session: &'a SessionState,
}

/// Evaluates an automation's gating conditions.
pub struct ConditionEvaluator<C> {
    cookies: C,
    /// When set, an unrecognized operator passes instead of failing
    /// closed. Default on; preserved observed behavior.
    permissive_operators: bool,
}

impl<C: CookieStore> ConditionEvaluator<C> {
    /// Create an evaluator over the given cookie access.
    pub fn new(cookies: C, permissive_operators: bool) -> Self {
        Self {
            cookies,
            permissive_operators,
        }
    }

    /// Evaluate all conditions (logical AND). Returns `true` if empty.
    pub async fn evaluate_all(
        &self,
        conditions: &[Condition],
        ctx: &EvaluationContext<'_>,
    ) -> bool {
        for condition in conditions {
            if !self.evaluate(condition, ctx).await {
                return false;
            }
        }
        true
    }

    /// Evaluate a single condition.
    pub async fn evaluate(&self, condition: &Condition, ctx: &EvaluationContext<'_>) -> bool {
        let actual = match &condition.kind {
            ConditionKind::Device => Some(ctx.page.device_class().to_string()),
            ConditionKind::Visitor => Some(ctx.session.recency().to_string()),
            ConditionKind::Language => Some(ctx.page.language()),
            ConditionKind::UrlParam { name } => ctx.page.query_param(name),
            ConditionKind::Referrer => {
                if ctx.page.referrer.is_empty() {
                    None
                } else {
                    Some(ctx.page.referrer.clone())
                }
            }
            ConditionKind::PageViews => Some(ctx.session.page_views().to_string()),
            ConditionKind::TrafficSource => Some(ctx.page.traffic_source().to_string()),
            ConditionKind::Cookie { name } => match self.cookies.get(name).await {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(cookie = %name, error = %err,
                        "cookie read failed; treating as absent");
                    None
                }
            },
        };

        self.apply_operator(condition, actual.as_deref())
    }

    fn apply_operator(&self, condition: &Condition, actual: Option<&str>) -> bool {
        // Presence checks and the unknown-operator fallback resolve without
        // looking at the actual value.
        match &condition.operator {
            Operator::Exists => return actual.is_some(),
            Operator::NotExists => return actual.is_none(),
            Operator::Unknown(raw) => {
                tracing::warn!(operator = %raw, permissive = self.permissive_operators,
                    "unknown condition operator");
                return self.permissive_operators;
            }
            _ => {}
        }

        let Some(actual) = actual else {
            // A missing signal can only satisfy a negative comparison.
            return condition.operator == Operator::NotEquals;
        };
        let expected = loose_string(&condition.value);

        match &condition.operator {
            Operator::Equals => actual == expected,
            Operator::NotEquals => actual != expected,
            Operator::Contains => actual.contains(expected.as_str()),
            Operator::GreaterThan => match (as_number(actual), as_number(&expected)) {
                (Some(lhs), Some(rhs)) => lhs > rhs,
                _ => false,
            },
            Operator::LessThan => match (as_number(actual), as_number(&expected)) {
                (Some(lhs), Some(rhs)) => lhs < rhs,
                _ => false,
            },
            Operator::Exists | Operator::NotExists | Operator::Unknown(_) => {
                unreachable!("handled above")
            }
        }
    }
}

/// Stringify an expected value the way loose comparison wants it:
/// strings stay raw, primitives render without quotes.
fn loose_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_number(raw: &str) -> Option<f64> {
    raw.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Mutex;

    use nudge_domain::error::NudgeError;
    use nudge_domain::id::VisitorId;
    use url::Url;

    #[derive(Default)]
    struct MemoryCookies {
        jar: Mutex<HashMap<String, String>>,
    }

    impl MemoryCookies {
        fn with(entries: &[(&str, &str)]) -> Self {
            let jar = entries
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect();
            Self {
                jar: Mutex::new(jar),
            }
        }
    }

    impl CookieStore for MemoryCookies {
        fn get(
            &self,
            name: &str,
        ) -> impl Future<Output = Result<Option<String>, NudgeError>> + Send {
            let value = self.jar.lock().unwrap().get(name).cloned();
            async { Ok(value) }
        }

        fn set(
            &self,
            name: &str,
            value: &str,
            _max_age_days: u32,
        ) -> impl Future<Output = Result<(), NudgeError>> + Send {
            self.jar
                .lock()
                .unwrap()
                .insert(name.to_string(), value.to_string());
            async { Ok(()) }
        }
    }

    fn page(url: &str) -> PageContext {
        PageContext {
            url: Url::parse(url).unwrap(),
            title: "Test".to_string(),
            referrer: String::new(),
            locale: "en-US".to_string(),
            timezone: "UTC".to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64)".to_string(),
            screen_width: 1920,
            screen_height: 1080,
        }
    }

    fn evaluator() -> ConditionEvaluator<MemoryCookies> {
        ConditionEvaluator::new(MemoryCookies::default(), true)
    }

    fn condition(kind: ConditionKind, operator: Operator, value: serde_json::Value) -> Condition {
        Condition::new(kind, operator, value)
    }

    #[tokio::test]
    async fn should_pass_when_conditions_are_empty() {
        let page = page("https://example.com/");
        let session = SessionState::begin(VisitorId::new());
        let ctx = EvaluationContext {
            page: &page,
            session: &session,
        };
        assert!(evaluator().evaluate_all(&[], &ctx).await);
    }

    #[tokio::test]
    async fn should_short_circuit_on_first_failure() {
        let page = page("https://example.com/");
        let session = SessionState::begin(VisitorId::new());
        let ctx = EvaluationContext {
            page: &page,
            session: &session,
        };
        let conditions = [
            condition(
                ConditionKind::Device,
                Operator::Equals,
                serde_json::json!("mobile"),
            ),
            condition(
                ConditionKind::Language,
                Operator::Equals,
                serde_json::json!("en"),
            ),
        ];
        // Desktop UA fails the first condition; the second never matters.
        assert!(!evaluator().evaluate_all(&conditions, &ctx).await);
    }

    #[tokio::test]
    async fn should_compare_numbers_with_gt_and_lt() {
        let page = page("https://example.com/?count=5");
        let session = SessionState::begin(VisitorId::new());
        let ctx = EvaluationContext {
            page: &page,
            session: &session,
        };
        let kind = ConditionKind::UrlParam {
            name: "count".to_string(),
        };
        let gt3 = condition(kind.clone(), Operator::GreaterThan, serde_json::json!(3));
        assert!(evaluator().evaluate(&gt3, &ctx).await);

        let gt9 = condition(kind.clone(), Operator::GreaterThan, serde_json::json!(9));
        assert!(!evaluator().evaluate(&gt9, &ctx).await);

        let lt9 = condition(kind, Operator::LessThan, serde_json::json!(9));
        assert!(evaluator().evaluate(&lt9, &ctx).await);
    }

    #[tokio::test]
    async fn should_match_language_and_visitor_recency() {
        let page = page("https://example.com/");
        let session = SessionState::begin(VisitorId::new());
        let ctx = EvaluationContext {
            page: &page,
            session: &session,
        };
        let lang = condition(
            ConditionKind::Language,
            Operator::Equals,
            serde_json::json!("en"),
        );
        assert!(evaluator().evaluate(&lang, &ctx).await);

        let new_visitor = condition(
            ConditionKind::Visitor,
            Operator::Equals,
            serde_json::json!("new"),
        );
        assert!(evaluator().evaluate(&new_visitor, &ctx).await);
    }

    #[tokio::test]
    async fn should_resolve_cookie_presence_immediately() {
        let page = page("https://example.com/");
        let session = SessionState::begin(VisitorId::new());
        let ctx = EvaluationContext {
            page: &page,
            session: &session,
        };
        let evaluator = ConditionEvaluator::new(MemoryCookies::with(&[("consent", "yes")]), true);

        let exists = condition(
            ConditionKind::Cookie {
                name: "consent".to_string(),
            },
            Operator::Exists,
            serde_json::Value::Null,
        );
        assert!(evaluator.evaluate(&exists, &ctx).await);

        let not_exists = condition(
            ConditionKind::Cookie {
                name: "missing".to_string(),
            },
            Operator::NotExists,
            serde_json::Value::Null,
        );
        assert!(evaluator.evaluate(&not_exists, &ctx).await);
    }

    #[tokio::test]
    async fn should_compare_cookie_value_when_present() {
        let page = page("https://example.com/");
        let session = SessionState::begin(VisitorId::new());
        let ctx = EvaluationContext {
            page: &page,
            session: &session,
        };
        let evaluator = ConditionEvaluator::new(MemoryCookies::with(&[("plan", "pro-2024")]), true);

        let contains = condition(
            ConditionKind::Cookie {
                name: "plan".to_string(),
            },
            Operator::Contains,
            serde_json::json!("pro"),
        );
        assert!(evaluator.evaluate(&contains, &ctx).await);
    }

    #[tokio::test]
    async fn should_apply_permissive_fallback_for_unknown_operator() {
        let page = page("https://example.com/");
        let session = SessionState::begin(VisitorId::new());
        let ctx = EvaluationContext {
            page: &page,
            session: &session,
        };
        let weird = condition(
            ConditionKind::Device,
            Operator::Unknown("matches_regex".to_string()),
            serde_json::json!(".*"),
        );

        let permissive = ConditionEvaluator::new(MemoryCookies::default(), true);
        assert!(permissive.evaluate(&weird, &ctx).await);

        let strict = ConditionEvaluator::new(MemoryCookies::default(), false);
        assert!(!strict.evaluate(&weird, &ctx).await);

        // The fallback applies even when the signal itself is missing.
        let weird_missing = condition(
            ConditionKind::UrlParam {
                name: "absent".to_string(),
            },
            Operator::Unknown("matches_regex".to_string()),
            serde_json::json!(".*"),
        );
        assert!(permissive.evaluate(&weird_missing, &ctx).await);
        assert!(!strict.evaluate(&weird_missing, &ctx).await);
    }

    #[tokio::test]
    async fn should_only_satisfy_not_equals_when_signal_missing() {
        let page = page("https://example.com/");
        let session = SessionState::begin(VisitorId::new());
        let ctx = EvaluationContext {
            page: &page,
            session: &session,
        };
        let kind = ConditionKind::UrlParam {
            name: "missing".to_string(),
        };
        let eq = condition(kind.clone(), Operator::Equals, serde_json::json!("x"));
        assert!(!evaluator().evaluate(&eq, &ctx).await);
        let neq = condition(kind, Operator::NotEquals, serde_json::json!("x"));
        assert!(evaluator().evaluate(&neq, &ctx).await);
    }

    #[tokio::test]
    async fn should_match_page_views_count() {
        let page = page("https://example.com/");
        let mut session = SessionState::begin(VisitorId::new());
        session.record_page_view();
        session.record_page_view();
        session.record_page_view();
        let ctx = EvaluationContext {
            page: &page,
            session: &session,
        };
        let at_least_two = condition(
            ConditionKind::PageViews,
            Operator::GreaterThan,
            serde_json::json!(2),
        );
        assert!(evaluator().evaluate(&at_least_two, &ctx).await);
    }
}
