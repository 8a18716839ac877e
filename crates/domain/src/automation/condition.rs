//! Condition — a guard evaluated against runtime signals before actions run.

use serde::{Deserialize, Serialize};

/// A predicate that must hold for the automation actions to execute.
///
/// Conditions are evaluated *after* the trigger fires. All conditions in an
/// automation must be satisfied (logical AND), and the first failure
/// short-circuits the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub kind: ConditionKind,
    pub operator: Operator,
    /// Expected value the resolved signal is compared against. Unused for
    /// `exists` / `not_exists`.
    #[serde(default)]
    pub value: serde_json::Value,
}

impl Condition {
    /// Construct a condition.
    #[must_use]
    pub fn new(kind: ConditionKind, operator: Operator, value: serde_json::Value) -> Self {
        Self {
            kind,
            operator,
            value,
        }
    }
}

/// The runtime signal family a condition compares against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionKind {
    /// Mobile vs desktop classification from the user agent.
    Device,
    /// `"new"` vs `"returning"` visitor recency.
    Visitor,
    /// Two-letter lowercased language from the configured locale.
    Language,
    /// Value of a named query-string parameter on the current URL.
    UrlParam { name: String },
    /// Raw referring-document URL string.
    Referrer,
    /// Page views this session (defaults to 1).
    PageViews,
    /// Classified traffic source: direct, organic, social, paid, referral.
    TrafficSource,
    /// Named cookie's value, or presence for `exists` / `not_exists`.
    Cookie { name: String },
}

impl std::fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Device => f.write_str("device"),
            Self::Visitor => f.write_str("visitor"),
            Self::Language => f.write_str("language"),
            Self::UrlParam { name } => write!(f, "url_param({name})"),
            Self::Referrer => f.write_str("referrer"),
            Self::PageViews => f.write_str("page_views"),
            Self::TrafficSource => f.write_str("traffic_source"),
            Self::Cookie { name } => write!(f, "cookie({name})"),
        }
    }
}

/// Comparison operator between the resolved signal and the expected value.
///
/// Wire definitions use several spellings (`gt`, `greater_than`, `>`); all
/// are accepted. Unrecognized operator strings are preserved as
/// [`Operator::Unknown`] so the evaluator can apply its configured fallback
/// instead of failing at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    Exists,
    NotExists,
    Unknown(String),
}

impl Operator {
    /// Parse an operator from its wire spelling. Never fails; unknown
    /// spellings become [`Operator::Unknown`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().replace('-', "_").to_lowercase().as_str() {
            "equals" | "eq" | "==" | "=" => Self::Equals,
            "not_equals" | "neq" | "!=" => Self::NotEquals,
            "contains" => Self::Contains,
            "greater_than" | "gt" | ">" => Self::GreaterThan,
            "less_than" | "lt" | "<" => Self::LessThan,
            "exists" => Self::Exists,
            "not_exists" => Self::NotExists,
            _ => Self::Unknown(raw.to_string()),
        }
    }

    /// Canonical wire spelling.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::Exists => "exists",
            Self::NotExists => "not_exists",
            Self::Unknown(raw) => raw,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Operator {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
