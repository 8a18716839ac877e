//! Frequency policy — how often an automation may re-execute for the same
//! browser profile.
//!
//! Policies are monotonic: nothing un-executes. Frequency state only resets
//! externally — storage cleared, a new day boundary, or a new page session.

use serde::{Deserialize, Serialize};

/// Eligibility rule applied before an automation runs again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyPolicy {
    /// No cap; every matching event runs the automation.
    #[default]
    Always,
    /// At most once ever for this browser profile (persisted).
    #[serde(alias = "once")]
    OncePerVisitor,
    /// At most once per page session (in-memory).
    OncePerSession,
    /// At most once per rolling 24 hours (persisted timestamp).
    OncePerDay,
}

impl std::fmt::Display for FrequencyPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Always => "always",
            Self::OncePerVisitor => "once_per_visitor",
            Self::OncePerSession => "once_per_session",
            Self::OncePerDay => "once_per_day",
        };
        f.write_str(name)
    }
}
