//! Execution records — the durable outcome of one automation run.

use serde::{Deserialize, Serialize};

use crate::id::{AutomationId, SessionId, VisitorId, WebsiteId};
use crate::time::Timestamp;

/// Aggregate outcome of an automation's action chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Every action handler settled successfully.
    Success,
    /// At least one action handler failed; the rest still ran.
    PartialFailure,
}

impl ExecutionStatus {
    /// Derive the aggregate status from the failure tally.
    #[must_use]
    pub fn from_failures(failure_count: u32) -> Self {
        if failure_count == 0 {
            Self::Success
        } else {
            Self::PartialFailure
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::PartialFailure => f.write_str("partial_failure"),
        }
    }
}

/// One completed automation run, queued for delivery to the collection
/// service. A record leaves the pending buffer only once a batch containing
/// it has been acknowledged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub automation_id: AutomationId,
    pub website_id: WebsiteId,
    pub visitor_id: VisitorId,
    pub session_id: SessionId,
    pub status: ExecutionStatus,
    pub success_count: u32,
    pub failure_count: u32,
    /// Payload of the behavior event that caused the trigger.
    pub execution_data: serde_json::Value,
    pub executed_at: Timestamp,
}
