//! Engine signals — diagnostics emitted for external observers.
//!
//! Signals are broadcast on the in-process bus so collaborators (a
//! diagnostics panel, the host's analytics layer) can observe what the
//! engine is doing. They are fire-and-forget and never affect dispatch.

use serde::{Deserialize, Serialize};

use crate::id::{AutomationId, SignalId};
use crate::time::{self, Timestamp};

/// What an [`EngineSignal`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// The registry finished a load; data carries the count.
    AutomationsLoaded,
    /// An automation's trigger matched and passed its gates.
    TriggerFired,
    /// One action handler settled successfully; data carries the resolved
    /// config.
    ActionPerformed,
    /// One action handler failed; data carries the error text.
    ActionFailed,
    /// An action chain settled; data carries the aggregate counts.
    ExecutionCompleted,
    /// A `track_event` action emitted a named tracking event.
    TrackingEvent,
}

/// One diagnostic occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSignal {
    pub id: SignalId,
    pub kind: SignalKind,
    /// The automation involved, when there is one.
    pub automation_id: Option<AutomationId>,
    pub data: serde_json::Value,
    pub emitted_at: Timestamp,
}

impl EngineSignal {
    /// Create a signal stamped now.
    #[must_use]
    pub fn new(
        kind: SignalKind,
        automation_id: Option<AutomationId>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id: SignalId::new(),
            kind,
            automation_id,
            data,
            emitted_at: time::now(),
        }
    }
}
