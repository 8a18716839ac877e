//! Session state — per-page-session runtime facts.
//!
//! Initialized at engine start and torn down at page unload. The visitor id
//! outlives the session (persisted by the host); everything else is scoped
//! to the current page lifetime.

use serde::{Deserialize, Serialize};

use crate::id::{SessionId, VisitorId};
use crate::time::{self, Timestamp};

/// Runtime facts about the current visitor session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: SessionId,
    pub visitor_id: VisitorId,
    pub session_start: Timestamp,
    pub last_activity: Timestamp,
    pub page_view_count: u32,
}

impl SessionState {
    /// Begin a fresh session for the given visitor.
    #[must_use]
    pub fn begin(visitor_id: VisitorId) -> Self {
        let started = time::now();
        Self {
            session_id: SessionId::new(),
            visitor_id,
            session_start: started,
            last_activity: started,
            page_view_count: 0,
        }
    }

    /// Record visitor interaction, refreshing the activity timestamp.
    pub fn record_activity(&mut self) {
        self.last_activity = time::now();
    }

    /// Record a page view. Navigation alone is not interaction, so the
    /// activity timestamp is left untouched and a first-page visitor still
    /// reads as "new".
    pub fn record_page_view(&mut self) {
        self.page_view_count += 1;
    }

    /// A visitor is "new" until any activity lands after session start.
    #[must_use]
    pub fn is_new_visitor(&self) -> bool {
        self.session_start == self.last_activity
    }

    /// Visitor recency as the condition evaluator reads it.
    #[must_use]
    pub fn recency(&self) -> &'static str {
        if self.is_new_visitor() { "new" } else { "returning" }
    }

    /// Page views this session, defaulting to 1 before the first page view
    /// is recorded.
    #[must_use]
    pub fn page_views(&self) -> u32 {
        self.page_view_count.max(1)
    }
}
