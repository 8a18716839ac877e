//! Frequency gate — per-automation eligibility to run again.
//!
//! Session-scoped state lives in memory and dies with the page; the
//! once-per-visitor set and once-per-day timestamps persist through the
//! host's key-value store. Store IO is fallible: a failed read is treated
//! as "no record" and a failed write is logged, never fatal.

use std::collections::HashSet;
use std::sync::Mutex;

use nudge_domain::automation::{Automation, FrequencyPolicy};
use nudge_domain::id::AutomationId;
use nudge_domain::time::{self, Timestamp};

use crate::ports::KeyValueStore;

/// Store key holding the serialized array of executed automation ids.
pub const EXECUTED_SET_KEY: &str = "nudge:executed";

/// Store key holding an automation's last-run timestamp.
#[must_use]
pub fn last_run_key(id: AutomationId) -> String {
    format!("nudge:last_run:{id}")
}

/// Decides whether an automation may execute again.
pub struct FrequencyGate<K> {
    store: K,
    session_set: Mutex<HashSet<AutomationId>>,
}

impl<K: KeyValueStore> FrequencyGate<K> {
    /// Create a gate with an empty session set.
    pub fn new(store: K) -> Self {
        Self {
            store,
            session_set: Mutex::new(HashSet::new()),
        }
    }

    /// Check the automation's frequency policy against recorded state.
    pub async fn is_eligible(&self, automation: &Automation) -> bool {
        let in_session = self
            .session_set
            .lock()
            .expect("session set lock poisoned")
            .contains(&automation.id);

        match automation.frequency {
            FrequencyPolicy::Always => true,
            FrequencyPolicy::OncePerSession => !in_session,
            FrequencyPolicy::OncePerVisitor => {
                !in_session && !self.persisted_set().await.contains(&automation.id)
            }
            FrequencyPolicy::OncePerDay => {
                !in_session
                    && match self.last_run(automation.id).await {
                        Some(last) => time::now() - last >= chrono::Duration::hours(24),
                        None => true,
                    }
            }
        }
    }

    /// Record an execution. Always marks the session set; persists for the
    /// cross-session policies.
    pub async fn mark_executed(&self, automation: &Automation) {
        self.session_set
            .lock()
            .expect("session set lock poisoned")
            .insert(automation.id);

        match automation.frequency {
            FrequencyPolicy::OncePerVisitor => {
                let mut executed = self.persisted_set().await;
                if executed.insert(automation.id) {
                    self.write_persisted_set(&executed).await;
                }
            }
            FrequencyPolicy::OncePerDay => {
                let key = last_run_key(automation.id);
                if let Err(err) = self.store.set(&key, &time::now().to_rfc3339()).await {
                    tracing::warn!(automation_id = %automation.id, error = %err,
                        "failed to persist last-run timestamp");
                }
            }
            FrequencyPolicy::Always | FrequencyPolicy::OncePerSession => {}
        }
    }

    async fn persisted_set(&self) -> HashSet<AutomationId> {
        let raw = match self.store.get(EXECUTED_SET_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return HashSet::new(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read executed set; assuming empty");
                return HashSet::new();
            }
        };
        match serde_json::from_str::<Vec<AutomationId>>(&raw) {
            Ok(ids) => ids.into_iter().collect(),
            Err(err) => {
                tracing::warn!(error = %err, "executed set is corrupt; assuming empty");
                HashSet::new()
            }
        }
    }

    async fn write_persisted_set(&self, executed: &HashSet<AutomationId>) {
        let ids: Vec<AutomationId> = executed.iter().copied().collect();
        let serialized = serde_json::to_string(&ids).expect("id array serializes");
        if let Err(err) = self.store.set(EXECUTED_SET_KEY, &serialized).await {
            tracing::warn!(error = %err, "failed to persist executed set");
        }
    }

    async fn last_run(&self, id: AutomationId) -> Option<Timestamp> {
        let raw = match self.store.get(&last_run_key(id)).await {
            Ok(value) => value?,
            Err(err) => {
                tracing::warn!(automation_id = %id, error = %err,
                    "failed to read last-run timestamp; assuming none");
                return None;
            }
        };
        match chrono::DateTime::parse_from_rfc3339(&raw) {
            Ok(parsed) => Some(parsed.with_timezone(&chrono::Utc)),
            Err(err) => {
                tracing::warn!(automation_id = %id, error = %err,
                    "last-run timestamp is corrupt; assuming none");
                None
            }
        }
    }
}
