//! Automation registry — fetch-once holder of the active definitions.
//!
//! The registry loads the automation list at engine start and hands out an
//! immutable snapshot per dispatch cycle. A reload swaps the snapshot
//! atomically, so an in-flight iteration over the old list is never
//! corrupted.

use std::sync::{Arc, RwLock};

use nudge_domain::automation::Automation;
use nudge_domain::error::NudgeError;
use nudge_domain::id::WebsiteId;
use nudge_domain::signal::{EngineSignal, SignalKind};

use crate::ports::{AutomationSource, SignalPublisher};

/// Holds the active automations for the page lifetime.
pub struct AutomationRegistry<S, P> {
    website_id: WebsiteId,
    source: S,
    publisher: P,
    snapshot: RwLock<Arc<Vec<Automation>>>,
}

impl<S, P> AutomationRegistry<S, P>
where
    S: AutomationSource,
    P: SignalPublisher,
{
    /// Create an empty registry; call [`load`](Self::load) to populate it.
    pub fn new(website_id: WebsiteId, source: S, publisher: P) -> Self {
        Self {
            website_id,
            source,
            publisher,
            snapshot: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Fetch the active automations and swap the snapshot.
    ///
    /// Definitions that fail domain validation are skipped with a warning;
    /// the rest still load. On success an `AutomationsLoaded` signal carries
    /// the count. On failure the previous snapshot (initially empty) is
    /// kept and no retry is scheduled — a later `load` call is the only
    /// retry path.
    ///
    /// # Errors
    ///
    /// Propagates the source's fetch error.
    #[tracing::instrument(skip(self), fields(website_id = %self.website_id))]
    pub async fn load(&self) -> Result<usize, NudgeError> {
        let fetched = self.source.fetch_active(self.website_id).await?;

        let mut automations = Vec::with_capacity(fetched.len());
        for automation in fetched {
            match automation.validate() {
                Ok(()) => automations.push(automation),
                Err(err) => {
                    tracing::warn!(automation_id = %automation.id, error = %err,
                        "skipping invalid automation definition");
                }
            }
        }

        let count = automations.len();
        *self.snapshot.write().expect("registry lock poisoned") = Arc::new(automations);

        let _ = self
            .publisher
            .publish(EngineSignal::new(
                SignalKind::AutomationsLoaded,
                None,
                serde_json::json!({ "count": count }),
            ))
            .await;

        tracing::info!(count, "automations loaded");
        Ok(count)
    }

    /// The current snapshot. Callers keep the returned `Arc` for the whole
    /// dispatch cycle; a concurrent reload cannot mutate it.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Automation>> {
        Arc::clone(&self.snapshot.read().expect("registry lock poisoned"))
    }
}
