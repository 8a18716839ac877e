//! Visitor identity — persisted across sessions through the platform store.

use nudge_domain::id::VisitorId;

use crate::ports::KeyValueStore;

/// Store key holding the persisted visitor id.
pub const VISITOR_KEY: &str = "nudge:visitor_id";

/// Load the visitor id from the store, minting and persisting a fresh one
/// when absent or unreadable. Store failures degrade to a session-scoped
/// id rather than breaking engine start.
pub async fn load_or_create<K: KeyValueStore>(store: &K) -> VisitorId {
    match store.get(VISITOR_KEY).await {
        Ok(Some(raw)) => {
            if let Ok(id) = raw.parse() {
                return id;
            }
            tracing::warn!("persisted visitor id is corrupt; minting a new one");
        }
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(error = %err, "visitor id read failed; minting a session-scoped one");
        }
    }

    let minted = VisitorId::new();
    if let Err(err) = store.set(VISITOR_KEY, &minted.to_string()).await {
        tracing::warn!(error = %err, "failed to persist visitor id");
    }
    minted
}
