//! In-memory storage and cookie jar.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use nudge_app::ports::{CookieStore, KeyValueStore};
use nudge_domain::error::NudgeError;

/// `KeyValueStore` over a `HashMap`. The headless stand-in for the
/// browser's origin-scoped storage.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries, for assertions.
    #[must_use]
    pub fn entries(&self) -> HashMap<String, String> {
        self.entries.lock().expect("store lock poisoned").clone()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, NudgeError>> + Send {
        let value = self
            .entries
            .lock()
            .expect("store lock poisoned")
            .get(key)
            .cloned();
        async { Ok(value) }
    }

    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), NudgeError>> + Send {
        self.entries
            .lock()
            .expect("store lock poisoned")
            .insert(key.to_string(), value.to_string());
        async { Ok(()) }
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), NudgeError>> + Send {
        self.entries.lock().expect("store lock poisoned").remove(key);
        async { Ok(()) }
    }
}

/// `CookieStore` over an in-memory jar. Expiry is accepted and ignored;
/// headless sessions do not outlive the process.
#[derive(Debug, Default)]
pub struct MemoryCookieStore {
    jar: Mutex<HashMap<String, String>>,
}

impl MemoryCookieStore {
    /// Create an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a cookie, for test setup.
    pub fn insert(&self, name: &str, value: &str) {
        self.jar
            .lock()
            .expect("jar lock poisoned")
            .insert(name.to_string(), value.to_string());
    }
}

impl CookieStore for MemoryCookieStore {
    fn get(&self, name: &str) -> impl Future<Output = Result<Option<String>, NudgeError>> + Send {
        let value = self
            .jar
            .lock()
            .expect("jar lock poisoned")
            .get(name)
            .cloned();
        async { Ok(value) }
    }

    fn set(
        &self,
        name: &str,
        value: &str,
        _max_age_days: u32,
    ) -> impl Future<Output = Result<(), NudgeError>> + Send {
        self.insert(name, value);
        async { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_roundtrip_values_through_the_store() {
        let store = MemoryKeyValueStore::new();
        store.set("key", "value").await.unwrap();
        assert_eq!(store.get("key").await.unwrap().as_deref(), Some("value"));

        store.remove("key").await.unwrap();
        assert!(store.get("key").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_overwrite_existing_keys() {
        let store = MemoryKeyValueStore::new();
        store.set("key", "first").await.unwrap();
        store.set("key", "second").await.unwrap();
        assert_eq!(store.get("key").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn should_read_back_cookies() {
        let cookies = MemoryCookieStore::new();
        cookies.set("consent", "yes", 30).await.unwrap();
        assert_eq!(
            cookies.get("consent").await.unwrap().as_deref(),
            Some("yes")
        );
        assert!(cookies.get("missing").await.unwrap().is_none());
    }
}
