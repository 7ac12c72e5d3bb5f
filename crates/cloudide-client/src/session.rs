//! Session storage shared by every request in flight.
//!
//! # Design
//! - Stores are cheap handles; clones observe the same entries.
//! - Clearing is idempotent so concurrent 401 handlers can race safely.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Key under which the bearer token is stored.
pub const SESSION_TOKEN_KEY: &str = "token";

/// Key/value session storage scoped to the running client.
pub trait SessionStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;
    /// Insert or replace a value.
    fn set(&self, key: &str, value: String);
    /// Remove a single value.
    fn remove(&self, key: &str);
    /// Remove every value.
    fn clear(&self);
    /// Whether the store holds no values.
    fn is_empty(&self) -> bool;
}

/// Current session token, treating empty or blank values as absent.
#[must_use]
pub fn session_token(store: &dyn SessionStore) -> Option<String> {
    store
        .get(SESSION_TOKEN_KEY)
        .filter(|token| !token.trim().is_empty())
}

/// In-process session store.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `token`.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(SESSION_TOKEN_KEY, token.into());
        store
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_entries() {
        let store = MemorySessionStore::new();
        let handle = store.clone();
        handle.set(SESSION_TOKEN_KEY, "abc".into());
        assert_eq!(store.get(SESSION_TOKEN_KEY).as_deref(), Some("abc"));
        assert_eq!(store.len(), 1);

        store.remove(SESSION_TOKEN_KEY);
        assert!(handle.is_empty());
    }

    #[test]
    fn blank_tokens_are_absent() {
        assert_eq!(session_token(&MemorySessionStore::new()), None);
        assert_eq!(session_token(&MemorySessionStore::with_token("")), None);
        assert_eq!(session_token(&MemorySessionStore::with_token("  ")), None);
        assert_eq!(
            session_token(&MemorySessionStore::with_token("T")).as_deref(),
            Some("T")
        );
    }

    #[test]
    fn clear_is_idempotent() {
        let store = MemorySessionStore::with_token("abc");
        store.set("username", "mango".into());
        store.clear();
        store.clear();
        assert!(store.is_empty());
    }
}
