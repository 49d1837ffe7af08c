//! In-memory key store seeded from configuration.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::config::ApiKeyConfig;
use crate::credential::{Credential, CredentialResolver};
use crate::store::StoreError;

/// Concurrent map of key → credential.
#[derive(Clone, Default)]
pub struct MemoryKeyStore {
    inner: Arc<DashMap<String, Credential>>,
}

impl MemoryKeyStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from configured keys.
    pub fn from_config(keys: &[ApiKeyConfig]) -> Self {
        let store = Self::new();
        store.reload(keys);
        store
    }

    /// Insert or replace a credential.
    pub fn insert(&self, credential: Credential) {
        self.inner.insert(credential.key.clone(), credential);
    }

    /// Replace the store contents with `keys`.
    ///
    /// New keys are inserted before stale ones are dropped, so a key present
    /// in both the old and new set never disappears mid-reload.
    pub fn reload(&self, keys: &[ApiKeyConfig]) {
        let mut current = HashSet::with_capacity(keys.len());
        for k in keys {
            current.insert(k.key.clone());
            self.insert(Credential {
                id: k.id.clone(),
                key: k.key.clone(),
                level: k.level,
                ignore_limits: k.ignore_limits,
            });
        }
        self.inner.retain(|key, _| current.contains(key));
        tracing::info!(credentials = self.inner.len(), "Key store loaded");
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl CredentialResolver for MemoryKeyStore {
    async fn resolve(&self, key: &str) -> Result<Option<Credential>, StoreError> {
        Ok(self.inner.get(key).map(|r| r.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: &str, secret: &str, level: u32) -> ApiKeyConfig {
        ApiKeyConfig {
            id: id.into(),
            key: secret.into(),
            level,
            ignore_limits: false,
        }
    }

    #[tokio::test]
    async fn test_resolve_known_and_unknown() {
        let store = MemoryKeyStore::from_config(&[key("k1", "secret-1", 2)]);

        let credential = store.resolve("secret-1").await.unwrap().unwrap();
        assert_eq!(credential.id, "k1");
        assert_eq!(credential.level, 2);

        assert!(store.resolve("nope").await.unwrap().is_none());
        assert!(store.resolve("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reload_replaces_keys() {
        let store = MemoryKeyStore::from_config(&[key("k1", "a", 1), key("k2", "b", 1)]);
        store.reload(&[key("k2", "b", 5), key("k3", "c", 1)]);

        assert_eq!(store.len(), 2);
        assert!(store.resolve("a").await.unwrap().is_none());
        assert_eq!(store.resolve("b").await.unwrap().unwrap().level, 5);
        assert!(store.resolve("c").await.unwrap().is_some());
    }
}
