//! In-memory log store with optional file persistence.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::observability::metrics;
use crate::store::{LogEntry, LogFilter, LogStore, StoreError};

/// A thread-safe, append-only request log.
///
/// Entries are never evicted and `count` scans every entry, so this store
/// suits development and tests. Long-running deployments should put an
/// indexed backend behind [`LogStore`].
#[derive(Clone, Default)]
pub struct MemoryLogStore {
    entries: Arc<RwLock<Vec<LogEntry>>>,
    persistence_path: Option<String>,
}

impl MemoryLogStore {
    /// Create a new empty store.
    pub fn new(persistence_path: Option<String>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            persistence_path,
        }
    }

    /// Load from file if it exists; otherwise start empty.
    pub fn load_from_file(path: &str) -> Result<Self, StoreError> {
        let mut entries = Vec::new();
        if Path::new(path).exists() {
            let reader = BufReader::new(File::open(path)?);
            entries = serde_json::from_reader(reader)?;
            tracing::info!(entries = entries.len(), path = %path, "Loaded request log");
        }
        metrics::record_log_size(entries.len());

        Ok(Self {
            entries: Arc::new(RwLock::new(entries)),
            persistence_path: Some(path.to_string()),
        })
    }

    /// Save to the persistence file, if one was configured.
    pub async fn save_to_file(&self) -> Result<(), StoreError> {
        if let Some(path) = &self.persistence_path {
            let bytes = {
                let entries = self.entries.read().await;
                serde_json::to_vec(&*entries)?
            };
            tokio::fs::write(path, bytes).await?;
            tracing::info!(path = %path, "Saved request log");
        }
        Ok(())
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Copy of all entries, oldest first.
    pub async fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn count(&self, filter: &LogFilter) -> Result<u64, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().filter(|e| filter.matches(e)).count() as u64)
    }

    async fn append(&self, entry: LogEntry) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        metrics::record_log_size(entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn entry(credential: &str, minutes_ago: i64) -> LogEntry {
        LogEntry {
            credential_id: Some(credential.into()),
            route: "users.index".into(),
            method: "GET".into(),
            params: "page=1".into(),
            ip_address: Some("127.0.0.1".parse().unwrap()),
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn test_append_and_count() {
        let store = MemoryLogStore::new(None);
        store.append(entry("k1", 5)).await.unwrap();
        store.append(entry("k1", 90)).await.unwrap();
        store.append(entry("k2", 5)).await.unwrap();

        let now = Utc::now();
        let mut filter = LogFilter {
            credential_id: Some("k1".into()),
            route: "users.index".into(),
            method: "GET".into(),
            from: now - Duration::hours(1),
            to: now,
        };
        assert_eq!(store.count(&filter).await.unwrap(), 1);

        filter.credential_id = None;
        assert_eq!(store.count(&filter).await.unwrap(), 2);
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        let path = path.to_str().unwrap();

        let store = MemoryLogStore::load_from_file(path).unwrap();
        assert!(store.is_empty().await);
        store.append(entry("k1", 1)).await.unwrap();
        store.save_to_file().await.unwrap();

        let loaded = MemoryLogStore::load_from_file(path).unwrap();
        let entries = loaded.snapshot().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].params, "page=1");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        std::fs::write(&path, "not json").unwrap();

        let err = MemoryLogStore::load_from_file(path.to_str().unwrap()).err().unwrap();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
