//! Request log storage.
//!
//! # Data Flow
//! ```text
//! Allowed request
//!     → guard::RequestLogger builds a LogEntry
//!     → LogStore::append
//!
//! Later request
//!     → guard::WindowCounter builds a LogFilter
//!     → LogStore::count (credential? + route + method + [from, to])
//! ```
//!
//! # Design Decisions
//! - Append-only: entries are never updated or deleted
//! - The store is a trait so deployments can back it with a database;
//!   `MemoryLogStore` is the bundled implementation
//! - Count and append are separate calls, so limits are best-effort under
//!   concurrency (two requests can both pass before either is logged)

pub mod entry;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use entry::{LogEntry, LogFilter};
pub use memory::MemoryLogStore;

/// Errors raised by external stores (log store, key store).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Append-only request log with a count-by-filter query.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Count entries matching `filter`. Must not mutate the store.
    async fn count(&self, filter: &LogFilter) -> Result<u64, StoreError>;

    /// Append one entry.
    async fn append(&self, entry: LogEntry) -> Result<(), StoreError>;
}
