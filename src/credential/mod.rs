//! Credential subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → extract.rs (header first, query parameter fallback)
//!     → CredentialResolver::resolve (key → Credential?)
//!     → Credential handed to the guard pipeline
//! ```
//!
//! # Design Decisions
//! - Keys are opaque strings matched by equality; no signatures or expiry
//! - Unknown keys resolve to `None`, not an error
//! - Store failures surface as `StoreError` so the caller can answer 503

pub mod extract;
pub mod memory;

use async_trait::async_trait;
use serde::Serialize;

use crate::store::StoreError;

pub use extract::extract_key;
pub use memory::MemoryKeyStore;

/// A resolved API credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credential {
    /// Stable identifier recorded in the request log.
    pub id: String,
    /// The secret value the client presents.
    #[serde(skip_serializing)]
    pub key: String,
    /// Authorization level, compared against a route's minimum.
    pub level: u32,
    /// Skip key-tier rate limits for this credential.
    pub ignore_limits: bool,
}

impl Credential {
    /// A credential is usable only with a non-empty identifier.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Maps a presented key to a stored credential.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// Returns `Ok(None)` for unknown keys.
    async fn resolve(&self, key: &str) -> Result<Option<Credential>, StoreError>;
}
