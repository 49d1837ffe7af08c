//! Request logging.
//!
//! Every allowed request is appended to the log store; those entries are
//! what the window counter counts on later requests.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::credential::Credential;
use crate::guard::request::RequestMeta;
use crate::store::{LogEntry, LogStore, StoreError};

/// Writes one [`LogEntry`] per allowed request.
#[derive(Clone)]
pub struct RequestLogger {
    store: Arc<dyn LogStore>,
    enabled: bool,
}

impl RequestLogger {
    pub fn new(store: Arc<dyn LogStore>, enabled: bool) -> Self {
        Self { store, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Append an entry for this request. Returns `Ok(false)` when logging
    /// is switched off.
    pub async fn log(
        &self,
        credential: Option<&Credential>,
        route: &str,
        request: &RequestMeta,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        if !self.enabled {
            return Ok(false);
        }

        let entry = LogEntry {
            credential_id: credential.map(|c| c.id.clone()),
            route: route.to_string(),
            method: request.method.as_str().to_string(),
            params: request.serialized_parameters(),
            ip_address: request.client_address,
            created_at: now,
        };
        self.store.append(entry).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLogStore;
    use axum::http::Method;

    #[tokio::test]
    async fn test_disabled_logger_writes_nothing() {
        let store = MemoryLogStore::new(None);
        let logger = RequestLogger::new(Arc::new(store.clone()), false);
        let meta = RequestMeta::new(Some("r".into()), Method::GET);

        assert!(!logger.log(None, "r", &meta, Utc::now()).await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_entry_fields() {
        let store = MemoryLogStore::new(None);
        let logger = RequestLogger::new(Arc::new(store.clone()), true);
        let credential = Credential {
            id: "k1".into(),
            key: "secret".into(),
            level: 1,
            ignore_limits: false,
        };
        let meta = RequestMeta::new(Some("users.show".into()), Method::PUT)
            .with_client_address("10.0.0.7".parse().unwrap())
            .with_parameters(vec![("id".into(), "42".into())]);
        let now = Utc::now();

        assert!(logger.log(Some(&credential), "users.show", &meta, now).await.unwrap());

        let entries = store.snapshot().await;
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.credential_id.as_deref(), Some("k1"));
        assert_eq!(entry.route, "users.show");
        assert_eq!(entry.method, "PUT");
        assert_eq!(entry.params, "id=42");
        assert_eq!(entry.ip_address, Some("10.0.0.7".parse().unwrap()));
        assert_eq!(entry.created_at, now);
    }
}
