//! Log entry and count filter types.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One logged request. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Credential used, if the request was authenticated.
    pub credential_id: Option<String>,
    /// Route identifier.
    pub route: String,
    /// HTTP method (e.g., "GET").
    pub method: String,
    /// Request parameters, form-urlencoded.
    pub params: String,
    /// Client address, when the transport knows it.
    pub ip_address: Option<IpAddr>,
    pub created_at: DateTime<Utc>,
}

/// Selects log entries for a window count.
///
/// Both time bounds are inclusive. `credential_id = None` matches every
/// entry regardless of credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub credential_id: Option<String>,
    pub route: String,
    pub method: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl LogFilter {
    /// Returns true if `entry` falls inside this filter.
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(id) = &self.credential_id {
            if entry.credential_id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }

        entry.route == self.route
            && entry.method == self.method
            && entry.created_at >= self.from
            && entry.created_at <= self.to
    }
}
