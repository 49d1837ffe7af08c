//! Sliding-window request counting.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::policy::LimitRule;
use crate::store::{LogFilter, LogStore, StoreError};

/// What a window count is scoped to.
///
/// Key-tier counts set `credential_id`; method-tier counts leave it `None`
/// and see every caller.
#[derive(Debug, Clone, Copy)]
pub struct CountScope<'a> {
    pub credential_id: Option<&'a str>,
    pub route: &'a str,
    pub method: &'a str,
}

/// Counts logged requests over a trailing window.
#[derive(Clone)]
pub struct WindowCounter {
    store: Arc<dyn LogStore>,
}

impl WindowCounter {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }

    /// Count entries in `scope` created within `[from, to]`.
    pub async fn count(
        &self,
        scope: CountScope<'_>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let filter = LogFilter {
            credential_id: scope.credential_id.map(String::from),
            route: scope.route.to_string(),
            method: scope.method.to_string(),
            from,
            to,
        };
        self.store.count(&filter).await
    }

    /// Whether `rule` is already used up at `now`.
    ///
    /// Returns the observed count alongside the decision so callers can
    /// log it.
    pub async fn limit_reached(
        &self,
        rule: &LimitRule,
        scope: CountScope<'_>,
        now: DateTime<Utc>,
    ) -> Result<(bool, u64), StoreError> {
        let count = self.count(scope, window_start(now, rule), now).await?;
        Ok((count >= rule.count, count))
    }
}

/// `now - rule.window`, clamped to the earliest representable instant.
pub fn window_start(now: DateTime<Utc>, rule: &LimitRule) -> DateTime<Utc> {
    chrono::Duration::from_std(rule.window)
        .ok()
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
