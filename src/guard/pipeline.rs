//! The guard pipeline.
//!
//! One call per request, stages in strict order:
//!
//! ```text
//! route resolved? ──no──▶ MethodNotAllowed
//!     │
//! auth required? ──no──────────────┐ (credential dropped)
//!     │                            │
//! credential valid? ──no──▶ Unauthorized
//!     │                            │
//! level ≥ minimum? ──no──▶ Forbidden
//!     │                            │
//!     ▼                            ▼
//! key tier (skipped for ignore_limits / no credential) ──full──▶ LimitExceeded(Key)
//!     │
//! method tier (all callers) ──full──▶ LimitExceeded(Method)
//!     │
//! log request (failure is reported, never denies)
//!     │
//!     ▼
//! Allowed
//! ```
//!
//! Each stage either passes control on or returns; nothing after a denial
//! runs. Counting and logging are separate store calls, so concurrent
//! requests may briefly exceed a limit.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::GuardSettings;
use crate::credential::Credential;
use crate::guard::counter::{CountScope, WindowCounter};
use crate::guard::logger::RequestLogger;
use crate::guard::outcome::{GuardError, GuardOutcome};
use crate::guard::request::RequestMeta;
use crate::guard::stats::GuardStats;
use crate::observability::metrics;
use crate::policy::{LimitTier, MethodPolicy};
use crate::store::LogStore;

/// Authentication, authorization, rate limiting and logging for one request.
#[derive(Clone)]
pub struct GuardPipeline {
    counter: WindowCounter,
    logger: RequestLogger,
    stats: Arc<GuardStats>,
}

impl GuardPipeline {
    /// Build a pipeline over `store` with the process settings.
    pub fn new(store: Arc<dyn LogStore>, settings: &GuardSettings) -> Self {
        Self {
            counter: WindowCounter::new(store.clone()),
            logger: RequestLogger::new(store, settings.logging),
            stats: Arc::new(GuardStats::new()),
        }
    }

    /// Share `stats` with other pipelines (e.g. across config reloads).
    pub fn with_stats(mut self, stats: Arc<GuardStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> &Arc<GuardStats> {
        &self.stats
    }

    pub fn counter(&self) -> &WindowCounter {
        &self.counter
    }

    /// Evaluate a request against `policy` at the current time.
    pub async fn evaluate(
        &self,
        policy: &MethodPolicy,
        credential: Option<&Credential>,
        request: &RequestMeta,
    ) -> Result<GuardOutcome, GuardError> {
        self.evaluate_at(policy, credential, request, Utc::now()).await
    }

    /// Evaluate a request against `policy` as of `now`.
    pub async fn evaluate_at(
        &self,
        policy: &MethodPolicy,
        credential: Option<&Credential>,
        request: &RequestMeta,
        now: DateTime<Utc>,
    ) -> Result<GuardOutcome, GuardError> {
        let route = request.route.as_deref().unwrap_or("none");

        match self.decide(policy, credential, request, now).await {
            Ok(outcome) => {
                self.stats.record(&outcome);
                metrics::record_outcome(outcome.as_str(), route);
                if !outcome.is_allowed() {
                    tracing::debug!(
                        route = %route,
                        method = %request.method,
                        outcome = %outcome,
                        "Request denied"
                    );
                }
                Ok(outcome)
            }
            Err(e) => {
                self.stats.record_unavailable();
                metrics::record_outcome("unavailable", route);
                tracing::error!(route = %route, error = %e, "Guard could not reach its store");
                Err(e)
            }
        }
    }

    async fn decide(
        &self,
        policy: &MethodPolicy,
        credential: Option<&Credential>,
        request: &RequestMeta,
        now: DateTime<Utc>,
    ) -> Result<GuardOutcome, GuardError> {
        let Some(route) = request.route.as_deref() else {
            return Ok(GuardOutcome::MethodNotAllowed);
        };
        let method = request.method.as_str();

        let credential = if policy.requires_authentication {
            let credential = match credential {
                Some(c) if c.is_valid() => c,
                _ => return Ok(GuardOutcome::Unauthorized),
            };

            if let Some(minimum) = policy.minimum_level {
                if credential.level < minimum {
                    return Ok(GuardOutcome::Forbidden);
                }
            }
            Some(credential)
        } else {
            None
        };

        if let (Some(rule), Some(credential)) = (&policy.key_limit, credential) {
            if credential.ignore_limits {
                tracing::debug!(credential_id = %credential.id, route = %route, "Ignoring key limits");
            } else {
                let scope = CountScope {
                    credential_id: Some(credential.id.as_str()),
                    route,
                    method,
                };
                let (reached, count) = self.counter.limit_reached(rule, scope, now).await?;
                if reached {
                    tracing::warn!(
                        credential_id = %credential.id,
                        route = %route,
                        limit = rule.count,
                        count,
                        "API key has reached its limit on this route"
                    );
                    return Ok(GuardOutcome::LimitExceeded(LimitTier::Key));
                }
            }
        }

        if let Some(rule) = &policy.method_limit {
            let scope = CountScope {
                credential_id: None,
                route,
                method,
            };
            let (reached, count) = self.counter.limit_reached(rule, scope, now).await?;
            if reached {
                tracing::warn!(
                    route = %route,
                    limit = rule.count,
                    count,
                    "Route has reached its method limit"
                );
                return Ok(GuardOutcome::LimitExceeded(LimitTier::Method));
            }
        }

        if let Err(e) = self.logger.log(credential, route, request, now).await {
            self.stats.record_log_failure();
            metrics::record_log_failure();
            tracing::warn!(route = %route, error = %e, "Failed to log request");
        }

        Ok(GuardOutcome::Allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::LimitRule;
    use crate::store::{LogEntry, LogFilter, MemoryLogStore, StoreError};
    use async_trait::async_trait;
    use axum::http::Method;
    use std::time::Duration;

    /// Counts fine, refuses every append.
    struct ReadOnlyStore;

    #[async_trait]
    impl LogStore for ReadOnlyStore {
        async fn count(&self, _filter: &LogFilter) -> Result<u64, StoreError> {
            Ok(0)
        }

        async fn append(&self, _entry: LogEntry) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("read-only".into()))
        }
    }

    /// Unreachable for everything.
    struct DownStore;

    #[async_trait]
    impl LogStore for DownStore {
        async fn count(&self, _filter: &LogFilter) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn append(&self, _entry: LogEntry) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    fn credential(level: u32) -> Credential {
        Credential {
            id: "k1".into(),
            key: "secret".into(),
            level,
            ignore_limits: false,
        }
    }

    fn request() -> RequestMeta {
        RequestMeta::new(Some("reports.index".into()), Method::GET)
    }

    fn limited(count: u64) -> MethodPolicy {
        MethodPolicy {
            key_limit: Some(LimitRule {
                count,
                window: Duration::from_secs(3600),
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_missing_route() {
        let pipeline = GuardPipeline::new(Arc::new(MemoryLogStore::new(None)), &GuardSettings::default());
        let meta = RequestMeta::new(None, Method::GET);

        let outcome = pipeline
            .evaluate(&MethodPolicy::default(), Some(&credential(9)), &meta)
            .await
            .unwrap();
        assert_eq!(outcome, GuardOutcome::MethodNotAllowed);
    }

    #[tokio::test]
    async fn test_invalid_credential_is_unauthorized() {
        let pipeline = GuardPipeline::new(Arc::new(MemoryLogStore::new(None)), &GuardSettings::default());
        let mut blank = credential(1);
        blank.id.clear();

        let outcome = pipeline
            .evaluate(&MethodPolicy::default(), Some(&blank), &request())
            .await
            .unwrap();
        assert_eq!(outcome, GuardOutcome::Unauthorized);
    }

    #[tokio::test]
    async fn test_level_equal_to_minimum_passes() {
        let pipeline = GuardPipeline::new(Arc::new(MemoryLogStore::new(None)), &GuardSettings::default());
        let policy = MethodPolicy {
            minimum_level: Some(2),
            ..Default::default()
        };

        let outcome = pipeline.evaluate(&policy, Some(&credential(2)), &request()).await.unwrap();
        assert_eq!(outcome, GuardOutcome::Allowed);
    }

    #[tokio::test]
    async fn test_log_failure_keeps_allowed() {
        let pipeline = GuardPipeline::new(Arc::new(ReadOnlyStore), &GuardSettings::default());

        let outcome = pipeline.evaluate(&limited(5), Some(&credential(1)), &request()).await.unwrap();
        assert_eq!(outcome, GuardOutcome::Allowed);
        assert_eq!(pipeline.stats().snapshot().log_failures, 1);
    }

    #[tokio::test]
    async fn test_count_failure_is_unavailable() {
        let pipeline = GuardPipeline::new(Arc::new(DownStore), &GuardSettings::default());

        let err = pipeline
            .evaluate(&limited(5), Some(&credential(1)), &request())
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::Unavailable(_)));
        assert_eq!(pipeline.stats().snapshot().unavailable, 1);
    }

    #[tokio::test]
    async fn test_denial_does_not_log() {
        let store = MemoryLogStore::new(None);
        let pipeline = GuardPipeline::new(Arc::new(store.clone()), &GuardSettings::default());
        let policy = MethodPolicy {
            minimum_level: Some(5),
            ..Default::default()
        };

        let outcome = pipeline.evaluate(&policy, Some(&credential(1)), &request()).await.unwrap();
        assert_eq!(outcome, GuardOutcome::Forbidden);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_logging_disabled_means_limits_never_fill() {
        let store = MemoryLogStore::new(None);
        let settings = GuardSettings {
            logging: false,
            ..Default::default()
        };
        let pipeline = GuardPipeline::new(Arc::new(store.clone()), &settings);
        let policy = limited(1);

        for _ in 0..3 {
            let outcome = pipeline.evaluate(&policy, Some(&credential(1)), &request()).await.unwrap();
            assert_eq!(outcome, GuardOutcome::Allowed);
        }
        assert!(store.is_empty().await);
    }
}
