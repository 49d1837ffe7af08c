//! Running outcome counters for the admin API.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::guard::outcome::GuardOutcome;
use crate::policy::LimitTier;

/// Process-lifetime counters, shared across config reloads.
#[derive(Debug, Default)]
pub struct GuardStats {
    allowed: AtomicU64,
    method_not_allowed: AtomicU64,
    unauthorized: AtomicU64,
    forbidden: AtomicU64,
    key_limit_exceeded: AtomicU64,
    method_limit_exceeded: AtomicU64,
    unavailable: AtomicU64,
    log_failures: AtomicU64,
}

/// Point-in-time copy of [`GuardStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub allowed: u64,
    pub method_not_allowed: u64,
    pub unauthorized: u64,
    pub forbidden: u64,
    pub key_limit_exceeded: u64,
    pub method_limit_exceeded: u64,
    pub unavailable: u64,
    pub log_failures: u64,
}

impl GuardStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: &GuardOutcome) {
        let counter = match outcome {
            GuardOutcome::Allowed => &self.allowed,
            GuardOutcome::MethodNotAllowed => &self.method_not_allowed,
            GuardOutcome::Unauthorized => &self.unauthorized,
            GuardOutcome::Forbidden => &self.forbidden,
            GuardOutcome::LimitExceeded(LimitTier::Key) => &self.key_limit_exceeded,
            GuardOutcome::LimitExceeded(LimitTier::Method) => &self.method_limit_exceeded,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unavailable(&self) {
        self.unavailable.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_log_failure(&self) {
        self.log_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            allowed: self.allowed.load(Ordering::Relaxed),
            method_not_allowed: self.method_not_allowed.load(Ordering::Relaxed),
            unauthorized: self.unauthorized.load(Ordering::Relaxed),
            forbidden: self.forbidden.load(Ordering::Relaxed),
            key_limit_exceeded: self.key_limit_exceeded.load(Ordering::Relaxed),
            method_limit_exceeded: self.method_limit_exceeded.load(Ordering::Relaxed),
            unavailable: self.unavailable.load(Ordering::Relaxed),
            log_failures: self.log_failures.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// All denials, excluding `unavailable`.
    pub fn denied(&self) -> u64 {
        self.method_not_allowed
            + self.unauthorized
            + self.forbidden
            + self.key_limit_exceeded
            + self.method_limit_exceeded
    }
}
