//! Pipeline results and errors.

use std::fmt;

use thiserror::Error;

use crate::policy::LimitTier;
use crate::store::StoreError;

/// Terminal decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// The request may proceed.
    Allowed,
    /// No route could be resolved for the request.
    MethodNotAllowed,
    /// Authentication is required but no valid credential was presented.
    Unauthorized,
    /// The credential's level is below the route's minimum.
    Forbidden,
    /// A sliding-window limit was reached.
    LimitExceeded(LimitTier),
}

impl GuardOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardOutcome::Allowed)
    }

    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardOutcome::Allowed => "allowed",
            GuardOutcome::MethodNotAllowed => "method_not_allowed",
            GuardOutcome::Unauthorized => "unauthorized",
            GuardOutcome::Forbidden => "forbidden",
            GuardOutcome::LimitExceeded(LimitTier::Key) => "key_limit_exceeded",
            GuardOutcome::LimitExceeded(LimitTier::Method) => "method_limit_exceeded",
        }
    }
}

impl fmt::Display for GuardOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conditions the pipeline cannot decide on its own.
#[derive(Debug, Error)]
pub enum GuardError {
    /// Key store or log store unreachable while a decision depended on it.
    #[error("guard backend unavailable: {0}")]
    Unavailable(#[from] StoreError),
}
