//! Guard subsystem.
//!
//! # Data Flow
//! ```text
//! MethodPolicy + Credential? + RequestMeta
//!     → pipeline.rs (auth → level → key tier → method tier → log)
//!         → counter.rs (LogStore::count over [now - window, now])
//!         → logger.rs  (LogStore::append on Allowed)
//!     → GuardOutcome | GuardError::Unavailable
//! ```
//!
//! # Design Decisions
//! - Strict short-circuit: a denial ends evaluation immediately
//! - Stateless between calls; all state lives in the external stores
//! - Logging is observability, not gating: append failures never deny
//! - `ignore_limits` bypasses the key tier only; the method tier is a
//!   ceiling for every caller

pub mod counter;
pub mod logger;
pub mod outcome;
pub mod pipeline;
pub mod request;
pub mod stats;

pub use counter::{CountScope, WindowCounter};
pub use logger::RequestLogger;
pub use outcome::{GuardError, GuardOutcome};
pub use pipeline::GuardPipeline;
pub use request::RequestMeta;
pub use stats::{GuardStats, StatsSnapshot};
