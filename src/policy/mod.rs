//! Policy subsystem.
//!
//! # Data Flow
//! ```text
//! GuardConfig.methods (raw, optional everywhere)
//!     → duration.rs (parse "1 hour" style windows)
//!     → method.rs (resolve each block into a MethodPolicy)
//!     → PolicyTable (route name → MethodPolicy, immutable)
//!     → handed to the guard pipeline per request
//! ```
//!
//! # Design Decisions
//! - Validation happens once, at compile time, never per request
//! - Misconfiguration degrades to "no limit" with a warning, never "deny all"
//! - Process settings are passed in explicitly, not read globally

pub mod duration;
pub mod method;

pub use duration::{parse_relative, DurationError};
pub use method::{LimitRule, LimitTier, MethodPolicy, PolicyTable};
