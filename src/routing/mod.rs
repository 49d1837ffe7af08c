//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: route name or None
//!
//! Route Compilation (at startup and reload):
//!     RouteConfig[]
//!     → Sort by priority
//!     → Compile matchers
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (exact or prefix matching only)
//! - Deterministic: same input always matches same route
//! - No match is explicit; the guard answers it with 405

pub mod matcher;
pub mod router;

pub use router::RouteTable;
