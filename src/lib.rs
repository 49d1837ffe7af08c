//! API guard library.
//!
//! Authentication, level-based authorization and two-tier sliding-window
//! rate limiting for an HTTP API, backed by a request log.

pub mod admin;
pub mod config;
pub mod credential;
pub mod guard;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod policy;
pub mod routing;
pub mod store;

pub use config::schema::GuardConfig;
pub use guard::{GuardOutcome, GuardPipeline};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
