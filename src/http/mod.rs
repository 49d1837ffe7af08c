//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout layers)
//!     → middleware/guard.rs
//!         → routing::RouteTable (route name)
//!         → credential::extract_key + CredentialResolver
//!         → guard::GuardPipeline
//!     → response.rs (denials → status + JSON error body)
//!     → protected handler (only on Allowed)
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::GuardContext;
pub use server::{AppState, GuardState, HttpServer};
