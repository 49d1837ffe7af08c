//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GuardConfig (validated, immutable)
//!     → policy::PolicyTable + routing::RouteTable compiled from it
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server recompiles routes/policies and swaps them atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Limit blocks are not validated here: a bad limit disables that tier
//!   at policy compilation time instead of rejecting the file

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::AdminConfig;
pub use schema::ApiKeyConfig;
pub use schema::GuardConfig;
pub use schema::GuardSettings;
pub use schema::LimitConfig;
pub use schema::LimitsConfig;
pub use schema::ListenerConfig;
pub use schema::MethodConfig;
pub use schema::ObservabilityConfig;
pub use schema::RouteConfig;
pub use schema::Setting;
