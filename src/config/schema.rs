//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guard.
//! All types derive Serde traits for deserialization from config files.
//!
//! Method blocks are kept in their raw, loosely-typed shape here. They are
//! validated and turned into [`MethodPolicy`](crate::policy::MethodPolicy)
//! values by the policy subsystem, which degrades bad limits instead of
//! rejecting the whole file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the guard service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Listener configuration (bind address, request timeout).
    pub listener: ListenerConfig,

    /// Process-wide guard settings.
    pub guard: GuardSettings,

    /// Route table used to resolve a route identifier for each request.
    pub routes: Vec<RouteConfig>,

    /// Per-route method blocks, keyed by route name.
    pub methods: BTreeMap<String, MethodConfig>,

    /// Credentials seeded into the bundled key store.
    pub keys: Vec<ApiKeyConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Process-wide guard settings.
///
/// Read once at startup (and on reload) and passed explicitly into policy
/// compilation and the pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GuardSettings {
    /// Whether allowed requests are written to the log store.
    /// Rate limits count logged requests, so limits are inert without it.
    pub logging: bool,

    /// Header name carrying the credential; also used as the query
    /// parameter name when the header is absent.
    pub key_name: String,

    /// Window used by a limit block that does not set `increment`.
    pub default_increment: String,

    /// Optional JSON file the in-memory log store is loaded from and
    /// saved to on shutdown.
    pub log_store_path: Option<String>,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            logging: true,
            key_name: "X-Authorization".to_string(),
            default_increment: "1 hour".to_string(),
            log_store_path: None,
        }
    }
}

/// Route definition mapping a request path to a route identifier.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier; keys into `methods` and the request log.
    pub name: String,

    /// Exact path, or a prefix when it ends with `*`.
    pub path: String,

    /// HTTP methods accepted on this route. Empty accepts any method.
    #[serde(default)]
    pub methods: Vec<String>,

    /// Route priority (higher = checked first).
    #[serde(default)]
    pub priority: u32,
}

/// Raw guard block for a single route.
///
/// Every field is optional; absence picks the permissive default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MethodConfig {
    /// `false` disables credential authentication for the route.
    pub key_authentication: Option<bool>,

    /// Minimum credential level. Zero or absent disables the check.
    pub level: Option<Setting<u32>>,

    /// Rate limits for the key and method tiers.
    pub limits: Option<LimitsConfig>,
}

/// Limit blocks for both tiers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Per-credential limit on this route and HTTP method.
    pub key: Option<LimitConfig>,

    /// Global limit on this route and HTTP method.
    pub method: Option<LimitConfig>,
}

/// One raw limit block. `limit` is signed so negative counts survive
/// parsing and can be reported instead of failing the whole file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitConfig {
    /// Maximum number of requests in the window.
    pub limit: Option<Setting<i64>>,

    /// Window expression such as "1 hour" or "30 minutes".
    pub increment: Option<Setting<String>>,
}

/// A method-block value as written in the file.
///
/// A value of the wrong TOML type lands in `Invalid` instead of failing the
/// load, so policy resolution can disable just the affected rule.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Setting<T> {
    Valid(T),
    Invalid(toml::Value),
}

impl<T> Setting<T> {
    /// The typed value, if the file held one.
    pub fn valid(&self) -> Option<&T> {
        match self {
            Setting::Valid(value) => Some(value),
            Setting::Invalid(_) => None,
        }
    }
}

/// Credential seeded into the in-memory key store.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiKeyConfig {
    /// Stable identifier recorded in the request log.
    pub id: String,

    /// Secret value presented by the client.
    pub key: String,

    /// Authorization level.
    #[serde(default)]
    pub level: u32,

    /// Bypass key-tier rate limits.
    #[serde(default)]
    pub ignore_limits: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

/// Placeholder token shipped in the default config.
pub const ADMIN_PLACEHOLDER_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: ADMIN_PLACEHOLDER_KEY.to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
