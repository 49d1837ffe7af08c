//! Method policy resolution.
//!
//! Turns a raw [`MethodConfig`] block into a validated [`MethodPolicy`].
//! Every field degrades independently: a malformed limit disables that tier
//! and emits a warning, it never fails the route or the request.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::config::schema::{GuardConfig, GuardSettings, LimitConfig, MethodConfig, Setting};
use crate::observability::metrics;
use crate::policy::duration::parse_relative;

/// Scope a rate limit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitTier {
    /// Per credential, per route and HTTP method.
    Key,
    /// Per route and HTTP method, across all callers.
    Method,
}

impl LimitTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitTier::Key => "key",
            LimitTier::Method => "method",
        }
    }
}

impl fmt::Display for LimitTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated sliding-window limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitRule {
    /// Requests allowed in the window; the next one is denied.
    pub count: u64,
    /// Look-back length of the window. Never zero.
    pub window: Duration,
}

/// Resolved guard configuration for one route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodPolicy {
    pub requires_authentication: bool,
    pub minimum_level: Option<u32>,
    pub key_limit: Option<LimitRule>,
    pub method_limit: Option<LimitRule>,
}

impl Default for MethodPolicy {
    fn default() -> Self {
        Self {
            requires_authentication: true,
            minimum_level: None,
            key_limit: None,
            method_limit: None,
        }
    }
}

impl MethodPolicy {
    /// Resolve the raw block configured for `route`.
    pub fn resolve(route: &str, raw: &MethodConfig, settings: &GuardSettings) -> Self {
        let limits = raw.limits.as_ref();
        let key_limit = resolve_limit(
            route,
            LimitTier::Key,
            limits.and_then(|l| l.key.as_ref()),
            settings,
        );
        let method_limit = resolve_limit(
            route,
            LimitTier::Method,
            limits.and_then(|l| l.method.as_ref()),
            settings,
        );

        if !settings.logging && (key_limit.is_some() || method_limit.is_some()) {
            tracing::warn!(
                route = %route,
                "Route defines a limit but request logging is disabled; the limit can never trigger"
            );
            metrics::record_policy_warning("logging_disabled");
        }

        Self {
            requires_authentication: raw.key_authentication.unwrap_or(true),
            minimum_level: resolve_level(route, raw.level.as_ref()),
            key_limit,
            method_limit,
        }
    }

    /// Whether any rate limit tier is active.
    pub fn has_limits(&self) -> bool {
        self.key_limit.is_some() || self.method_limit.is_some()
    }
}

/// A level of the wrong type disables the gate, like an absent one.
fn resolve_level(route: &str, raw: Option<&Setting<u32>>) -> Option<u32> {
    match raw? {
        Setting::Valid(level) => Some(*level).filter(|level| *level > 0),
        Setting::Invalid(value) => {
            tracing::warn!(
                route = %route,
                minimum_level = %value,
                "Method level is not a non-negative integer; level check disabled"
            );
            metrics::record_policy_warning("invalid_level");
            None
        }
    }
}

fn resolve_limit(
    route: &str,
    tier: LimitTier,
    raw: Option<&LimitConfig>,
    settings: &GuardSettings,
) -> Option<LimitRule> {
    let raw = raw?;

    let count = match raw.limit.as_ref().and_then(Setting::valid) {
        Some(&limit) if limit > 0 => limit as u64,
        _ => {
            tracing::warn!(
                route = %route,
                tier = %tier,
                limit = ?raw.limit,
                "Limit block has no valid positive limit; tier disabled"
            );
            metrics::record_policy_warning("invalid_limit");
            return None;
        }
    };

    let expression = match &raw.increment {
        Some(Setting::Valid(increment)) if !increment.trim().is_empty() => increment.as_str(),
        Some(Setting::Invalid(value)) => {
            tracing::warn!(
                route = %route,
                tier = %tier,
                increment = %value,
                "Limit window is not a string; tier disabled"
            );
            metrics::record_policy_warning("invalid_window");
            return None;
        }
        _ => settings.default_increment.as_str(),
    };

    let window = match parse_relative(expression) {
        Ok(window) if !window.is_zero() => window,
        Ok(_) => {
            tracing::warn!(
                route = %route,
                tier = %tier,
                increment = %expression,
                "Limit window is zero; tier disabled"
            );
            metrics::record_policy_warning("zero_window");
            return None;
        }
        Err(e) => {
            tracing::warn!(
                route = %route,
                tier = %tier,
                increment = %expression,
                error = %e,
                "Invalid limit window; tier disabled"
            );
            metrics::record_policy_warning("invalid_window");
            return None;
        }
    };

    Some(LimitRule { count, window })
}

/// All route policies, compiled once per configuration load.
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    policies: HashMap<String, MethodPolicy>,
    fallback: MethodPolicy,
}

impl PolicyTable {
    /// Compile every method block in the configuration.
    pub fn compile(config: &GuardConfig) -> Self {
        let mut policies = HashMap::with_capacity(config.methods.len());
        for (route, raw) in &config.methods {
            if !config.routes.iter().any(|r| &r.name == route) {
                tracing::debug!(route = %route, "Method block does not match any configured route");
            }
            policies.insert(route.clone(), MethodPolicy::resolve(route, raw, &config.guard));
        }

        tracing::info!(policies = policies.len(), "Method policies compiled");
        Self {
            policies,
            fallback: MethodPolicy::default(),
        }
    }

    /// Policy for `route`; routes without a method block get the default.
    pub fn get(&self, route: &str) -> &MethodPolicy {
        self.policies.get(route).unwrap_or(&self.fallback)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LimitsConfig;

    fn limit(limit: Option<i64>, increment: Option<&str>) -> LimitConfig {
        LimitConfig {
            limit: limit.map(Setting::Valid),
            increment: increment.map(|i| Setting::Valid(i.to_string())),
        }
    }

    fn with_limits(key: Option<LimitConfig>, method: Option<LimitConfig>) -> MethodConfig {
        MethodConfig {
            limits: Some(LimitsConfig { key, method }),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_block_is_default() {
        let policy = MethodPolicy::resolve("r", &MethodConfig::default(), &GuardSettings::default());
        assert_eq!(policy, MethodPolicy::default());
        assert!(policy.requires_authentication);
        assert!(!policy.has_limits());
    }

    #[test]
    fn test_level_and_authentication() {
        let raw = MethodConfig {
            key_authentication: Some(false),
            level: Some(Setting::Valid(3)),
            limits: None,
        };
        let policy = MethodPolicy::resolve("r", &raw, &GuardSettings::default());
        assert!(!policy.requires_authentication);
        assert_eq!(policy.minimum_level, Some(3));

        let zero = MethodConfig {
            level: Some(Setting::Valid(0)),
            ..Default::default()
        };
        let policy = MethodPolicy::resolve("r", &zero, &GuardSettings::default());
        assert_eq!(policy.minimum_level, None);

        let negative = MethodConfig {
            level: Some(Setting::Invalid(toml::Value::Integer(-1))),
            ..Default::default()
        };
        let policy = MethodPolicy::resolve("r", &negative, &GuardSettings::default());
        assert_eq!(policy.minimum_level, None);
        assert!(policy.requires_authentication);
    }

    #[test]
    fn test_wrongly_typed_limits_disable_their_tier() {
        let raw = with_limits(
            Some(LimitConfig {
                limit: Some(Setting::Invalid(toml::Value::String("10".into()))),
                increment: None,
            }),
            Some(LimitConfig {
                limit: Some(Setting::Valid(5)),
                increment: Some(Setting::Invalid(toml::Value::Integer(30))),
            }),
        );
        let policy = MethodPolicy::resolve("r", &raw, &GuardSettings::default());
        assert!(!policy.has_limits());
    }

    #[test]
    fn test_limits_resolved() {
        let raw = with_limits(
            Some(limit(Some(3), Some("1 hour"))),
            Some(limit(Some(100), Some("30 minutes"))),
        );
        let policy = MethodPolicy::resolve("r", &raw, &GuardSettings::default());
        assert_eq!(
            policy.key_limit,
            Some(LimitRule {
                count: 3,
                window: Duration::from_secs(3600)
            })
        );
        assert_eq!(
            policy.method_limit,
            Some(LimitRule {
                count: 100,
                window: Duration::from_secs(1800)
            })
        );
    }

    #[test]
    fn test_missing_increment_uses_default() {
        let settings = GuardSettings {
            default_increment: "2 days".into(),
            ..Default::default()
        };
        let raw = with_limits(Some(limit(Some(5), None)), None);
        let policy = MethodPolicy::resolve("r", &raw, &settings);
        assert_eq!(policy.key_limit.unwrap().window, Duration::from_secs(2 * 86_400));
    }

    #[test]
    fn test_bad_limits_disable_only_their_tier() {
        let raw = with_limits(Some(limit(Some(0), None)), Some(limit(Some(10), None)));
        let policy = MethodPolicy::resolve("r", &raw, &GuardSettings::default());
        assert_eq!(policy.key_limit, None);
        assert_eq!(policy.method_limit.unwrap().count, 10);

        let raw = with_limits(Some(limit(Some(-4), None)), Some(limit(None, None)));
        let policy = MethodPolicy::resolve("r", &raw, &GuardSettings::default());
        assert!(!policy.has_limits());
    }

    #[test]
    fn test_bad_windows_disable_tier() {
        let raw = with_limits(
            Some(limit(Some(3), Some("soon"))),
            Some(limit(Some(3), Some("0 hours"))),
        );
        let policy = MethodPolicy::resolve("r", &raw, &GuardSettings::default());
        assert!(!policy.has_limits());

        let settings = GuardSettings {
            default_increment: "whenever".into(),
            ..Default::default()
        };
        let raw = with_limits(Some(limit(Some(3), None)), None);
        assert_eq!(MethodPolicy::resolve("r", &raw, &settings).key_limit, None);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let raw = with_limits(
            Some(limit(Some(3), Some("1 hour"))),
            Some(limit(Some(0), Some("1 hour"))),
        );
        let settings = GuardSettings::default();
        assert_eq!(
            MethodPolicy::resolve("r", &raw, &settings),
            MethodPolicy::resolve("r", &raw, &settings)
        );
    }

    #[test]
    fn test_policy_table_fallback() {
        let mut config = GuardConfig::default();
        config.methods.insert(
            "open".into(),
            MethodConfig {
                key_authentication: Some(false),
                ..Default::default()
            },
        );
        let table = PolicyTable::compile(&config);
        assert_eq!(table.len(), 1);
        assert!(!table.get("open").requires_authentication);
        assert_eq!(table.get("unknown"), &MethodPolicy::default());
    }
}
