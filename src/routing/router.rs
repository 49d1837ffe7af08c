//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up the route name for a request
//! - Return the matched name or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in priority order (acceptable for typical route counts)
//! - Ties keep configuration order

use axum::http::Method;

use crate::config::RouteConfig;
use crate::routing::matcher::{AndMatcher, Matcher, MethodMatcher, PathMatcher};

#[derive(Debug)]
struct CompiledRoute {
    name: String,
    matcher: AndMatcher,
}

/// Ordered set of compiled routes.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    /// Compile routes, highest priority first.
    pub fn from_config(mut configs: Vec<RouteConfig>) -> Self {
        configs.sort_by(|a, b| b.priority.cmp(&a.priority));

        let routes = configs
            .into_iter()
            .map(|config| CompiledRoute {
                matcher: AndMatcher::new(vec![
                    Box::new(PathMatcher::new(&config.path)),
                    Box::new(MethodMatcher::new(&config.methods)),
                ]),
                name: config.name,
            })
            .collect::<Vec<_>>();

        tracing::info!(routes = routes.len(), "Route table compiled");
        Self { routes }
    }

    /// Name of the first route matching `method` and `path`.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<&str> {
        self.routes
            .iter()
            .find(|r| r.matcher.matches(method, path))
            .map(|r| r.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
