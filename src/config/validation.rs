//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Detect duplicate route names and credentials
//! - Reject settings that would make the service unusable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GuardConfig → Result<(), Vec<ValidationError>>
//! - Limit blocks are out of scope here; policy compilation degrades them

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::{GuardConfig, ADMIN_PLACEHOLDER_KEY};

/// A single semantic problem in a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("guard.key_name must not be empty")]
    EmptyKeyName,

    #[error("route #{index} has an empty name")]
    EmptyRouteName { index: usize },

    #[error("route '{name}' has an empty path")]
    EmptyRoutePath { name: String },

    #[error("route '{name}' is defined more than once")]
    DuplicateRoute { name: String },

    #[error("route '{name}' lists invalid HTTP method '{method}'")]
    InvalidHttpMethod { name: String, method: String },

    #[error("credential id '{id}' is defined more than once")]
    DuplicateCredentialId { id: String },

    #[error("credential '{id}' shares its key with another credential")]
    DuplicateCredentialKey { id: String },

    #[error("credential #{index} has an empty id or key")]
    EmptyCredential { index: usize },

    #[error("admin API is enabled with the placeholder token")]
    PlaceholderAdminKey,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.guard.key_name.trim().is_empty() {
        errors.push(ValidationError::EmptyKeyName);
    }

    let mut route_names = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        if route.name.trim().is_empty() {
            errors.push(ValidationError::EmptyRouteName { index });
            continue;
        }
        if route.path.trim().is_empty() {
            errors.push(ValidationError::EmptyRoutePath {
                name: route.name.clone(),
            });
        }
        if !route_names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute {
                name: route.name.clone(),
            });
        }
        for method in &route.methods {
            if method.parse::<axum::http::Method>().is_err() {
                errors.push(ValidationError::InvalidHttpMethod {
                    name: route.name.clone(),
                    method: method.clone(),
                });
            }
        }
    }

    let mut ids = HashSet::new();
    let mut keys = HashSet::new();
    for (index, key) in config.keys.iter().enumerate() {
        if key.id.is_empty() || key.key.is_empty() {
            errors.push(ValidationError::EmptyCredential { index });
            continue;
        }
        if !ids.insert(key.id.as_str()) {
            errors.push(ValidationError::DuplicateCredentialId { id: key.id.clone() });
        }
        if !keys.insert(key.key.as_str()) {
            errors.push(ValidationError::DuplicateCredentialKey { id: key.id.clone() });
        }
    }

    if config.admin.enabled && config.admin.api_key == ADMIN_PLACEHOLDER_KEY {
        errors.push(ValidationError::PlaceholderAdminKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
