//! Request inspection helpers.
//!
//! # Responsibilities
//! - Find the client address from connection info
//! - Collect query parameters for the request log
//! - Carry the guard's decision context to protected handlers

use std::net::{IpAddr, SocketAddr};

use axum::{body::Body, extract::ConnectInfo, http::Request};
use serde::Serialize;

/// Attached to allowed requests for downstream handlers.
#[derive(Clone, Debug, Serialize)]
pub struct GuardContext {
    pub route: String,
    pub credential_id: Option<String>,
    pub level: Option<u32>,
}

/// Client IP from connection info, when the server was started with it.
pub fn client_address(req: &Request<Body>) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// Decoded query parameters, minus the credential parameter so keys never
/// reach the request log.
pub fn query_parameters(query: Option<&str>, key_name: &str) -> Vec<(String, String)> {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .filter(|(name, _)| name != key_name)
                .map(|(name, value)| (name.into_owned(), value.into_owned()))
                .collect()
        })
        .unwrap_or_default()
}
