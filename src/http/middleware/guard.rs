//! Guard middleware.
//! Runs the guard pipeline in front of every protected route.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::credential::extract_key;
use crate::guard::{GuardOutcome, RequestMeta};
use crate::http::request::{client_address, query_parameters, GuardContext};
use crate::http::response::{denial_response, unavailable_response};
use crate::http::server::AppState;
use crate::observability::metrics;

pub async fn guard_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let snapshot = state.inner.load_full();
    let key_name = snapshot.config.guard.key_name.as_str();

    // 1. Resolve route and its policy
    let method = req.method().clone();
    let route = snapshot
        .routes
        .resolve(&method, req.uri().path())
        .map(String::from);
    let policy = route
        .as_deref()
        .map(|r| snapshot.policies.get(r).clone())
        .unwrap_or_default();

    // 2. Resolve the presented credential, only when it will be used
    let credential = if route.is_some() && policy.requires_authentication {
        match extract_key(req.headers(), req.uri().query(), key_name) {
            Some(key) => match state.keys.resolve(&key).await {
                Ok(credential) => credential,
                Err(e) => {
                    tracing::error!(error = %e, "Credential lookup failed");
                    snapshot.pipeline.stats().record_unavailable();
                    metrics::record_outcome("unavailable", route.as_deref().unwrap_or_default());
                    return unavailable_response();
                }
            },
            None => None,
        }
    } else {
        None
    };

    // 3. Evaluate
    let mut meta = RequestMeta::new(route.clone(), method)
        .with_parameters(query_parameters(req.uri().query(), key_name));
    if let Some(addr) = client_address(&req) {
        meta = meta.with_client_address(addr);
    }

    match snapshot.pipeline.evaluate(&policy, credential.as_ref(), &meta).await {
        Ok(GuardOutcome::Allowed) => {
            if let Some(route) = route {
                req.extensions_mut().insert(GuardContext {
                    route,
                    credential_id: credential.as_ref().map(|c| c.id.clone()),
                    level: credential.as_ref().map(|c| c.level),
                });
            }
            next.run(req).await
        }
        Ok(outcome) => denial_response(outcome),
        Err(_) => unavailable_response(),
    }
}
