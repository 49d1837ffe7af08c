use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::guard::counter::window_start;
use crate::guard::{CountScope, StatsSnapshot};
use crate::http::response::{error_response, unavailable_response};
use crate::http::server::AppState;
use crate::policy::{parse_relative, LimitRule};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub routes: usize,
    pub policies: usize,
    pub credentials: usize,
    pub logging: bool,
    pub log_entries: usize,
}

#[derive(Debug, Deserialize)]
pub struct CountQuery {
    pub route: String,
    #[serde(default = "default_method")]
    pub method: String,
    pub credential_id: Option<String>,
    #[serde(default = "default_window")]
    pub window: String,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_window() -> String {
    "1 hour".to_string()
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub route: String,
    pub method: String,
    pub credential_id: Option<String>,
    pub window_secs: u64,
    pub count: u64,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let inner = state.inner.load_full();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        routes: inner.routes.len(),
        policies: inner.policies.len(),
        credentials: state.key_store.len(),
        logging: inner.config.guard.logging,
        log_entries: state.log_store.len().await,
    })
}

pub async fn get_stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.stats.snapshot())
}

/// Window count for a route, the same query the pipeline runs.
pub async fn get_log_count(
    State(state): State<AppState>,
    Query(query): Query<CountQuery>,
) -> Response {
    let window = match parse_relative(&query.window) {
        Ok(window) => window,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, "GEN-WRONG-ARGS", &e.to_string());
        }
    };

    let method = query.method.to_ascii_uppercase();
    let scope = CountScope {
        credential_id: query.credential_id.as_deref(),
        route: &query.route,
        method: &method,
    };
    let now = Utc::now();
    let from = window_start(now, &LimitRule { count: 1, window });

    let counter = state.inner.load().pipeline.counter().clone();
    match counter.count(scope, from, now).await {
        Ok(count) => Json(CountResponse {
            route: query.route.clone(),
            method,
            credential_id: query.credential_id.clone(),
            window_secs: window.as_secs(),
            count,
        })
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Log count failed");
            unavailable_response()
        }
    }
}
