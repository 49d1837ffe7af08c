//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the guarded echo handler
//! - Wire up middleware (request ID, tracing, timeout, guard)
//! - Bind server to listener, plus the admin listener when enabled
//! - Apply configuration updates by swapping compiled state
//! - Persist the request log on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    http::Request,
    middleware,
    response::{IntoResponse, Json},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::config::GuardConfig;
use crate::credential::{CredentialResolver, MemoryKeyStore};
use crate::guard::{GuardPipeline, GuardStats};
use crate::http::middleware::guard_middleware;
use crate::http::request::GuardContext;
use crate::policy::PolicyTable;
use crate::routing::RouteTable;
use crate::store::{LogStore, MemoryLogStore, StoreError};

/// Everything compiled from one configuration snapshot.
pub struct GuardState {
    pub config: GuardConfig,
    pub routes: RouteTable,
    pub policies: PolicyTable,
    pub pipeline: GuardPipeline,
}

impl GuardState {
    /// Compile routes and policies and build a pipeline over `store`.
    pub fn compile(config: GuardConfig, store: Arc<dyn LogStore>, stats: Arc<GuardStats>) -> Self {
        let routes = RouteTable::from_config(config.routes.clone());
        let policies = PolicyTable::compile(&config);
        let pipeline = GuardPipeline::new(store, &config.guard).with_stats(stats);
        Self {
            config,
            routes,
            policies,
            pipeline,
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<GuardState>>,
    pub keys: Arc<dyn CredentialResolver>,
    pub key_store: MemoryKeyStore,
    pub log_store: MemoryLogStore,
    pub stats: Arc<GuardStats>,
}

impl AppState {
    /// Build state with the bundled in-memory stores.
    pub fn new(config: GuardConfig) -> Result<Self, StoreError> {
        let log_store = match &config.guard.log_store_path {
            Some(path) => MemoryLogStore::load_from_file(path)?,
            None => MemoryLogStore::new(None),
        };
        let key_store = MemoryKeyStore::from_config(&config.keys);
        let stats = Arc::new(GuardStats::new());
        let state = GuardState::compile(config, Arc::new(log_store.clone()), stats.clone());

        Ok(Self {
            inner: Arc::new(ArcSwap::from_pointee(state)),
            keys: Arc::new(key_store.clone()),
            key_store,
            log_store,
            stats,
        })
    }

    /// Recompile from `config` and swap it in. In-flight requests finish
    /// on the snapshot they started with.
    pub fn apply_config(&self, config: GuardConfig) {
        self.key_store.reload(&config.keys);
        let state = GuardState::compile(config, Arc::new(self.log_store.clone()), self.stats.clone());
        self.inner.store(Arc::new(state));
        tracing::info!("Configuration applied");
    }
}

/// HTTP server for the guard.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GuardConfig) -> Result<Self, StoreError> {
        let state = AppState::new(config)?;
        Ok(Self::with_state(state))
    }

    /// Create a server over prebuilt state.
    pub fn with_state(state: AppState) -> Self {
        let timeout_secs = state.inner.load().config.listener.request_timeout_secs;
        let router = Self::build_router(timeout_secs, state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(timeout_secs: u64, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(protected_handler))
            .route("/", any(protected_handler))
            .layer(middleware::from_fn_with_state(state.clone(), guard_middleware))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(timeout_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The guarded router, for embedding or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GuardConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        // Config reloads
        let reload_state = self.state.clone();
        let mut reload_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => match update {
                        Some(config) => reload_state.apply_config(config),
                        None => break,
                    },
                    _ = reload_shutdown.recv() => break,
                }
            }
        });

        // Admin API
        let admin = self.state.inner.load().config.admin.clone();
        if admin.enabled {
            let admin_listener = TcpListener::bind(&admin.bind_address).await?;
            tracing::info!(address = %admin_listener.local_addr()?, "Admin API listening");
            let admin_router = setup_admin_router(self.state.clone());
            let mut admin_shutdown = shutdown.resubscribe();
            tokio::spawn(async move {
                let result = axum::serve(admin_listener, admin_router)
                    .with_graceful_shutdown(async move {
                        let _ = admin_shutdown.recv().await;
                    })
                    .await;
                if let Err(e) = result {
                    tracing::error!(error = %e, "Admin API stopped with error");
                }
            });
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        // Serve with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        if let Err(e) = self.state.log_store.save_to_file().await {
            tracing::error!(error = %e, "Failed to persist request log");
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Echo handler behind the guard.
async fn protected_handler(req: Request<Body>) -> impl IntoResponse {
    match req.extensions().get::<GuardContext>() {
        Some(context) => Json(serde_json::json!({
            "status": "ok",
            "route": context.route,
            "credential_id": context.credential_id,
            "level": context.level,
        })),
        None => Json(serde_json::json!({ "status": "ok" })),
    }
}
