//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use api_guard::config::{ApiKeyConfig, GuardConfig, GuardSettings, RouteConfig};
use api_guard::credential::Credential;
use api_guard::guard::GuardPipeline;
use api_guard::store::MemoryLogStore;
use api_guard::{HttpServer, Shutdown};
use metrics::{
    Counter, CounterFn, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
};
use tokio::sync::mpsc;

pub fn credential(id: &str, level: u32) -> Credential {
    Credential {
        id: id.into(),
        key: format!("{id}-secret"),
        level,
        ignore_limits: false,
    }
}

pub fn api_key(id: &str, level: u32, ignore_limits: bool) -> ApiKeyConfig {
    ApiKeyConfig {
        id: id.into(),
        key: format!("{id}-secret"),
        level,
        ignore_limits,
    }
}

pub fn route(name: &str, path: &str, methods: &[&str]) -> RouteConfig {
    RouteConfig {
        name: name.into(),
        path: path.into(),
        methods: methods.iter().map(|m| m.to_string()).collect(),
        priority: 0,
    }
}

/// A pipeline over a fresh in-memory store; the store handle is returned
/// for inspection.
pub fn pipeline() -> (GuardPipeline, MemoryLogStore) {
    let store = MemoryLogStore::new(None);
    let pipeline = GuardPipeline::new(Arc::new(store.clone()), &GuardSettings::default());
    (pipeline, store)
}

/// Running server handle; dropping it does not stop the server, call
/// `stop`.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_tx: mpsc::UnboundedSender<GuardConfig>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

/// Boot the guard on an ephemeral port.
pub async fn start_server(config: GuardConfig) -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_tx, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(200)).await;

    TestServer {
        addr,
        shutdown,
        config_tx,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Metrics recorder that keeps counter totals in memory, for use with
/// `metrics::with_local_recorder`.
#[derive(Clone, Default)]
pub struct CountingRecorder {
    counters: Arc<Mutex<HashMap<Key, u64>>>,
}

struct RecordedCounter {
    key: Key,
    counters: Arc<Mutex<HashMap<Key, u64>>>,
}

impl CounterFn for RecordedCounter {
    fn increment(&self, value: u64) {
        *self.counters.lock().unwrap().entry(self.key.clone()).or_default() += value;
    }

    fn absolute(&self, value: u64) {
        self.counters.lock().unwrap().insert(self.key.clone(), value);
    }
}

impl CountingRecorder {
    /// Total for counter `name` carrying the label `label = value`.
    pub fn counter(&self, name: &str, label: &str, value: &str) -> u64 {
        self.counters
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| key.name() == name)
            .filter(|(key, _)| key.labels().any(|l| l.key() == label && l.value() == value))
            .map(|(_, total)| *total)
            .sum()
    }
}

impl Recorder for CountingRecorder {
    fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
    fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
    fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
        Counter::from_arc(Arc::new(RecordedCounter {
            key: key.clone(),
            counters: self.counters.clone(),
        }))
    }

    fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
        Gauge::noop()
    }

    fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}
