//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself, so editors
//! that save by writing a new file and renaming it over the old one still
//! trigger a reload. Events that leave the file contents unchanged are
//! dropped before parsing.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::parse_config;
use crate::config::schema::GuardConfig;

/// Watches one configuration file and publishes each new valid version.
pub struct ConfigWatcher {
    reloader: Reloader,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end for new configurations.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GuardConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let reloader = Reloader {
            path: path.to_path_buf(),
            last_content: fs::read_to_string(path).ok(),
            update_tx,
        };
        (Self { reloader }, update_rx)
    }

    /// Start watching. Updates only flow while the returned watcher lives.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let directory = watch_directory(&self.reloader.path);
        let mut reloader = self.reloader;
        let path = reloader.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if reloader.concerns(&event) => {
                    reloader.reload();
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&directory, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), "Config watcher started");
        Ok(watcher)
    }
}

fn watch_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Loads the file on change and forwards configurations that differ from
/// the last one seen.
struct Reloader {
    path: PathBuf,
    last_content: Option<String>,
    update_tx: mpsc::UnboundedSender<GuardConfig>,
}

impl Reloader {
    fn concerns(&self, event: &Event) -> bool {
        (event.kind.is_modify() || event.kind.is_create())
            && event
                .paths
                .iter()
                .any(|p| p.file_name() == self.path.file_name())
    }

    /// Returns whether a new configuration was published.
    fn reload(&mut self) -> bool {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read config; keeping current configuration");
                return false;
            }
        };
        if self.last_content.as_deref() == Some(content.as_str()) {
            tracing::debug!("Config file touched without changes");
            return false;
        }

        match parse_config(&content) {
            Ok(config) => {
                self.last_content = Some(content);
                tracing::info!(
                    routes = config.routes.len(),
                    keys = config.keys.len(),
                    "Config change detected"
                );
                self.update_tx.send(config).is_ok()
            }
            Err(e) => {
                tracing::error!(error = %e, "Invalid config; keeping current configuration");
                false
            }
        }
    }
}
