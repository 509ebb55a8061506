//! Configuration hot-reload watcher.
//!
//! ## Responsibility
//! Watch the router's TOML config file for changes. Each validated reload
//! publishes a fresh performance table to the running router and is
//! broadcast to subscribers. Invalid reloads are logged and rejected; the
//! current table remains in place.
//!
//! ## Guarantees
//! - Only validated configs reach the router or subscribers
//! - Routing calls in flight keep the snapshot they started with
//! - File watching is debounced to avoid rapid re-reads on multi-write editors
//!
//! ## NOT Responsible For
//! - Swapping the catalog (catalog edits are logged and need a restart)
//! - Initial config loading (that belongs to `loader`)

use std::path::PathBuf;
use std::sync::mpsc::TryRecvError;
use std::sync::Arc;
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, Mutex};

use super::loader::load_from_file;
use super::validation::ConfigError;
use super::ServiceConfig;
use crate::routing::{Catalog, PerformanceFeed};

/// Watches a config file and refreshes the router's performance table.
///
/// # Panics
///
/// This type never panics.
pub struct ConfigWatcher {
    tx: broadcast::Sender<ServiceConfig>,
    // Dropping this stops file watching.
    _watcher: Arc<Mutex<RecommendedWatcher>>,
}

impl ConfigWatcher {
    /// Start watching `path`.
    ///
    /// `feed` receives the performance table of every valid reload.
    /// `catalog` is the catalog the router was built with; reloads that
    /// change it are accepted for telemetry only and logged. The initial
    /// config is **not** broadcast.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file watcher cannot be created.
    ///
    /// # Panics
    ///
    /// This function never panics.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let config = load_from_file(&path)?;
    /// let (router, feed) = config.build_router();
    /// let (_watcher, _rx) = ConfigWatcher::new(path, feed, router.catalog().clone())?;
    /// ```
    pub fn new(
        path: PathBuf,
        feed: PerformanceFeed,
        catalog: Catalog,
    ) -> Result<(Self, broadcast::Receiver<ServiceConfig>), ConfigError> {
        let (tx, rx) = broadcast::channel(8);
        let tx_clone = tx.clone();
        let watch_path = path.clone();

        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = notify_tx.send(event);
                }
            },
            notify::Config::default(),
        )
        .map_err(|e| ConfigError::Io {
            file: path.display().to_string(),
            source: std::io::Error::other(e.to_string()),
        })?;

        // Watch the parent directory so atomic saves (write temp, rename
        // over original) are still seen.
        let watch_dir = watch_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .map_err(|e| ConfigError::Io {
                file: watch_dir.display().to_string(),
                source: std::io::Error::other(e.to_string()),
            })?;

        let watcher = Arc::new(Mutex::new(watcher));

        let config_path = watch_path;
        tokio::spawn(async move {
            let debounce = Duration::from_millis(500);
            let mut last_reload = std::time::Instant::now()
                .checked_sub(debounce)
                .unwrap_or_else(std::time::Instant::now);

            loop {
                tokio::time::sleep(Duration::from_millis(100)).await;

                let mut should_reload = false;
                loop {
                    match notify_rx.try_recv() {
                        Ok(event) => {
                            if let EventKind::Modify(_) | EventKind::Create(_) = event.kind {
                                if event
                                    .paths
                                    .iter()
                                    .any(|p| p.file_name() == config_path.file_name())
                                {
                                    should_reload = true;
                                }
                            }
                        }
                        Err(TryRecvError::Empty) => break,
                        // The file watcher was dropped along with its ConfigWatcher.
                        Err(TryRecvError::Disconnected) => {
                            tracing::debug!(path = %config_path.display(), "config watch stopped");
                            return;
                        }
                    }
                }

                if !should_reload || last_reload.elapsed() < debounce {
                    continue;
                }
                last_reload = std::time::Instant::now();

                match load_from_file(&config_path) {
                    Ok(new_config) => {
                        if new_config.catalog() != catalog {
                            tracing::warn!(
                                path = %config_path.display(),
                                "catalog changed on disk; restart to apply it"
                            );
                        }
                        let table = new_config.performance_table();
                        tracing::info!(
                            path = %config_path.display(),
                            samples = table.len(),
                            "performance table reloaded"
                        );
                        feed.publish(table);
                        let _ = tx_clone.send(new_config);
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %config_path.display(),
                            error = %e,
                            "config reload rejected, keeping current table"
                        );
                    }
                }
            }
        });

        Ok((
            Self {
                tx,
                _watcher: watcher,
            },
            rx,
        ))
    }

    /// Subscribe to config change notifications.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn subscribe(&self) -> broadcast::Receiver<ServiceConfig> {
        self.tx.subscribe()
    }
}
