// File watcher that triggers whole-project rescans

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::indexer::{ScanSummary, SchemaIndexer};

/// Watches a project directory and republishes the index after changes
pub struct FileWatcher {
    indexer: Arc<SchemaIndexer>,
    entry: PathBuf,
    watch_path: PathBuf,
    config: Config,
}

impl FileWatcher {
    /// Create a new file watcher
    pub fn new(
        indexer: Arc<SchemaIndexer>,
        entry: PathBuf,
        watch_path: PathBuf,
        config: Config,
    ) -> Self {
        Self {
            indexer,
            entry,
            watch_path,
            config,
        }
    }

    /// Start watching for file changes
    pub async fn watch(&self) -> Result<()> {
        info!("Starting file watcher for: {}", self.watch_path.display());

        let (tx, mut rx) = mpsc::channel(100);

        // notify calls back on its own thread, outside the runtime
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if let Err(e) = tx.blocking_send(event) {
                        error!("Failed to send file event: {}", e);
                    }
                }
                Err(e) => error!("File watch error: {}", e),
            },
            notify::Config::default(),
        )?;

        watcher
            .watch(&self.watch_path, RecursiveMode::Recursive)
            .with_context(|| format!("Cannot watch {}", self.watch_path.display()))?;

        info!("File watcher started. Monitoring for changes...");

        let quiet = Duration::from_millis(self.config.watch.debounce_ms);
        while let Some(event) = rx.recv().await {
            if !self.is_relevant(&event) {
                continue;
            }
            debug!("Change detected: {:?}", event.paths);

            // Editors often write a file in several steps; wait for quiet.
            while let Ok(Some(_)) = tokio::time::timeout(quiet, rx.recv()).await {}

            if let Err(e) = self.rescan().await {
                warn!("Rescan failed, previous index kept: {:#}", e);
            }
        }

        Ok(())
    }

    /// Whether an event touches a schema or operation file
    fn is_relevant(&self, event: &Event) -> bool {
        matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ) && event
            .paths
            .iter()
            .any(|path| self.config.should_watch_file(&path.to_string_lossy()))
    }

    /// Rebuild the index off the async runtime and publish it
    pub async fn rescan(&self) -> Result<ScanSummary> {
        let indexer = Arc::clone(&self.indexer);
        let entry = self.entry.clone();
        let summary = tokio::task::spawn_blocking(move || indexer.scan(&entry)).await??;
        info!(
            "Rescanned: {} files, {} symbols, {} diagnostics",
            summary.stats.total_files,
            summary.stats.total_symbols,
            summary.diagnostics.len()
        );
        Ok(summary)
    }
}

/// Start the file watcher for a project
pub async fn start_watcher(
    indexer: Arc<SchemaIndexer>,
    entry: PathBuf,
    project: PathBuf,
    config: Config,
) -> Result<()> {
    info!("Initializing file watcher for project: {}", project.display());

    let watcher = FileWatcher::new(indexer, entry, project, config);

    // Run the watcher (this will block)
    watcher.watch().await
}
