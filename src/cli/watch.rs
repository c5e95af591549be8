use std::sync::Arc;

use anyhow::{Context, Result};

use schemagraph::indexer::watcher::start_watcher;

use super::{print_diagnostics, Project};

/// Scan once, then rescan whenever a schema or operation file changes
pub async fn watch_project(project: String, entry: Option<String>) -> Result<()> {
    let project = Project::open(&project, entry.as_deref())?;
    let indexer = Arc::new(project.indexer());

    let summary = indexer
        .scan(&project.entry)
        .with_context(|| format!("Failed to scan {}", project.entry.display()))?;
    print_diagnostics(&summary.diagnostics);
    println!(
        "✅ Index ready: {} files, {} symbols, {} operations",
        summary.stats.total_files, summary.stats.total_symbols, summary.stats.total_operations
    );
    println!("👀 Watching {} for changes. Press Ctrl+C to stop.", project.dir.display());

    start_watcher(indexer, project.entry, project.dir, project.config).await
}
