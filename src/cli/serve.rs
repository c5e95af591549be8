use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use schemagraph::indexer::watcher::start_watcher;
use schemagraph::mcp::McpServer;

use super::Project;

/// Start the MCP server over stdio, optionally rescanning on file changes
pub async fn serve_stdio(project: String, entry: Option<String>, watch: bool) -> Result<()> {
    let project = Project::open(&project, entry.as_deref())?;
    info!("MCP server (stdio) for project: {}", project.dir.display());

    let indexer = Arc::new(project.indexer());
    // A broken project still serves; schema_rescan can retry later
    match indexer.scan(&project.entry) {
        Ok(summary) => info!(
            "Index ready: {} files, {} symbols",
            summary.stats.total_files, summary.stats.total_symbols
        ),
        Err(e) => warn!("Initial scan failed: {}", e),
    }

    if watch {
        let watcher_indexer = Arc::clone(&indexer);
        let entry = project.entry.clone();
        let dir = project.dir.clone();
        let config = project.config.clone();
        tokio::spawn(async move {
            if let Err(e) = start_watcher(watcher_indexer, entry, dir, config).await {
                warn!("File watcher error: {}", e);
            }
        });
        info!("File watching enabled");
    }

    let server = McpServer::new(indexer, project.entry);
    server.run().await
}
