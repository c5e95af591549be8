// CLI command implementations

pub mod query;
pub mod scan;
pub mod serve;
pub mod stats;
pub mod watch;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use schemagraph::index::ScanDiagnostic;
use schemagraph::{Config, SchemaIndexer};

/// A project directory with its configuration and resolved entry file
pub struct Project {
    pub dir: PathBuf,
    pub config: Config,
    pub entry: PathBuf,
}

impl Project {
    /// Load `.schemagraph.toml` and locate the entry schema.
    ///
    /// `entry` overrides the configured entry and is taken relative to the
    /// project directory.
    pub fn open(project: &str, entry: Option<&str>) -> Result<Self> {
        let dir = std::fs::canonicalize(project)
            .with_context(|| format!("Project directory {} not found", project))?;
        let config = Config::from_project_dir(&dir);

        let entry = match entry {
            Some(entry) => dir.join(entry),
            None => config.resolve_entry(&dir).with_context(|| {
                format!("No {} found under {}", config.project.entry, dir.display())
            })?,
        };
        info!("Project {} with entry {}", dir.display(), entry.display());

        Ok(Self { dir, config, entry })
    }

    /// Indexer configured from the project's `[scan]` section
    pub fn indexer(&self) -> SchemaIndexer {
        SchemaIndexer::from_fs().with_options(self.config.scan_options())
    }

    /// Scan once without progress output
    pub fn load_index(&self) -> Result<SchemaIndexer> {
        let indexer = self.indexer();
        let summary = indexer
            .scan(&self.entry)
            .with_context(|| format!("Failed to scan {}", self.entry.display()))?;
        print_diagnostics(&summary.diagnostics);
        Ok(indexer)
    }

    /// Path relative to the project directory when it lies inside it
    pub fn display_path<'a>(&self, path: &'a Path) -> std::borrow::Cow<'a, str> {
        path.strip_prefix(&self.dir)
            .unwrap_or(path)
            .to_string_lossy()
    }
}

/// Diagnostics go to stderr so JSON on stdout stays parseable
pub fn print_diagnostics(diagnostics: &[ScanDiagnostic]) {
    for diagnostic in diagnostics {
        eprintln!(
            "warning: {} ({}): {}",
            diagnostic.path.display(),
            diagnostic.kind,
            diagnostic.message
        );
    }
}

pub fn check_format(format: &str, allowed: &[&str]) -> Result<()> {
    if allowed.contains(&format) {
        Ok(())
    } else {
        anyhow::bail!("Unknown format: {} (expected one of {})", format, allowed.join(", "))
    }
}
