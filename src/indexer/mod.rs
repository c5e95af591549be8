// Schema project crawling and index building

pub mod definitions;
pub mod executables;
pub mod hash;
pub mod model;
pub mod parser;
pub mod types;
pub mod watcher;

use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{IndexError, Result};
use crate::index::{
    DiagnosticKind, IndexBuilder, IndexSnapshot, IndexStats, IndexStore, ScanDiagnostic,
};

/// File access used by a scan
pub trait SourceReader: Send + Sync {
    fn read_to_string(&self, path: &Path) -> std::io::Result<String>;
    fn exists(&self, path: &Path) -> bool;
}

/// Reads straight from the local file system
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl SourceReader for FsReader {
    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// In-memory file set, e.g. unsaved editor buffers or fixtures
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    files: HashMap<PathBuf, String>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(normalize_path(&path.into()), text.into());
    }

    pub fn remove(&mut self, path: &Path) {
        self.files.remove(&normalize_path(path));
    }
}

impl SourceReader for MemoryReader {
    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        self.files.get(&normalize_path(path)).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not loaded", path.display()),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(&normalize_path(path))
    }
}

/// Receives `(message, increment_percent)` ticks while a scan runs
pub trait ProgressSink {
    fn report(&self, message: &str, increment_percent: f64);
}

/// Progress sink that drops every tick
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _message: &str, _increment_percent: f64) {}
}

/// Cooperative cancellation, checked between files
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Stop crawling after this many schema files
    pub max_files: Option<usize>,
    /// Process `@sdl(executables: [...])` declarations
    pub follow_executables: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_files: None,
            follow_executables: true,
        }
    }
}

/// Outcome of a published scan
#[derive(Debug, Clone)]
pub struct ScanSummary {
    pub stats: IndexStats,
    pub diagnostics: Vec<ScanDiagnostic>,
    pub elapsed: Duration,
}

// Share of the progress bar given to crawling; the rest covers executables.
const CRAWL_PERCENT: f64 = 90.0;

/// Builds index snapshots for a schema project and publishes them to a store
pub struct SchemaIndexer<R: SourceReader = FsReader> {
    reader: R,
    store: Arc<IndexStore>,
    options: ScanOptions,
}

impl SchemaIndexer<FsReader> {
    pub fn from_fs() -> Self {
        Self::new(FsReader)
    }
}

impl<R: SourceReader> SchemaIndexer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            store: Arc::new(IndexStore::new()),
            options: ScanOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_store(mut self, store: Arc<IndexStore>) -> Self {
        self.store = store;
        self
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.store.snapshot()
    }

    pub fn clear_state(&self) {
        self.store.clear_state();
    }

    /// Rebuild the whole index from `entry` and publish it
    pub fn scan(&self, entry: &Path) -> Result<ScanSummary> {
        self.scan_with(entry, &NoProgress, &CancelFlag::new())
    }

    /// Like [`scan`](Self::scan), reporting progress and honouring `cancel`.
    ///
    /// On error nothing is published and readers keep the previous snapshot.
    pub fn scan_with(
        &self,
        entry: &Path,
        progress: &dyn ProgressSink,
        cancel: &CancelFlag,
    ) -> Result<ScanSummary> {
        let started = Instant::now();
        let snapshot = match self.build_snapshot(entry, progress, cancel) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Scan of {} failed, keeping previous index: {}", entry.display(), e);
                return Err(e);
            }
        };

        let summary = ScanSummary {
            stats: snapshot.stats(),
            diagnostics: snapshot.diagnostics.clone(),
            elapsed: started.elapsed(),
        };
        self.store.publish(snapshot);

        info!(
            "Indexed {} files: {} symbols, {} operations, {} persisted documents in {:?}",
            summary.stats.total_files,
            summary.stats.total_symbols,
            summary.stats.total_operations,
            summary.stats.total_persisted,
            summary.elapsed
        );
        Ok(summary)
    }

    /// Crawl the include graph from `entry` into a fresh snapshot without publishing it
    pub fn build_snapshot(
        &self,
        entry: &Path,
        progress: &dyn ProgressSink,
        cancel: &CancelFlag,
    ) -> Result<IndexSnapshot> {
        let entry = normalize_path(entry);
        if !self.reader.exists(&entry) {
            return Err(IndexError::EntryNotFound(entry));
        }
        info!("Scanning schema project from {}", entry.display());

        let mut builder = IndexBuilder::new();
        builder.set_entry(entry.clone());

        let mut stack = vec![entry.clone()];
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut assembled = String::new();
        let mut reported = 0.0;

        while let Some(path) = stack.pop() {
            if cancel.is_cancelled() {
                info!("Scan cancelled after {} files", visited.len());
                return Err(IndexError::Cancelled);
            }
            if visited.contains(&path) {
                continue;
            }
            if let Some(max) = self.options.max_files {
                if visited.len() >= max {
                    record(
                        &mut builder,
                        diagnostic(
                            &path,
                            DiagnosticKind::Resolution,
                            format!("file limit of {max} reached, include not crawled"),
                        ),
                    );
                    break;
                }
            }
            visited.insert(path.clone());

            // The file count is unknown up front, so each file takes half of what is left.
            let increment = (CRAWL_PERCENT - reported) / 2.0;
            reported += increment;
            progress.report(&format!("Indexing {}", path.display()), increment);

            let text = match self.reader.read_to_string(&path) {
                Ok(text) => text,
                Err(e) if path == entry => return Err(IndexError::io(path, e)),
                Err(e) => {
                    record(&mut builder, diagnostic(&path, DiagnosticKind::Io, e.to_string()));
                    continue;
                }
            };
            builder.add_file(path.clone());

            let includes = self.index_file(&path, &text, &mut builder, &mut assembled);

            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            for include in includes {
                let resolved = normalize_path(&dir.join(&include));
                if visited.contains(&resolved) {
                    continue;
                }
                if !self.reader.exists(&resolved) {
                    record(
                        &mut builder,
                        diagnostic(
                            &resolved,
                            DiagnosticKind::NotFound,
                            format!("included from {} but does not exist", path.display()),
                        ),
                    );
                    continue;
                }
                stack.push(resolved);
            }
        }

        if self.options.follow_executables {
            let project_root = entry.parent().map(Path::to_path_buf).unwrap_or_default();
            executables::scan_executables(&assembled, &project_root, &self.reader, &mut builder);
        }
        progress.report("Index ready", 100.0 - reported);

        Ok(builder.build())
    }

    /// Project one schema file and return the paths it includes.
    ///
    /// A file with syntax errors is reported and left out of the indices; its
    /// includes are still recovered from the raw text.
    fn index_file(
        &self,
        path: &Path,
        text: &str,
        builder: &mut IndexBuilder,
        assembled: &mut String,
    ) -> Vec<String> {
        let parsed = parser::parse(text);
        if parsed.has_errors() {
            record(builder, diagnostic(path, DiagnosticKind::Parse, parsed.errors.join("; ")));
            return parser::inclusion_paths_from_text(text);
        }

        debug!("Indexing {}", path.display());
        definitions::index_definitions(&parsed, path, builder);
        model::build_schema_model(&parsed, path, builder);

        assembled.push_str(text);
        assembled.push('\n');
        parser::inclusion_paths(&parsed.document)
    }
}

fn diagnostic(path: &Path, kind: DiagnosticKind, message: String) -> ScanDiagnostic {
    ScanDiagnostic {
        path: path.to_path_buf(),
        kind,
        message,
    }
}

fn record(builder: &mut IndexBuilder, diagnostic: ScanDiagnostic) {
    warn!("{} ({}): {}", diagnostic.path.display(), diagnostic.kind, diagnostic.message);
    builder.add_diagnostic(diagnostic);
}

/// Lexically resolve `.` and `..` so one file always maps to one key
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn project() -> MemoryReader {
        MemoryReader::new()
            .with_file(
                "/p/index.graphql",
                r#"schema @sdl(files: ["a.graphql", "sub/b.graphql"]) { query: Query }"#,
            )
            .with_file(
                "/p/a.graphql",
                r#"type Query @sdl(files: ["sub/b.graphql"]) { a: A }
type A { id: ID! }"#,
            )
            .with_file(
                "/p/sub/b.graphql",
                r#"extend type Query @sdl(files: ["../a.graphql"]) { b: B }
type B { a: A }"#,
            )
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(String, f64)>>);

    impl ProgressSink for Recorder {
        fn report(&self, message: &str, increment_percent: f64) {
            self.0.lock().push((message.to_string(), increment_percent));
        }
    }

    #[test]
    fn test_cycle_indexes_each_file_once() {
        let indexer = SchemaIndexer::new(project());
        indexer.scan(Path::new("/p/index.graphql")).unwrap();
        let snapshot = indexer.snapshot();

        assert_eq!(snapshot.files.len(), 3);
        assert_eq!(snapshot.find_definition("A").unwrap().len(), 1);
        assert_eq!(snapshot.find_definition("B").unwrap().len(), 1);
        assert_eq!(snapshot.fields_of("Query").len(), 2);
        assert!(snapshot.diagnostics.is_empty());
    }

    #[test]
    fn test_lifo_order() {
        let indexer = SchemaIndexer::new(project());
        indexer.scan(Path::new("/p/index.graphql")).unwrap();
        let files = indexer.snapshot().files.clone();
        assert_eq!(
            files,
            vec![
                PathBuf::from("/p/index.graphql"),
                PathBuf::from("/p/sub/b.graphql"),
                PathBuf::from("/p/a.graphql"),
            ]
        );
    }

    #[test]
    fn test_rescan_is_idempotent() {
        let indexer = SchemaIndexer::new(project());
        indexer.scan(Path::new("/p/index.graphql")).unwrap();
        let first = indexer.snapshot();
        indexer.scan(Path::new("/p/index.graphql")).unwrap();
        let second = indexer.snapshot();

        assert_eq!(*first, *second);
    }

    #[test]
    fn test_missing_entry_keeps_previous_index() {
        let indexer = SchemaIndexer::new(project());
        indexer.scan(Path::new("/p/index.graphql")).unwrap();

        let err = indexer.scan(Path::new("/p/nope.graphql")).unwrap_err();
        assert!(matches!(err, IndexError::EntryNotFound(_)));
        assert!(indexer.snapshot().find_definition("A").is_some());
    }

    #[test]
    fn test_unresolved_include_is_reported() {
        let reader = MemoryReader::new().with_file(
            "/p/index.graphql",
            r#"schema @sdl(files: ["gone.graphql"]) { query: Query } type Query { x: Int }"#,
        );
        let indexer = SchemaIndexer::new(reader);
        let summary = indexer.scan(Path::new("/p/index.graphql")).unwrap();

        assert_eq!(summary.diagnostics.len(), 1);
        assert_eq!(summary.diagnostics[0].kind, DiagnosticKind::NotFound);
        assert!(indexer.snapshot().find_definition("x").is_some());
    }

    #[test]
    fn test_broken_include_is_skipped_but_crawled() {
        let reader = project().with_file(
            "/p/a.graphql",
            r#"type Query @sdl(files: ["sub/b.graphql"]) { a: }"#,
        );
        let indexer = SchemaIndexer::new(reader);
        let summary = indexer.scan(Path::new("/p/index.graphql")).unwrap();

        assert!(summary.diagnostics.iter().any(|d| d.kind == DiagnosticKind::Parse));
        let snapshot = indexer.snapshot();
        assert!(snapshot.find_definition("a").is_none());
        assert!(snapshot.find_definition("B").is_some());
        assert_eq!(snapshot.files.len(), 3);
    }

    #[test]
    fn test_cancelled_scan_publishes_nothing() {
        let indexer = SchemaIndexer::new(project());
        let cancel = CancelFlag::new();
        cancel.cancel();

        let err = indexer
            .scan_with(Path::new("/p/index.graphql"), &NoProgress, &cancel)
            .unwrap_err();
        assert!(matches!(err, IndexError::Cancelled));
        assert!(indexer.snapshot().is_empty());
    }

    #[test]
    fn test_max_files_limit() {
        let indexer = SchemaIndexer::new(project()).with_options(ScanOptions {
            max_files: Some(1),
            follow_executables: true,
        });
        let summary = indexer.scan(Path::new("/p/index.graphql")).unwrap();

        assert_eq!(summary.stats.total_files, 1);
        assert_eq!(summary.diagnostics.len(), 1);
    }

    #[test]
    fn test_progress_sums_to_hundred() {
        let indexer = SchemaIndexer::new(project());
        let recorder = Recorder::default();
        indexer
            .scan_with(Path::new("/p/index.graphql"), &recorder, &CancelFlag::new())
            .unwrap();

        let ticks = recorder.0.lock();
        assert_eq!(ticks.len(), 4);
        let total: f64 = ticks.iter().map(|(_, pct)| pct).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("/p/sub/../a.graphql")), PathBuf::from("/p/a.graphql"));
        assert_eq!(normalize_path(Path::new("/p/./b.graphql")), PathBuf::from("/p/b.graphql"));
        assert_eq!(normalize_path(Path::new("../x.graphql")), PathBuf::from("../x.graphql"));
    }
}
