use std::cell::Cell;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::{info, warn};

use schemagraph::{CancelFlag, ProgressSink};

use super::{check_format, print_diagnostics, Project};

// Bar positions are tenths of a percent
const BAR_LENGTH: u64 = 1000;

/// Feeds scan progress into an indicatif bar on stderr
struct BarProgress {
    bar: ProgressBar,
    percent: Cell<f64>,
}

impl BarProgress {
    fn new(visible: bool) -> Result<Self> {
        let bar = if visible {
            let bar = ProgressBar::new(BAR_LENGTH);
            bar.set_draw_target(ProgressDrawTarget::stderr());
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg}")?
                    .progress_chars("=>-"),
            );
            bar
        } else {
            ProgressBar::hidden()
        };
        Ok(Self {
            bar,
            percent: Cell::new(0.0),
        })
    }
}

impl ProgressSink for BarProgress {
    fn report(&self, message: &str, increment_percent: f64) {
        let percent = (self.percent.get() + increment_percent).min(100.0);
        self.percent.set(percent);
        self.bar.set_position((percent * 10.0).round() as u64);
        self.bar.set_message(message.to_string());
    }
}

pub async fn scan_project(
    project: String,
    entry: Option<String>,
    format: String,
    progress: bool,
) -> Result<()> {
    check_format(&format, &["text", "json"])?;
    let project = Project::open(&project, entry.as_deref())?;
    let indexer = project.indexer();

    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling scan");
            on_interrupt.cancel();
        }
    });

    let sink = BarProgress::new(progress && format == "text")?;
    let entry = project.entry.clone();
    let (indexer, summary, sink) = tokio::task::spawn_blocking(move || {
        let summary = indexer.scan_with(&entry, &sink, &cancel);
        (indexer, summary, sink)
    })
    .await?;
    sink.bar.finish_and_clear();
    let summary = summary.with_context(|| format!("Failed to scan {}", project.entry.display()))?;
    info!("Scan finished in {:?}", summary.elapsed);

    if format == "json" {
        let output = serde_json::json!({
            "entry": project.entry,
            "files": indexer.snapshot().files,
            "stats": summary.stats,
            "diagnostics": summary.diagnostics,
            "elapsed_ms": summary.elapsed.as_millis(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_diagnostics(&summary.diagnostics);
    println!("schemagraph v{}", env!("CARGO_PKG_VERSION"));
    println!("Project: {}", project.config.project.name);
    println!("Entry: {}", project.display_path(&project.entry));
    println!("\nIndexed {} schema files in {:.2?}:", summary.stats.total_files, summary.elapsed);
    for file in &indexer.snapshot().files {
        println!("  - {}", project.display_path(file));
    }
    println!("\nSymbols: {}", summary.stats.total_symbols);
    println!("Types with fields: {}", summary.stats.total_types);
    println!("Relationships: {}", summary.stats.total_relationships);
    println!("Operations: {}", summary.stats.total_operations);
    println!("Persisted documents: {}", summary.stats.total_persisted);
    if !summary.diagnostics.is_empty() {
        println!("Diagnostics: {}", summary.diagnostics.len());
    }

    Ok(())
}
