use std::collections::BTreeMap;

use anyhow::Result;

use super::{check_format, Project};

pub async fn show_stats(
    project: String,
    entry: Option<String>,
    verbose: bool,
    format: String,
) -> Result<()> {
    check_format(&format, &["text", "json"])?;
    let project = Project::open(&project, entry.as_deref())?;
    let indexer = project.load_index()?;
    let snapshot = indexer.snapshot();
    let stats = snapshot.stats();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("schemagraph Statistics v{}", env!("CARGO_PKG_VERSION"));
    println!("Project: {}", project.config.project.name);
    println!("Entry: {}", project.display_path(&project.entry));

    println!("\n📊 Index Statistics:");
    println!("  Total files: {}", stats.total_files);
    println!("  Total symbols: {}", stats.total_symbols);
    println!("  Types with fields: {}", stats.total_types);
    println!("  Total fields: {}", stats.total_fields);
    println!("  Total relationships: {}", stats.total_relationships);
    println!("  Operations: {}", stats.total_operations);
    println!("  Persisted documents: {}", stats.total_persisted);
    println!("  Diagnostics: {}", stats.total_diagnostics);

    if verbose {
        println!("\n📈 Detailed Statistics:");

        if !snapshot.root_operations.is_empty() {
            println!("  Root operations:");
            for (root, fields) in &snapshot.root_operations {
                println!("    {}: {}", root, fields.len());
            }
        }

        let mut by_kind: BTreeMap<&str, usize> = BTreeMap::new();
        for op in snapshot.operation_map.values().flatten() {
            *by_kind.entry(op.kind.as_str()).or_default() += 1;
        }
        if !by_kind.is_empty() {
            println!("  Operations by kind:");
            for (kind, count) in by_kind {
                println!("    {}: {}", kind, count);
            }
        }

        let mut by_kind: BTreeMap<String, usize> = BTreeMap::new();
        for diagnostic in &snapshot.diagnostics {
            *by_kind.entry(diagnostic.kind.to_string()).or_default() += 1;
        }
        if !by_kind.is_empty() {
            println!("  Diagnostics by kind:");
            for (kind, count) in by_kind {
                println!("    {}: {}", kind, count);
            }
        }
    }

    Ok(())
}
