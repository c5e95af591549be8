// MCP tool handlers

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use serde_json::{json, Value};

use crate::indexer::SchemaIndexer;
use crate::query::engine::QueryEngine;

fn text_content(text: String) -> Value {
    json!({
        "content": [{
            "type": "text",
            "text": text
        }]
    })
}

fn json_content(value: &Value) -> Result<Value> {
    Ok(text_content(serde_json::to_string_pretty(value)?))
}

fn required_str<'a>(args: &'a HashMap<String, Value>, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("Missing {}", key))
}

/// Definition lookup tool handler
pub async fn definition(indexer: &SchemaIndexer, args: &HashMap<String, Value>) -> Result<Value> {
    let name = required_str(args, "name")?;
    let engine = QueryEngine::new(indexer.snapshot());
    let results = engine.find_definition(name);

    if results.is_empty() {
        return Ok(text_content(format!("No definition found for '{}'", name)));
    }
    json_content(&serde_json::to_value(results)?)
}

/// Operation listing tool handler
pub async fn operations(indexer: &SchemaIndexer, args: &HashMap<String, Value>) -> Result<Value> {
    let engine = QueryEngine::new(indexer.snapshot());

    if let Some(name) = args.get("name").and_then(|v| v.as_str()) {
        let matches = engine.find_operation(name);
        let mut found = Vec::new();
        for op in matches {
            let text = engine.operation_text(op, indexer.reader()).ok();
            found.push(json!({ "operation": op, "text": text }));
        }
        return json_content(&Value::Array(found));
    }

    json_content(&serde_json::to_value(&engine.snapshot().operation_map)?)
}

/// Persisted documents tool handler
pub async fn persisted(indexer: &SchemaIndexer, args: &HashMap<String, Value>) -> Result<Value> {
    let engine = QueryEngine::new(indexer.snapshot());
    let manifest = args
        .get("manifest")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    if manifest {
        let documents = engine.persisted_manifest(indexer.reader())?;
        return json_content(&serde_json::to_value(documents)?);
    }
    json_content(&serde_json::to_value(&engine.snapshot().persisted_doc_map)?)
}

/// Type graph tool handler
pub async fn type_graph(indexer: &SchemaIndexer, args: &HashMap<String, Value>) -> Result<Value> {
    let engine = QueryEngine::new(indexer.snapshot());
    let format = args.get("format").and_then(|v| v.as_str()).unwrap_or("json");

    if let Some(type_name) = args.get("type").and_then(|v| v.as_str()) {
        return json_content(&json!({
            "type": type_name,
            "fields": engine.snapshot().fields_of(type_name),
            "directives": engine.snapshot().type_directives.get(type_name),
            "incoming": engine.incoming(type_name),
            "outgoing": engine.outgoing(type_name),
        }));
    }

    match format {
        "mermaid" => Ok(text_content(engine.mermaid())),
        "json" => json_content(&serde_json::to_value(&engine.snapshot().type_relationships)?),
        other => Err(anyhow::anyhow!("Unknown format: {}", other)),
    }
}

/// Rescan tool handler; scans on a blocking thread
pub async fn rescan(indexer: &Arc<SchemaIndexer>, entry: &Path) -> Result<Value> {
    let scanner = Arc::clone(indexer);
    let entry = entry.to_path_buf();
    let summary = tokio::task::spawn_blocking(move || scanner.scan(&entry)).await??;
    let mut lines = vec![format!(
        "Rescanned {} files: {} symbols, {} operations, {} persisted documents",
        summary.stats.total_files,
        summary.stats.total_symbols,
        summary.stats.total_operations,
        summary.stats.total_persisted
    )];
    for diagnostic in &summary.diagnostics {
        lines.push(format!(
            "  {} ({}): {}",
            diagnostic.path.display(),
            diagnostic.kind,
            diagnostic.message
        ));
    }
    Ok(text_content(lines.join("\n")))
}

/// Stats tool handler
pub async fn stats(indexer: &SchemaIndexer, _args: &HashMap<String, Value>) -> Result<Value> {
    let stats = indexer.snapshot().stats();

    Ok(text_content(format!(
        "Index Statistics:\n- Files: {}\n- Symbols: {}\n- Types: {}\n- Fields: {}\n- Relationships: {}\n- Operations: {}\n- Persisted documents: {}\n- Diagnostics: {}",
        stats.total_files,
        stats.total_symbols,
        stats.total_types,
        stats.total_fields,
        stats.total_relationships,
        stats.total_operations,
        stats.total_persisted,
        stats.total_diagnostics
    )))
}
