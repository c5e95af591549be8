// Query execution over a published index snapshot

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

use crate::index::{IndexSnapshot, OperationEntry, TypeRelationship};
use crate::indexer::hash::document_id;
use crate::indexer::SourceReader;

/// Query result
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub name: String,
    pub container: Option<String>,
    pub file: String,
    pub line: u32,
    pub character: u32,
}

/// Query engine
pub struct QueryEngine {
    snapshot: Arc<IndexSnapshot>,
}

impl QueryEngine {
    pub fn new(snapshot: Arc<IndexSnapshot>) -> Self {
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &IndexSnapshot {
        &self.snapshot
    }

    /// All declarations of an exact symbol name
    pub fn find_definition(&self, name: &str) -> Vec<QueryResult> {
        self.snapshot
            .find_definition(name)
            .unwrap_or_default()
            .iter()
            .map(|loc| QueryResult {
                name: name.to_string(),
                container: loc.container.clone(),
                file: loc.location.file_path.display().to_string(),
                line: loc.location.line,
                character: loc.location.character,
            })
            .collect()
    }

    /// Symbols whose name contains `query`, case-insensitively
    pub fn search_symbols(&self, query: &str, limit: usize) -> Vec<QueryResult> {
        let needle = query.to_lowercase();
        self.snapshot
            .definitions
            .keys()
            .filter(|name| name.to_lowercase().contains(&needle))
            .flat_map(|name| self.find_definition(name))
            .take(limit)
            .collect()
    }

    /// Edges pointing at `type_name`
    pub fn incoming(&self, type_name: &str) -> Vec<&TypeRelationship> {
        self.snapshot
            .type_relationships
            .iter()
            .filter(|r| r.to_type == type_name)
            .collect()
    }

    /// Edges leaving `type_name`
    pub fn outgoing(&self, type_name: &str) -> Vec<&TypeRelationship> {
        self.snapshot
            .type_relationships
            .iter()
            .filter(|r| r.from_type == type_name)
            .collect()
    }

    /// Operations and fragments with the given name across all documents
    pub fn find_operation(&self, name: &str) -> Vec<&OperationEntry> {
        self.snapshot
            .operation_map
            .values()
            .flatten()
            .filter(|op| op.name == name)
            .collect()
    }

    /// Exact source text of one operation
    pub fn operation_text(
        &self,
        entry: &OperationEntry,
        reader: &dyn SourceReader,
    ) -> Result<String> {
        let path = uri_to_path(&entry.file_uri)?;
        let text = reader
            .read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        text.get(entry.range.start..entry.range.end)
            .map(str::to_string)
            .with_context(|| {
                format!(
                    "Range {}..{} is stale for {}",
                    entry.range.start,
                    entry.range.end,
                    path.display()
                )
            })
    }

    /// `document_id -> document text` for every persisted document whose
    /// bytes still match the id computed at scan time
    pub fn persisted_manifest(
        &self,
        reader: &dyn SourceReader,
    ) -> Result<BTreeMap<String, String>> {
        let mut manifest = BTreeMap::new();
        for (id, doc) in &self.snapshot.persisted_doc_map {
            let path = uri_to_path(&doc.file_uri)?;
            let text = reader
                .read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            if document_id(&text) != *id {
                warn!("{} changed since the last scan, leaving it out", path.display());
                continue;
            }
            manifest.insert(id.clone(), text);
        }
        Ok(manifest)
    }

    /// Type graph as a Mermaid flowchart; list edges are labelled `[field]`
    pub fn mermaid(&self) -> String {
        let mut out = String::from("graph LR\n");
        let mut seen = BTreeSet::new();
        for rel in &self.snapshot.type_relationships {
            let label = if rel.is_list {
                format!("[{}]", rel.field_name)
            } else {
                rel.field_name.clone()
            };
            if seen.insert((rel.from_type.as_str(), rel.to_type.as_str(), label.clone())) {
                out.push_str(&format!("  {} -->|{}| {}\n", rel.from_type, label, rel.to_type));
            }
        }
        out
    }
}

fn uri_to_path(uri: &str) -> Result<PathBuf> {
    let url = url::Url::parse(uri).with_context(|| format!("Invalid file URI: {uri}"))?;
    url.to_file_path()
        .map_err(|_| anyhow::anyhow!("Not a file URI: {}", uri))
}
