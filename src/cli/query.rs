use anyhow::Result;

use schemagraph::query::QueryEngine;
use schemagraph::SchemaIndexer;

use super::{check_format, Project};

fn engine_for(
    project: &str,
    entry: Option<&str>,
) -> Result<(Project, SchemaIndexer, QueryEngine)> {
    let project = Project::open(project, entry)?;
    let indexer = project.load_index()?;
    let engine = QueryEngine::new(indexer.snapshot());
    Ok((project, indexer, engine))
}

pub async fn definition(
    name: String,
    search: bool,
    project: String,
    entry: Option<String>,
    format: String,
) -> Result<()> {
    check_format(&format, &["text", "json"])?;
    let (project, _indexer, engine) = engine_for(&project, entry.as_deref())?;

    let results = if search {
        engine.search_symbols(&name, 50)
    } else {
        engine.find_definition(&name)
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No definition found for '{}'", name);
        return Ok(());
    }
    println!("Found {} results:", results.len());
    for result in results {
        let file = std::path::Path::new(&result.file);
        match &result.container {
            Some(container) => println!(
                "  {}:{}:{} - {}.{}",
                project.display_path(file),
                result.line + 1,
                result.character + 1,
                container,
                result.name
            ),
            None => println!(
                "  {}:{}:{} - {}",
                project.display_path(file),
                result.line + 1,
                result.character + 1,
                result.name
            ),
        }
    }
    Ok(())
}

pub async fn operations(
    name: Option<String>,
    project: String,
    entry: Option<String>,
    format: String,
) -> Result<()> {
    check_format(&format, &["text", "json"])?;
    let (_project, indexer, engine) = engine_for(&project, entry.as_deref())?;

    if let Some(name) = name {
        let matches = engine.find_operation(&name);
        if matches.is_empty() {
            println!("No operation named '{}'", name);
            return Ok(());
        }
        for op in matches {
            let text = engine.operation_text(op, indexer.reader())?;
            if format == "json" {
                let output = serde_json::json!({ "operation": op, "text": text });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("# {} {} ({})", op.kind, op.name, op.file_uri);
                println!("{}", text);
            }
        }
        return Ok(());
    }

    let operation_map = &engine.snapshot().operation_map;
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(operation_map)?);
        return Ok(());
    }
    if operation_map.is_empty() {
        println!("No executable documents indexed");
    }
    for (uri, ops) in operation_map {
        println!("{}", uri);
        for op in ops {
            let persisted = if op.persisted { " [persisted]" } else { "" };
            println!(
                "  {} {} ({}..{}){}",
                op.kind, op.name, op.range.start, op.range.end, persisted
            );
        }
    }
    Ok(())
}

pub async fn persisted(
    manifest: bool,
    project: String,
    entry: Option<String>,
    format: String,
) -> Result<()> {
    check_format(&format, &["text", "json"])?;
    let (_project, indexer, engine) = engine_for(&project, entry.as_deref())?;

    if manifest {
        // A manifest is only useful as JSON
        let documents = engine.persisted_manifest(indexer.reader())?;
        println!("{}", serde_json::to_string_pretty(&documents)?);
        return Ok(());
    }

    let persisted = &engine.snapshot().persisted_doc_map;
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(persisted)?);
        return Ok(());
    }
    if persisted.is_empty() {
        println!("No persisted documents");
    }
    for (id, doc) in persisted {
        println!("{}", id);
        println!("  {}", doc.file_uri);
        for op in &doc.operations {
            println!("  - {} {}", op.kind, op.name);
        }
    }
    Ok(())
}

pub async fn fields(
    type_name: Option<String>,
    project: String,
    entry: Option<String>,
    format: String,
) -> Result<()> {
    check_format(&format, &["text", "json"])?;
    let (_project, _indexer, engine) = engine_for(&project, entry.as_deref())?;
    let snapshot = engine.snapshot();

    if format == "json" {
        match &type_name {
            Some(name) => println!("{}", serde_json::to_string_pretty(snapshot.fields_of(name))?),
            None => println!("{}", serde_json::to_string_pretty(&snapshot.field_index)?),
        }
        return Ok(());
    }

    let types: Vec<&String> = match &type_name {
        Some(name) if !snapshot.field_index.contains_key(name) => {
            println!("No fields indexed for type '{}'", name);
            return Ok(());
        }
        Some(name) => vec![name],
        None => snapshot.field_index.keys().collect(),
    };

    for name in types {
        let directives = snapshot
            .type_directives
            .get(name)
            .map(|ds| ds.iter().map(|d| format!(" @{}", d.name)).collect::<String>())
            .unwrap_or_default();
        println!("type {}{}", name, directives);
        for field in snapshot.fields_of(name) {
            let args = if field.args.is_empty() {
                String::new()
            } else {
                let rendered: Vec<String> = field
                    .args
                    .iter()
                    .map(|a| format!("{}: {}", a.name, a.type_))
                    .collect();
                format!("({})", rendered.join(", "))
            };
            let type_ = if field.is_list {
                format!("[{}]", field.type_)
            } else {
                field.type_.clone()
            };
            println!("  {}{}: {}", field.name, args, type_);
        }
    }
    Ok(())
}

pub async fn graph(
    type_name: Option<String>,
    project: String,
    entry: Option<String>,
    format: String,
) -> Result<()> {
    check_format(&format, &["text", "json", "mermaid"])?;
    let (_project, _indexer, engine) = engine_for(&project, entry.as_deref())?;

    if format == "mermaid" {
        print!("{}", engine.mermaid());
        return Ok(());
    }

    let edges: Vec<_> = match &type_name {
        Some(name) => engine
            .outgoing(name)
            .into_iter()
            .chain(engine.incoming(name).into_iter().filter(|r| r.from_type != *name))
            .collect(),
        None => engine.snapshot().type_relationships.iter().collect(),
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&edges)?);
        return Ok(());
    }
    if edges.is_empty() {
        println!("No relationships found");
    }
    for rel in edges {
        let to = if rel.is_list { format!("[{}]", rel.to_type) } else { rel.to_type.clone() };
        println!("  {}.{} -> {}", rel.from_type, rel.field_name, to);
    }
    Ok(())
}
