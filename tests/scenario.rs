use std::fs;
use std::path::Path;

use schemagraph::index::{ArgInfo, DiagnosticKind, OperationKind};
use schemagraph::indexer::executables::file_uri;
use schemagraph::indexer::hash::document_id;
use schemagraph::indexer::MemoryReader;
use schemagraph::query::QueryEngine;
use schemagraph::SchemaIndexer;
use tempfile::tempdir;

const INDEX: &str = r#"schema
  @sdl(
    files: ["types.graphql"]
    executables: [{ document: "ops/q.graphql", persist: true }]
  ) {
  query: Query
}
"#;

const TYPES: &str = "extend type Query {
  user(id: ID!): User
}

type User {
  id: ID!
  name: String!
}
";

const OPS: &str = "query GetUser($id: ID!) { user(id: $id) { id name } }\n";

fn write_project(dir: &Path) {
    fs::write(dir.join("index.graphql"), INDEX).unwrap();
    fs::write(dir.join("types.graphql"), TYPES).unwrap();
    fs::create_dir_all(dir.join("ops")).unwrap();
    fs::write(dir.join("ops/q.graphql"), OPS).unwrap();
}

#[test]
fn test_scan_builds_every_index() {
    let dir = tempdir().unwrap();
    write_project(dir.path());

    let indexer = SchemaIndexer::from_fs();
    let summary = indexer.scan(&dir.path().join("index.graphql")).unwrap();
    assert!(summary.diagnostics.is_empty(), "{:?}", summary.diagnostics);
    assert_eq!(summary.stats.total_files, 2);

    let snapshot = indexer.snapshot();

    let user_op = snapshot.root_operation("Query", "user").unwrap();
    assert_eq!(user_op.root_type, "Query");
    assert_eq!(user_op.return_type, "User");
    assert!(!user_op.is_list);
    assert_eq!(
        user_op.args,
        vec![ArgInfo {
            name: "id".to_string(),
            type_: "ID!".to_string(),
        }]
    );

    let user_fields: Vec<_> = snapshot.fields_of("User").iter().map(|f| f.name.as_str()).collect();
    assert_eq!(user_fields, ["id", "name"]);

    assert!(snapshot
        .type_relationships
        .iter()
        .any(|r| r.from_type == "Query"
            && r.to_type == "User"
            && r.field_name == "user"
            && !r.is_list));

    assert_eq!(snapshot.persisted_doc_map.len(), 1);
    let id = document_id(OPS);
    let doc = &snapshot.persisted_doc_map[&id];
    assert_eq!(doc.document_id, id);
    assert_eq!(doc.file_uri, file_uri(&dir.path().join("ops/q.graphql")));
    assert_eq!(doc.operations.len(), 1);
    assert_eq!(doc.operations[0].name, "GetUser");
    assert_eq!(doc.operations[0].kind, OperationKind::Query);
    assert!(doc.operations[0].persisted);
}

#[test]
fn test_root_fields_are_registered_twice() {
    let dir = tempdir().unwrap();
    write_project(dir.path());

    let indexer = SchemaIndexer::from_fs();
    indexer.scan(&dir.path().join("index.graphql")).unwrap();
    let snapshot = indexer.snapshot();

    let user_field = snapshot.find_definition("user").unwrap();
    assert_eq!(user_field.len(), 1);
    assert_eq!(user_field[0].container.as_deref(), Some("Query"));
    assert_eq!(user_field[0].location.file_path, dir.path().join("types.graphql"));
    assert_eq!((user_field[0].location.line, user_field[0].location.character), (1, 2));

    let user_type = snapshot.find_definition("User").unwrap();
    assert_eq!(user_type[0].container, None);
    assert_eq!((user_type[0].location.line, user_type[0].location.character), (4, 5));

    // The root field also shows up as a plain field of Query
    assert_eq!(snapshot.fields_of("Query").len(), 1);
}

#[test]
fn test_scalars_are_not_relationships() {
    let dir = tempdir().unwrap();
    write_project(dir.path());

    let indexer = SchemaIndexer::from_fs();
    indexer.scan(&dir.path().join("index.graphql")).unwrap();
    let snapshot = indexer.snapshot();

    assert!(snapshot.fields_of("User").iter().any(|f| f.type_ == "String"));
    assert!(!snapshot
        .type_relationships
        .iter()
        .any(|r| r.to_type == "ID" || r.to_type == "String"));
}

#[test]
fn test_editing_a_persisted_document_changes_its_id() {
    let dir = tempdir().unwrap();
    write_project(dir.path());
    let entry = dir.path().join("index.graphql");

    let indexer = SchemaIndexer::from_fs();
    indexer.scan(&entry).unwrap();
    let old_id = document_id(OPS);
    assert!(indexer.snapshot().persisted_doc_map.contains_key(&old_id));

    let edited = "query GetUser($id: ID!) { user(id: $id) { name } }\n";
    fs::write(dir.path().join("ops/q.graphql"), edited).unwrap();
    indexer.scan(&entry).unwrap();

    let snapshot = indexer.snapshot();
    assert!(!snapshot.persisted_doc_map.contains_key(&old_id));
    assert!(snapshot.persisted_doc_map.contains_key(&document_id(edited)));
    assert_eq!(snapshot.persisted_doc_map.len(), 1);
}

#[test]
fn test_operation_text_round_trips_through_the_engine() {
    let dir = tempdir().unwrap();
    write_project(dir.path());

    let indexer = SchemaIndexer::from_fs();
    indexer.scan(&dir.path().join("index.graphql")).unwrap();
    let engine = QueryEngine::new(indexer.snapshot());

    let op = engine.find_operation("GetUser")[0];
    assert_eq!(engine.operation_text(op, indexer.reader()).unwrap(), OPS.trim_end());
}

#[test]
fn test_missing_executable_is_reported_not_fatal() {
    let reader = MemoryReader::new()
        .with_file("/proj/index.graphql", INDEX)
        .with_file("/proj/types.graphql", TYPES);

    let indexer = SchemaIndexer::new(reader);
    let summary = indexer.scan(Path::new("/proj/index.graphql")).unwrap();

    assert_eq!(summary.diagnostics.len(), 1);
    assert_eq!(summary.diagnostics[0].kind, DiagnosticKind::NotFound);
    assert_eq!(summary.diagnostics[0].path, Path::new("/proj/ops/q.graphql"));
    assert!(indexer.snapshot().persisted_doc_map.is_empty());
    assert!(indexer.snapshot().root_operation("Query", "user").is_some());
}
