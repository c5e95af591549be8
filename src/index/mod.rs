// Index data model and the published snapshot

pub mod store;

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use store::IndexStore;

/// Name used for operations declared without a name
pub const ANONYMOUS_OPERATION: &str = "<anonymous>";

/// Zero-based position inside a schema file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file_path: PathBuf,
    pub line: u32,
    /// UTF-16 code units from the start of the line
    pub character: u32,
}

/// Where a symbol is declared, with its enclosing root type for field symbols
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolLocation {
    #[serde(flatten)]
    pub location: SourceLocation,
    pub container: Option<String>,
}

/// Argument name and full type signature, e.g. `ids: [ID!]!`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
}

/// A field declared directly on Query, Mutation or Subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootOperationInfo {
    pub root_type: String,
    pub return_type: String,
    pub is_list: bool,
    pub args: Vec<ArgInfo>,
    pub location: SourceLocation,
}

/// A field of any object type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    /// Base type name with list and non-null wrappers removed
    #[serde(rename = "type")]
    pub type_: String,
    pub is_list: bool,
    pub args: Vec<ArgInfo>,
    pub directives: Vec<DirectiveInfo>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveInfo {
    pub name: String,
    pub args: Vec<DirectiveArg>,
}

/// Directive argument; `value` is only set for string literals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveArg {
    pub name: String,
    pub value: Option<String>,
}

/// Edge of the type graph: `from_type.field_name` returns `to_type`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRelationship {
    pub from_type: String,
    pub to_type: String,
    pub field_name: String,
    pub is_list: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
    Fragment,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
            Self::Fragment => "fragment",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "query" => Some(Self::Query),
            "mutation" => Some(Self::Mutation),
            "subscription" => Some(Self::Subscription),
            "fragment" => Some(Self::Fragment),
            _ => None,
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open byte range into the executable document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OperationKind,
    pub file_uri: String,
    pub range: ByteRange,
    pub persisted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedDocEntry {
    pub document_id: String,
    pub file_uri: String,
    pub operations: Vec<OperationEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    NotFound,
    Parse,
    Resolution,
    Io,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotFound => "not found",
            Self::Parse => "parse error",
            Self::Resolution => "not resolved",
            Self::Io => "io error",
        };
        f.write_str(s)
    }
}

/// A recoverable problem met during a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanDiagnostic {
    pub path: PathBuf,
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Map from type name to its fields in parse order
pub type FieldIndex = BTreeMap<String, Vec<FieldInfo>>;

/// Map from root type name to its fields keyed by field name
pub type RootOperations = BTreeMap<String, BTreeMap<String, RootOperationInfo>>;

/// One complete, immutable result of a scan.
///
/// Snapshots are only ever built by the indexer and published whole through
/// [`IndexStore`], so a reader holding one never sees a half-built index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub entry: Option<PathBuf>,
    /// Schema files in processing order
    pub files: Vec<PathBuf>,
    pub definitions: BTreeMap<String, Vec<SymbolLocation>>,
    pub root_operations: RootOperations,
    pub field_index: FieldIndex,
    pub type_directives: BTreeMap<String, Vec<DirectiveInfo>>,
    pub type_relationships: Vec<TypeRelationship>,
    pub operation_map: BTreeMap<String, Vec<OperationEntry>>,
    pub persisted_doc_map: BTreeMap<String, PersistedDocEntry>,
    pub diagnostics: Vec<ScanDiagnostic>,
}

impl IndexSnapshot {
    /// All recorded locations for an exact, case-sensitive symbol name
    pub fn find_definition(&self, name: &str) -> Option<&[SymbolLocation]> {
        self.definitions.get(name).map(|v| v.as_slice())
    }

    pub fn root_operation(&self, root_type: &str, field_name: &str) -> Option<&RootOperationInfo> {
        self.root_operations.get(root_type)?.get(field_name)
    }

    pub fn fields_of(&self, type_name: &str) -> &[FieldInfo] {
        self.field_index
            .get(type_name)
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.definitions.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_files: self.files.len(),
            total_symbols: self.definitions.len(),
            total_types: self.field_index.len(),
            total_fields: self.field_index.values().map(Vec::len).sum(),
            total_relationships: self.type_relationships.len(),
            total_operations: self.operation_map.values().map(Vec::len).sum(),
            total_persisted: self.persisted_doc_map.len(),
            total_diagnostics: self.diagnostics.len(),
        }
    }
}

/// Counters shown by `stats` and the MCP stats tool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_files: usize,
    pub total_symbols: usize,
    pub total_types: usize,
    pub total_fields: usize,
    pub total_relationships: usize,
    pub total_operations: usize,
    pub total_persisted: usize,
    pub total_diagnostics: usize,
}

/// Mutable accumulator for one scan; frozen into an [`IndexSnapshot`].
#[derive(Debug, Default)]
pub struct IndexBuilder {
    snapshot: IndexSnapshot,
    seen_locations: HashSet<(String, SourceLocation)>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_entry(&mut self, entry: PathBuf) {
        self.snapshot.entry = Some(entry);
    }

    pub fn add_file(&mut self, path: PathBuf) {
        self.snapshot.files.push(path);
    }

    /// Record a symbol location, ignoring exact duplicates for the same name
    pub fn add_definition(
        &mut self,
        name: &str,
        location: SourceLocation,
        container: Option<String>,
    ) {
        if !self.seen_locations.insert((name.to_string(), location.clone())) {
            return;
        }
        self.snapshot
            .definitions
            .entry(name.to_string())
            .or_default()
            .push(SymbolLocation { location, container });
    }

    pub fn add_root_operation(&mut self, field_name: &str, info: RootOperationInfo) {
        self.snapshot
            .root_operations
            .entry(info.root_type.clone())
            .or_default()
            .insert(field_name.to_string(), info);
    }

    pub fn add_field(&mut self, type_name: &str, field: FieldInfo) {
        self.snapshot
            .field_index
            .entry(type_name.to_string())
            .or_default()
            .push(field);
    }

    pub fn add_type_directives(&mut self, type_name: &str, directives: Vec<DirectiveInfo>) {
        if directives.is_empty() {
            return;
        }
        self.snapshot
            .type_directives
            .entry(type_name.to_string())
            .or_default()
            .extend(directives);
    }

    pub fn add_relationship(&mut self, relationship: TypeRelationship) {
        self.snapshot.type_relationships.push(relationship);
    }

    pub fn set_operations(&mut self, file_uri: String, operations: Vec<OperationEntry>) {
        self.snapshot.operation_map.insert(file_uri, operations);
    }

    pub fn add_persisted(&mut self, entry: PersistedDocEntry) {
        self.snapshot
            .persisted_doc_map
            .insert(entry.document_id.clone(), entry);
    }

    pub fn add_diagnostic(&mut self, diagnostic: ScanDiagnostic) {
        self.snapshot.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[ScanDiagnostic] {
        &self.snapshot.diagnostics
    }

    pub fn build(self) -> IndexSnapshot {
        self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(line: u32, character: u32) -> SourceLocation {
        SourceLocation {
            file_path: PathBuf::from("schema.graphql"),
            line,
            character,
        }
    }

    #[test]
    fn test_duplicate_locations_suppressed() {
        let mut builder = IndexBuilder::new();
        builder.add_definition("User", loc(1, 5), None);
        builder.add_definition("User", loc(1, 5), None);
        builder.add_definition("User", loc(9, 12), None);

        let snapshot = builder.build();
        assert_eq!(snapshot.find_definition("User").unwrap().len(), 2);
    }

    #[test]
    fn test_same_location_under_different_names() {
        let mut builder = IndexBuilder::new();
        builder.add_definition("a", loc(0, 0), None);
        builder.add_definition("b", loc(0, 0), None);

        let snapshot = builder.build();
        assert!(snapshot.find_definition("a").is_some());
        assert!(snapshot.find_definition("b").is_some());
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let mut builder = IndexBuilder::new();
        builder.add_definition("User", loc(0, 5), None);

        let snapshot = builder.build();
        assert!(snapshot.find_definition("user").is_none());
    }

    #[test]
    fn test_type_directives_only_when_present() {
        let mut builder = IndexBuilder::new();
        builder.add_type_directives("Plain", Vec::new());
        builder.add_type_directives(
            "Tagged",
            vec![DirectiveInfo { name: "key".to_string(), args: Vec::new() }],
        );

        let snapshot = builder.build();
        assert!(!snapshot.type_directives.contains_key("Plain"));
        assert_eq!(snapshot.type_directives["Tagged"].len(), 1);
    }

    #[test]
    fn test_root_operations_keyed_by_root_type() {
        let mut builder = IndexBuilder::new();
        for root in ["Query", "Mutation"] {
            builder.add_root_operation(
                "foo",
                RootOperationInfo {
                    root_type: root.to_string(),
                    return_type: "Foo".to_string(),
                    is_list: false,
                    args: Vec::new(),
                    location: loc(0, 0),
                },
            );
        }

        let snapshot = builder.build();
        assert!(snapshot.root_operation("Query", "foo").is_some());
        assert!(snapshot.root_operation("Mutation", "foo").is_some());
    }

    #[test]
    fn test_empty_stats() {
        let stats = IndexSnapshot::default().stats();
        assert_eq!(stats, IndexStats::default());
    }
}
