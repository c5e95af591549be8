// Operation and persisted-document scanning of `@sdl(executables: [...])`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use apollo_parser::cst::{self, CstNode};
use tracing::{debug, info, warn};

use super::hash::document_id;
use super::parser::{self, executable_decls, name_text};
use super::{normalize_path, SourceReader};
use crate::index::{
    ByteRange, DiagnosticKind, IndexBuilder, OperationEntry, OperationKind, PersistedDocEntry,
    ScanDiagnostic, ANONYMOUS_OPERATION,
};

/// `file://` URI used as the key of the operation map
pub fn file_uri(path: &Path) -> String {
    url::Url::from_file_path(path)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| format!("file://{}", path.display()))
}

/// Scan the executable documents declared anywhere in the assembled schema.
///
/// `assembled` is the concatenation of every crawled schema file, so a
/// declaration is found whichever file carries it. Each document is handled
/// on its own: a missing, unreadable or malformed one is reported and skipped.
pub fn scan_executables<R: SourceReader + ?Sized>(
    assembled: &str,
    project_root: &Path,
    reader: &R,
    builder: &mut IndexBuilder,
) {
    let parsed = parser::parse(assembled);
    if parsed.has_errors() {
        debug!("Assembled schema has {} syntax errors", parsed.errors.len());
    }

    let decls = executable_decls(&parsed.document);
    if decls.is_empty() {
        return;
    }
    info!("Scanning {} executable documents", decls.len());

    // A document declared more than once is persisted if any declaration says so
    let mut documents: BTreeMap<PathBuf, bool> = BTreeMap::new();
    for decl in decls {
        let declared = Path::new(&decl.document);
        let path = if declared.is_absolute() {
            normalize_path(declared)
        } else {
            normalize_path(&project_root.join(declared))
        };
        *documents.entry(path).or_default() |= decl.persist;
    }

    for (path, persist) in documents {
        match scan_document(&path, persist, reader) {
            Ok((operations, persisted)) => {
                let uri = file_uri(&path);
                debug!("{}: {} operations", path.display(), operations.len());
                if let Some(document_id) = persisted {
                    builder.add_persisted(PersistedDocEntry {
                        document_id,
                        file_uri: uri.clone(),
                        operations: operations.clone(),
                    });
                }
                builder.set_operations(uri, operations);
            }
            Err(diagnostic) => {
                warn!("Skipping executable {}: {}", diagnostic.path.display(), diagnostic.message);
                builder.add_diagnostic(diagnostic);
            }
        }
    }
}

type ScannedDocument = (Vec<OperationEntry>, Option<String>);

fn scan_document<R: SourceReader + ?Sized>(
    path: &Path,
    persist: bool,
    reader: &R,
) -> Result<ScannedDocument, ScanDiagnostic> {
    let diagnostic = |kind, message: String| ScanDiagnostic {
        path: path.to_path_buf(),
        kind,
        message,
    };

    if !reader.exists(path) {
        return Err(diagnostic(DiagnosticKind::NotFound, "document does not exist".to_string()));
    }
    let text = reader
        .read_to_string(path)
        .map_err(|e| diagnostic(DiagnosticKind::Io, e.to_string()))?;

    let parsed = parser::parse(&text);
    if parsed.has_errors() {
        return Err(diagnostic(DiagnosticKind::Parse, parsed.errors.join("; ")));
    }

    let uri = file_uri(path);
    let operations = collect_operations(&parsed.document, &text, &uri, persist);
    // Only documents with at least one operation are persisted
    let persisted = (persist && !operations.is_empty()).then(|| document_id(&text));
    Ok((operations, persisted))
}

/// Every operation and fragment definition with its byte range in `text`
pub fn collect_operations(
    document: &cst::Document,
    text: &str,
    file_uri: &str,
    persisted: bool,
) -> Vec<OperationEntry> {
    let mut operations = Vec::new();
    for definition in document.definitions() {
        let (name, kind, syntax) = match &definition {
            cst::Definition::OperationDefinition(op) => {
                let kind = op
                    .operation_type()
                    .and_then(|t| OperationKind::from_keyword(t.syntax().text().to_string().trim()))
                    .unwrap_or(OperationKind::Query);
                (name_text(op.name()), kind, op.syntax().clone())
            }
            cst::Definition::FragmentDefinition(fragment) => {
                let name = fragment.fragment_name().and_then(|f| name_text(f.name()));
                (name, OperationKind::Fragment, fragment.syntax().clone())
            }
            _ => continue,
        };

        operations.push(OperationEntry {
            name: name.unwrap_or_else(|| ANONYMOUS_OPERATION.to_string()),
            kind,
            file_uri: file_uri.to_string(),
            range: trimmed_range(
                text,
                syntax.text_range().start().into(),
                syntax.text_range().end().into(),
            ),
            persisted,
        });
    }
    operations
}

/// Drop trailing whitespace the syntax node may have absorbed
fn trimmed_range(text: &str, start: usize, end: usize) -> ByteRange {
    let end = text
        .get(start..end)
        .map(|slice| start + slice.trim_end().len())
        .unwrap_or(end);
    ByteRange { start, end }
}
