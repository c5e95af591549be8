use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::{
    DirectiveInfo, FieldIndex, IndexSnapshot, OperationEntry, PersistedDocEntry, RootOperations,
    SymbolLocation, TypeRelationship,
};

/// Process-lifetime holder of the current index.
///
/// Readers take a cheap `Arc` clone of the published snapshot; a scan swaps in
/// a whole new snapshot at once, so lookups never observe a partial rebuild.
#[derive(Debug, Default)]
pub struct IndexStore {
    current: RwLock<Arc<IndexSnapshot>>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently published snapshot
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Replace the published snapshot, returning the previous one
    pub fn publish(&self, snapshot: IndexSnapshot) -> Arc<IndexSnapshot> {
        let next = Arc::new(snapshot);
        let previous = std::mem::replace(&mut *self.current.write(), next);
        debug!("Published new index snapshot");
        previous
    }

    /// Drop every index entry
    pub fn clear_state(&self) {
        self.publish(IndexSnapshot::default());
    }

    pub fn find_definition(&self, name: &str) -> Option<Vec<SymbolLocation>> {
        self.snapshot().find_definition(name).map(|locs| locs.to_vec())
    }

    pub fn root_operations(&self) -> RootOperations {
        self.snapshot().root_operations.clone()
    }

    pub fn operation_map(&self) -> BTreeMap<String, Vec<OperationEntry>> {
        self.snapshot().operation_map.clone()
    }

    pub fn persisted_doc_map(&self) -> BTreeMap<String, PersistedDocEntry> {
        self.snapshot().persisted_doc_map.clone()
    }

    pub fn field_index(&self) -> FieldIndex {
        self.snapshot().field_index.clone()
    }

    pub fn type_directives(&self) -> BTreeMap<String, Vec<DirectiveInfo>> {
        self.snapshot().type_directives.clone()
    }

    pub fn type_relationships(&self) -> Vec<TypeRelationship> {
        self.snapshot().type_relationships.clone()
    }
}
