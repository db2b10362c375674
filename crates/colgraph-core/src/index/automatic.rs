//! Entry maintenance and lookup for one automatic index.

use std::fmt;
use std::sync::Arc;

use colgraph_common::codec::encode_value;
use colgraph_common::types::{ElementKind, PropertyKey, Value};
use colgraph_common::utils::error::Result;

use super::descriptor::IndexDescriptor;
use crate::schema::SchemaLayout;
use crate::storage::{ColumnStore, Delete, Put};

/// A live automatic index bound to its store.
///
/// Element ids are raw row-key bytes; resolving them back to vertices or
/// edges is the graph layer's job.
pub struct AutomaticIndex {
    descriptor: IndexDescriptor,
    store: Arc<dyn ColumnStore>,
}

impl AutomaticIndex {
    pub(crate) fn new(descriptor: IndexDescriptor, store: Arc<dyn ColumnStore>) -> Self {
        Self { descriptor, store }
    }

    /// Returns the index name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Returns the element kind covered.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.descriptor.kind()
    }

    /// Returns the indexed keys.
    #[must_use]
    pub fn keys(&self) -> Vec<PropertyKey> {
        self.descriptor.keys().cloned().collect()
    }

    /// Returns the descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &IndexDescriptor {
        &self.descriptor
    }

    /// Records that `element_id` holds `value` under `key`.
    ///
    /// No-op if `key` is not indexed.
    pub fn put(&self, key: &str, value: &Value, element_id: &[u8]) -> Result<()> {
        let Some(table) = self.descriptor.table(key) else {
            return Ok(());
        };
        let family = SchemaLayout::index_family(table);
        let put = Put::new(encode_value(value)?).add(&family, element_id, element_id);
        self.store.put(table, put, None)
    }

    /// Removes `element_id` from the entry for `value` under `key`.
    ///
    /// No-op if `key` is not indexed.
    pub fn remove(&self, key: &str, value: &Value, element_id: &[u8]) -> Result<()> {
        let Some(table) = self.descriptor.table(key) else {
            return Ok(());
        };
        let family = SchemaLayout::index_family(table);
        let delete = Delete::new(encode_value(value)?).column(&family, element_id);
        self.store.delete(table, delete, None)
    }

    /// Returns the ids of every element recorded under `value` for `key`,
    /// in no particular order.
    pub fn lookup(&self, key: &str, value: &Value) -> Result<Vec<Vec<u8>>> {
        let Some(table) = self.descriptor.table(key) else {
            return Ok(Vec::new());
        };
        let family = SchemaLayout::index_family(table);
        let row = self.store.get(table, &encode_value(value)?)?;
        Ok(row.columns(&family).map(|(id, _)| id.to_vec()).collect())
    }

    /// Returns how many elements are recorded under `value` for `key`.
    pub fn count(&self, key: &str, value: &Value) -> Result<usize> {
        let Some(table) = self.descriptor.table(key) else {
            return Ok(0);
        };
        let family = SchemaLayout::index_family(table);
        let row = self.store.get(table, &encode_value(value)?)?;
        Ok(row.columns(&family).count())
    }
}

impl fmt::Debug for AutomaticIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutomaticIndex")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
