//! The persisted index registry.
//!
//! One registry row per index, keyed by the index name:
//!
//! | Family | Column | Value |
//! |--------|--------|-------|
//! | registry keys | indexed key | physical table name |
//! | registry class | empty | element class, 2 bytes BE |

use std::sync::Arc;

use colgraph_common::types::ElementKind;
use colgraph_common::utils::error::{CodecError, Error, NotFoundKind, Result, StorageError};
use tracing::{debug, warn};

use super::automatic::AutomaticIndex;
use super::descriptor::IndexDescriptor;
use crate::schema::{CLASS_COLUMN, SchemaLayout};
use crate::storage::{ColumnStore, Delete, Put, Row};

/// Creates, reads and drops automatic indices in the registry table.
pub struct IndexCatalog {
    store: Arc<dyn ColumnStore>,
    layout: SchemaLayout,
}

impl IndexCatalog {
    /// Creates a catalog over `layout`'s registry table.
    pub fn new(store: Arc<dyn ColumnStore>, layout: SchemaLayout) -> Self {
        Self { store, layout }
    }

    /// Creates an index with one physical table per key.
    ///
    /// Duplicate keys are collapsed.
    ///
    /// # Errors
    ///
    /// - [`Error::IndexAlreadyExists`] if `name` is registered.
    /// - [`Error::InvalidPropertyKey`] for an empty key.
    /// - [`Error::SchemaConflict`] if a key's table name is already taken,
    ///   by another index or by another key of this one.
    pub fn create(&self, name: &str, kind: ElementKind, keys: &[&str]) -> Result<AutomaticIndex> {
        let registry = self.layout.registry_table();
        if !self.store.get(registry, name.as_bytes())?.is_empty() {
            return Err(Error::IndexAlreadyExists(name.to_string()));
        }

        let mut descriptor = IndexDescriptor::new(name, kind);
        for &key in keys {
            if key.is_empty() {
                return Err(Error::InvalidPropertyKey(key.to_string()));
            }
            if descriptor.indexes(key) {
                continue;
            }
            let table = self.layout.index_table(name, key);
            if descriptor.tables().any(|(_, t)| t == table) || self.store.table_exists(&table)? {
                return Err(Error::SchemaConflict(format!(
                    "index table '{table}' for key '{key}' of index '{name}' already exists"
                )));
            }
            descriptor.insert(key, table);
        }

        let mut created = Vec::with_capacity(keys.len());
        for (_, table) in descriptor.tables() {
            match self.store.create_table(&SchemaLayout::index_table_descriptor(table)) {
                Ok(()) => created.push(table),
                Err(err) => {
                    self.discard_tables(&created);
                    return Err(match err {
                        Error::Storage(StorageError::TableExists(table)) => {
                            Error::SchemaConflict(format!("index table '{table}' already exists"))
                        }
                        other => other,
                    });
                }
            }
        }

        let mut put = Put::new(name.as_bytes().to_vec());
        for (key, table) in descriptor.tables() {
            put.push(self.layout.registry_keys_family(), key.as_str().as_bytes(), table.as_bytes());
        }
        put.push(self.layout.registry_class_family(), CLASS_COLUMN, kind.to_bytes().to_vec());
        if let Err(err) = self.store.put(registry, put, None) {
            self.discard_tables(&created);
            return Err(err);
        }

        debug!(index = name, %kind, keys = descriptor.tables().count(), "created automatic index");
        Ok(AutomaticIndex::new(descriptor, Arc::clone(&self.store)))
    }

    /// Reads one index from the registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `name` is not registered.
    pub fn get(&self, name: &str) -> Result<AutomaticIndex> {
        let row = self.store.get(self.layout.registry_table(), name.as_bytes())?;
        if row.is_empty() {
            return Err(Error::NotFound(NotFoundKind::Index(name.to_string())));
        }
        Ok(AutomaticIndex::new(self.decode(&row)?, Arc::clone(&self.store)))
    }

    /// Scans the registry from scratch and returns every index.
    pub fn list(&self) -> Result<Vec<AutomaticIndex>> {
        self.store
            .scan(self.layout.registry_table(), self.layout.registry_class_family())?
            .iter()
            .map(|row| -> Result<AutomaticIndex> {
                Ok(AutomaticIndex::new(self.decode(row)?, Arc::clone(&self.store)))
            })
            .collect()
    }

    /// Drops every table of `name`, then its registry row.
    ///
    /// Returns false, without touching the store, if `name` is not
    /// registered. Tables already gone are skipped, so a drop interrupted
    /// halfway can be repeated.
    pub fn drop(&self, name: &str) -> Result<bool> {
        let registry = self.layout.registry_table();
        let row = self.store.get(registry, name.as_bytes())?;
        if row.is_empty() {
            return Ok(false);
        }

        let descriptor = self.decode(&row)?;
        for (_, table) in descriptor.tables() {
            match self.store.drop_table(table) {
                Ok(()) | Err(Error::Storage(StorageError::TableNotFound(_))) => {}
                Err(err) => return Err(err),
            }
        }
        self.store.delete(registry, Delete::new(name.as_bytes().to_vec()), None)?;

        debug!(index = name, "dropped automatic index");
        Ok(true)
    }

    fn decode(&self, row: &Row) -> Result<IndexDescriptor> {
        let name = std::str::from_utf8(row.key()).map_err(|_| CodecError::InvalidUtf8)?;
        let class = row
            .get(self.layout.registry_class_family(), CLASS_COLUMN)
            .ok_or(CodecError::MalformedPayload {
                tag: "element class",
                expected: 2,
                actual: 0,
            })?;

        let mut descriptor = IndexDescriptor::new(name, ElementKind::from_bytes(class)?);
        for (key, table) in row.columns(self.layout.registry_keys_family()) {
            let key = std::str::from_utf8(key).map_err(|_| CodecError::InvalidUtf8)?;
            let table = std::str::from_utf8(table).map_err(|_| CodecError::InvalidUtf8)?;
            descriptor.insert(key, table);
        }
        Ok(descriptor)
    }

    fn discard_tables(&self, tables: &[&str]) {
        for table in tables {
            if let Err(err) = self.store.drop_table(table) {
                warn!(table, error = %err, "failed to discard index table after aborted creation");
            }
        }
    }
}
