//! Index descriptors.

use colgraph_common::types::{ElementKind, PropertyKey};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Name, target kind and indexed keys of an automatic index.
///
/// Keys keep their creation order, each mapped to its physical table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    name: String,
    kind: ElementKind,
    tables: IndexMap<PropertyKey, String>,
}

impl IndexDescriptor {
    /// Creates a descriptor with no keys.
    pub fn new(name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            name: name.into(),
            kind,
            tables: IndexMap::new(),
        }
    }

    /// Maps `key` to its physical table, replacing any previous mapping.
    pub fn insert(&mut self, key: impl Into<PropertyKey>, table: impl Into<String>) {
        self.tables.insert(key.into(), table.into());
    }

    /// Returns the index name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the element kind covered.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Iterates the indexed keys in creation order.
    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.tables.keys()
    }

    /// Iterates `(key, table)` pairs.
    pub fn tables(&self) -> impl Iterator<Item = (&PropertyKey, &str)> {
        self.tables.iter().map(|(k, t)| (k, t.as_str()))
    }

    /// Returns the table for `key`, if indexed.
    #[must_use]
    pub fn table(&self, key: &str) -> Option<&str> {
        self.tables.get(key).map(String::as_str)
    }

    /// Returns true if `key` is indexed.
    #[must_use]
    pub fn indexes(&self, key: &str) -> bool {
        self.tables.contains_key(key)
    }

    /// Returns true if this index must be updated when `key` changes on an
    /// element of `kind`.
    #[must_use]
    pub fn covers(&self, kind: ElementKind, key: &str) -> bool {
        self.kind == kind && self.indexes(key)
    }
}
