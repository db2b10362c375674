//! The live index registry.

use std::sync::Arc;

use colgraph_common::types::ElementKind;
use colgraph_common::utils::hash::FxHashMap;
use parking_lot::RwLock;
use smallvec::SmallVec;

use super::automatic::AutomaticIndex;

/// Indices selected for one property mutation.
pub type FanOut = SmallVec<[Arc<AutomaticIndex>; 4]>;

/// In-process map of index name to live index.
///
/// Read on every property mutation, written by index administration.
#[derive(Debug, Default)]
pub struct IndexRegistry {
    indices: RwLock<FxHashMap<String, Arc<AutomaticIndex>>>,
}

impl IndexRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an index, replacing any index of the same name.
    pub fn insert(&self, index: AutomaticIndex) -> Arc<AutomaticIndex> {
        let index = Arc::new(index);
        self.indices
            .write()
            .insert(index.name().to_string(), Arc::clone(&index));
        index
    }

    /// Replaces the whole registry.
    pub fn reload(&self, indices: impl IntoIterator<Item = AutomaticIndex>) {
        let fresh: FxHashMap<_, _> = indices
            .into_iter()
            .map(|index| (index.name().to_string(), Arc::new(index)))
            .collect();
        *self.indices.write() = fresh;
    }

    /// Returns the index named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<AutomaticIndex>> {
        self.indices.read().get(name).cloned()
    }

    /// Unregisters an index.
    pub fn remove(&self, name: &str) -> Option<Arc<AutomaticIndex>> {
        self.indices.write().remove(name)
    }

    /// Snapshots the indices to update when `key` changes on an element of
    /// `kind`.
    #[must_use]
    pub fn covering(&self, kind: ElementKind, key: &str) -> FanOut {
        self.indices
            .read()
            .values()
            .filter(|index| index.descriptor().covers(kind, key))
            .cloned()
            .collect()
    }

    /// Returns the registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indices.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.read().len()
    }

    /// Returns true if no index is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use colgraph_common::utils::error::Result;

    use super::*;
    use crate::index::IndexDescriptor;
    use crate::storage::{ColumnStore, Delete, Put, Row, RowLock, TableDescriptor};

    struct NullStore;

    impl ColumnStore for NullStore {
        fn create_table(&self, _: &TableDescriptor) -> Result<()> {
            Ok(())
        }
        fn drop_table(&self, _: &str) -> Result<()> {
            Ok(())
        }
        fn table_exists(&self, _: &str) -> Result<bool> {
            Ok(false)
        }
        fn get(&self, _: &str, row: &[u8]) -> Result<Row> {
            Ok(Row::new(row.to_vec()))
        }
        fn put(&self, _: &str, _: Put, _: Option<&RowLock>) -> Result<()> {
            Ok(())
        }
        fn delete(&self, _: &str, _: Delete, _: Option<&RowLock>) -> Result<()> {
            Ok(())
        }
        fn check_and_put(&self, _: &str, _: &str, _: &[u8], _: Option<&[u8]>, _: Put) -> Result<bool> {
            Ok(false)
        }
        fn scan(&self, _: &str, _: &str) -> Result<Vec<Row>> {
            Ok(Vec::new())
        }
        fn lock_row(&self, table: &str, row: &[u8], _: Duration) -> Result<RowLock> {
            Ok(RowLock::new(table, row.to_vec(), 0))
        }
        fn unlock_row(&self, _: RowLock) -> Result<()> {
            Ok(())
        }
    }

    fn index(name: &str, kind: ElementKind, keys: &[&str]) -> AutomaticIndex {
        let mut descriptor = IndexDescriptor::new(name, kind);
        for key in keys {
            descriptor.insert(*key, format!("index-{name}-{key}"));
        }
        AutomaticIndex::new(descriptor, Arc::new(NullStore))
    }

    #[test]
    fn test_covering_selects_by_kind_and_key() {
        let registry = IndexRegistry::new();
        registry.insert(index("people", ElementKind::Vertex, &["name", "age"]));
        registry.insert(index("ages", ElementKind::Vertex, &["age"]));
        registry.insert(index("weights", ElementKind::Edge, &["age", "weight"]));

        let mut names: Vec<_> = registry
            .covering(ElementKind::Vertex, "age")
            .iter()
            .map(|i| i.name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["ages", "people"]);

        assert_eq!(registry.covering(ElementKind::Edge, "weight").len(), 1);
        assert!(registry.covering(ElementKind::Edge, "name").is_empty());
    }

    #[test]
    fn test_insert_remove_reload() {
        let registry = IndexRegistry::new();
        assert!(registry.is_empty());

        registry.insert(index("a", ElementKind::Vertex, &["x"]));
        registry.insert(index("b", ElementKind::Edge, &["y"]));
        assert_eq!(registry.names(), vec!["a", "b"]);

        assert!(registry.remove("a").is_some());
        assert!(registry.remove("a").is_none());
        assert!(registry.get("a").is_none());

        registry.reload(vec![index("c", ElementKind::Vertex, &["z"])]);
        assert_eq!(registry.names(), vec!["c"]);
        assert_eq!(registry.len(), 1);
    }
}
