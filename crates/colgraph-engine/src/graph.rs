//! The graph store facade.
//!
//! # Physical layout
//!
//! Every vertex is one row of the vertex table, keyed by its [`VertexId`]:
//!
//! | Family | Column | Value |
//! |--------|--------|-------|
//! | properties | key, or empty for the marker | encoded value, empty for the marker |
//! | out-edges | `EdgeLocalId` | in-vertex `VertexId` |
//! | in-edges | `EdgeLocalId` | remote `EdgeId` |
//! | edge properties | `PropertyId` | encoded value (the label is stored raw) |
//!
//! An edge has no row of its own. It lives in its out-vertex's row and is
//! cross-referenced from its in-vertex's row.
//!
//! # Consistency
//!
//! Each row mutation is atomic. Edge creation and removal touch two rows
//! under row locks taken out-vertex first; the locks keep concurrent edge
//! mutations apart but readers can observe one half of an edge before the
//! other half is written. If the second write fails the edge stays
//! one-sided; this is logged and not repaired.
//!
//! `add_edge(a, b)` and `add_edge(b, a)` running at the same time each take
//! their first lock and wait for the other's. Neither call deadlocks: one or
//! both fail with [`Error::LockTimeout`] and may be retried.
//!
//! Property writes and vertex removal hold the owning row's lock across the
//! row write and the index fan-out, so a property is never written to a
//! removed element and the index sees one writer per row at a time.
//! [`VertexHandle::compare_and_set_property`] against a set value is the
//! exception: it swaps with the store's check-and-put and updates indices
//! without the lock, so racing swaps can leave a stale entry that lookups
//! filter out.

use std::fmt;
use std::sync::Arc;

use colgraph_adapters::MemColumnStore;
use colgraph_common::codec::{decode_value, encode_value};
use colgraph_common::types::{
    EdgeId, EdgeLocalId, ElementKind, IdGenerator, PropertyId, PropertyKey, Value, VertexId,
};
use colgraph_common::utils::error::{CodecError, Error, NotFoundKind, Result, StorageError};
use colgraph_common::utils::hash::FxHashMap;
use colgraph_core::index::{AutomaticIndex, IndexCatalog, IndexDescriptor, IndexRegistry};
use colgraph_core::schema::{LABEL_KEY, SchemaLayout, VERTEX_MARKER_COLUMN};
use colgraph_core::storage::{ColumnStore, Delete, Put, Row, TableDescriptor};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::Config;
use crate::edge::EdgeHandle;
use crate::locking::RowLockGuard;
use crate::vertex::VertexHandle;

/// A property graph mapped onto a column store.
///
/// Owns the store connection and the live index registry; handles borrow
/// the store and never the reverse.
///
/// # Examples
///
/// ```
/// use colgraph_engine::{Config, GraphStore};
///
/// let graph = GraphStore::in_memory(Config::default())?;
/// let alice = graph.add_vertex()?;
/// let bob = graph.add_vertex()?;
/// let knows = graph.add_edge(alice.id(), bob.id(), "knows")?;
/// assert_eq!(knows.label(), "knows");
/// # Ok::<(), colgraph_engine::Error>(())
/// ```
pub struct GraphStore {
    config: Config,
    store: Arc<dyn ColumnStore>,
    layout: SchemaLayout,
    ids: IdGenerator,
    catalog: IndexCatalog,
    registry: IndexRegistry,
    /// Serializes index administration within this process.
    admin: Mutex<()>,
}

impl GraphStore {
    /// Opens a graph over an existing column store.
    ///
    /// Bootstraps the vertex and registry tables if the configuration asks
    /// for it, then loads every persisted automatic index.
    ///
    /// # Errors
    ///
    /// Returns an error if bootstrap fails or the registry cannot be read.
    pub fn open(store: Arc<dyn ColumnStore>, config: Config) -> Result<Self> {
        let layout = SchemaLayout::new(config.graph_name.as_str());
        if config.bootstrap {
            ensure_table(store.as_ref(), &layout.vertex_table_descriptor())?;
            ensure_table(store.as_ref(), &layout.registry_table_descriptor())?;
        }

        let catalog = IndexCatalog::new(Arc::clone(&store), layout.clone());
        let registry = IndexRegistry::new();
        registry.reload(catalog.list()?);

        debug!(
            graph = layout.graph_name(),
            indices = registry.len(),
            "opened graph store"
        );
        Ok(Self {
            config,
            store,
            layout,
            ids: IdGenerator::new(),
            catalog,
            registry,
            admin: Mutex::new(()),
        })
    }

    /// Opens a graph over a fresh [`MemColumnStore`].
    ///
    /// # Errors
    ///
    /// Returns an error if bootstrap fails.
    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(MemColumnStore::with_lock_timeout(config.lock_timeout));
        Self::open(store, config)
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the naming layout.
    #[must_use]
    pub fn layout(&self) -> &SchemaLayout {
        &self.layout
    }

    /// Returns the underlying column store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ColumnStore> {
        &self.store
    }

    // === Vertex Operations ===

    /// Creates a vertex with a store-assigned id and no properties.
    pub fn add_vertex(&self) -> Result<VertexHandle<'_>> {
        let id = self.ids.new_vertex_id();
        let put = Put::new(id.as_bytes().to_vec()).add(
            self.layout.properties_family(),
            VERTEX_MARKER_COLUMN,
            Vec::new(),
        );
        self.store.put(self.layout.vertex_table(), put, None)?;

        debug!(vertex = %id, "added vertex");
        Ok(VertexHandle::new(self, id))
    }

    /// Returns a handle to an existing vertex. Properties are not loaded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the vertex row is empty.
    pub fn get_vertex(&self, id: VertexId) -> Result<VertexHandle<'_>> {
        self.existing_vertex_row(id)?;
        Ok(VertexHandle::new(self, id))
    }

    /// Deletes a vertex row and withdraws its properties from vertex
    /// indices.
    ///
    /// Incident edges are not removed: their entries in neighboring rows
    /// become orphans, which adjacency enumeration skips.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the vertex does not exist.
    /// - [`Error::LockTimeout`] if the row lock is not granted in time.
    pub fn remove_vertex(&self, id: VertexId) -> Result<()> {
        let guard = self.lock_vertex_row(id)?;
        let row = self.existing_vertex_row(id)?;
        self.store.delete(
            self.layout.vertex_table(),
            Delete::new(id.as_bytes().to_vec()),
            guard.lock_for(id.as_bytes()),
        )?;

        for (column, value) in row.columns(self.layout.properties_family()) {
            if column == VERTEX_MARKER_COLUMN {
                continue;
            }
            let key = utf8(column)?;
            let value = decode_value(value)?;
            self.reindex(ElementKind::Vertex, id.as_bytes(), key, Some(&value), None)?;
        }
        drop(guard);

        debug!(vertex = %id, "removed vertex");
        Ok(())
    }

    // === Edge Operations ===

    /// Creates an edge from `out_vertex` to `in_vertex`.
    ///
    /// Both rows are validated, then locked out-vertex first, re-validated
    /// under the locks, and written as two single-row mutations.
    ///
    /// # Errors
    ///
    /// - [`Error::DanglingEndpoint`] if either vertex is absent; nothing is
    ///   written.
    /// - [`Error::LockTimeout`] if a row lock is not granted in time;
    ///   nothing is written and the call may be retried.
    pub fn add_edge(
        &self,
        out_vertex: VertexId,
        in_vertex: VertexId,
        label: &str,
    ) -> Result<EdgeHandle<'_>> {
        let table = self.layout.vertex_table();
        self.require_endpoints(out_vertex, in_vertex)?;

        let guard = RowLockGuard::acquire(
            self.store.as_ref(),
            table,
            &[&out_vertex.as_bytes()[..], &in_vertex.as_bytes()[..]],
            self.config.lock_timeout,
        )?;
        let out_row = self.require_endpoints(out_vertex, in_vertex)?;

        let out_edges = self.layout.out_edges_family();
        let mut local = self.ids.new_edge_local_id();
        while out_row.contains(out_edges, local.as_bytes()) {
            local = self.ids.new_edge_local_id();
        }
        let edge_id = EdgeId::compose(out_vertex, local);

        let out_put = Put::new(out_vertex.as_bytes().to_vec())
            .add(out_edges, local.as_bytes().to_vec(), in_vertex.as_bytes().to_vec())
            .add(
                self.layout.edge_properties_family(),
                PropertyId::compose(LABEL_KEY, local).into_bytes(),
                label.as_bytes(),
            );
        self.store
            .put(table, out_put, guard.lock_for(out_vertex.as_bytes()))?;

        let in_put = Put::new(in_vertex.as_bytes().to_vec()).add(
            self.layout.in_edges_family(),
            local.as_bytes().to_vec(),
            edge_id.as_bytes().to_vec(),
        );
        if let Err(err) = self
            .store
            .put(table, in_put, guard.lock_for(in_vertex.as_bytes()))
        {
            warn!(edge = %edge_id, error = %err, "in-vertex write failed after out-vertex write, edge is one-sided");
            return Err(err);
        }
        drop(guard);

        debug!(
            edge = %edge_id,
            out_vertex = %out_vertex,
            in_vertex = %in_vertex,
            label,
            "added edge"
        );
        Ok(EdgeHandle::new(self, edge_id, in_vertex, Arc::from(label)))
    }

    /// Returns a handle to an existing edge, with its in-vertex and label
    /// resolved from the out-vertex row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the out-vertex row or the edge entry
    /// is absent.
    pub fn get_edge(&self, id: EdgeId) -> Result<EdgeHandle<'_>> {
        let (out_vertex, local) = id.decompose();
        let row = self.vertex_row(out_vertex)?;
        let (in_vertex, label) =
            self.resolve_edge(&row, local)?.ok_or(Error::NotFound(NotFoundKind::Edge))?;
        Ok(EdgeHandle::new(self, id, in_vertex, label))
    }

    /// Removes an edge from both of its rows, together with every property
    /// scoped to it, and withdraws those properties from edge indices.
    ///
    /// # Errors
    ///
    /// - [`Error::DanglingEndpoint`] if either endpoint row is absent.
    /// - [`Error::NotFound`] if the out-vertex has no such edge.
    /// - [`Error::LockTimeout`] if a row lock is not granted in time.
    pub fn remove_edge(&self, id: EdgeId) -> Result<()> {
        let table = self.layout.vertex_table();
        let out_edges = self.layout.out_edges_family();
        let edge_properties = self.layout.edge_properties_family();
        let (out_vertex, local) = id.decompose();

        let in_vertex = self.edge_in_vertex(out_vertex, local)?;
        if self.vertex_row(in_vertex)?.is_empty() {
            return Err(Error::DanglingEndpoint(in_vertex));
        }

        let guard = RowLockGuard::acquire(
            self.store.as_ref(),
            table,
            &[&out_vertex.as_bytes()[..], &in_vertex.as_bytes()[..]],
            self.config.lock_timeout,
        )?;
        let out_row = self.vertex_row(out_vertex)?;
        if out_row.is_empty() {
            return Err(Error::DanglingEndpoint(out_vertex));
        }
        if !out_row.contains(out_edges, local.as_bytes()) {
            return Err(Error::NotFound(NotFoundKind::Edge));
        }

        let mut delete = Delete::new(out_vertex.as_bytes().to_vec())
            .column(out_edges, local.as_bytes().to_vec());
        let mut withdrawn = Vec::new();
        for (column, value) in out_row.columns(edge_properties) {
            let Some((key, owner)) = PropertyId::split(column) else {
                continue;
            };
            if owner != local {
                continue;
            }
            delete.push_column(edge_properties, column);
            if key != LABEL_KEY.as_bytes() {
                withdrawn.push((utf8(key)?.to_string(), decode_value(value)?));
            }
        }
        self.store
            .delete(table, delete, guard.lock_for(out_vertex.as_bytes()))?;

        let in_delete = Delete::new(in_vertex.as_bytes().to_vec())
            .column(self.layout.in_edges_family(), local.as_bytes().to_vec());
        if let Err(err) = self
            .store
            .delete(table, in_delete, guard.lock_for(in_vertex.as_bytes()))
        {
            warn!(edge = %id, error = %err, "in-vertex delete failed after out-vertex delete, edge is one-sided");
            return Err(err);
        }
        drop(guard);

        for (key, value) in &withdrawn {
            self.reindex(ElementKind::Edge, id.as_bytes(), key, Some(value), None)?;
        }

        debug!(edge = %id, "removed edge");
        Ok(())
    }

    // === Index Operations ===

    /// Creates an automatic index over `keys` of elements of `kind`.
    ///
    /// Elements already holding an indexed key are not back-filled; only
    /// property mutations after creation are recorded.
    ///
    /// # Errors
    ///
    /// - [`Error::IndexAlreadyExists`] if `name` is registered.
    /// - [`Error::SchemaConflict`] if a physical table name is taken.
    pub fn create_automatic_index(
        &self,
        name: &str,
        kind: ElementKind,
        keys: &[&str],
    ) -> Result<Arc<AutomaticIndex>> {
        let _admin = self.admin.lock();
        if self.registry.get(name).is_some() {
            return Err(Error::IndexAlreadyExists(name.to_string()));
        }
        let index = self.catalog.create(name, kind, keys)?;
        Ok(self.registry.insert(index))
    }

    /// Returns a live index by name, loading it from the registry table if
    /// another process created it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such index exists.
    pub fn get_index(&self, name: &str) -> Result<Arc<AutomaticIndex>> {
        if let Some(index) = self.registry.get(name) {
            return Ok(index);
        }
        let _admin = self.admin.lock();
        match self.registry.get(name) {
            Some(index) => Ok(index),
            None => Ok(self.registry.insert(self.catalog.get(name)?)),
        }
    }

    /// Scans the registry table from scratch and returns every index.
    pub fn list_indices(&self) -> Result<Vec<IndexDescriptor>> {
        Ok(self
            .catalog
            .list()?
            .into_iter()
            .map(|index| index.descriptor().clone())
            .collect())
    }

    /// Drops an index and all of its tables. Dropping an unknown name is a
    /// no-op.
    pub fn drop_index(&self, name: &str) -> Result<()> {
        self.drop_index_inner(name).map(|_| ())
    }

    /// Drops an index and all of its tables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such index exists.
    pub fn drop_index_strict(&self, name: &str) -> Result<()> {
        if self.drop_index_inner(name)? {
            Ok(())
        } else {
            Err(Error::NotFound(NotFoundKind::Index(name.to_string())))
        }
    }

    fn drop_index_inner(&self, name: &str) -> Result<bool> {
        let _admin = self.admin.lock();
        let live = self.registry.remove(name).is_some();
        let persisted = self.catalog.drop(name)?;
        Ok(live || persisted)
    }

    /// Resolves the vertices recorded under `value` for `key` in a vertex
    /// index.
    ///
    /// Ids whose vertex has disappeared, or whose current value no longer
    /// matches, are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown index and
    /// [`Error::SchemaConflict`] for an edge index.
    pub fn lookup_vertices(
        &self,
        index: &str,
        key: &str,
        value: &Value,
    ) -> Result<Vec<VertexHandle<'_>>> {
        let index = self.index_of_kind(index, ElementKind::Vertex)?;
        let encoded = encode_value(value)?;
        let mut hits = Vec::new();
        for raw in index.lookup(key, value)? {
            let id = VertexId::from_bytes(&raw)?;
            let row = self.vertex_row(id)?;
            if row.is_empty() {
                continue;
            }
            let current = row.get(self.layout.properties_family(), key.as_bytes());
            if current == Some(encoded.as_slice()) {
                hits.push(VertexHandle::new(self, id));
            }
        }
        Ok(hits)
    }

    /// Resolves the edges recorded under `value` for `key` in an edge index,
    /// skipping stale ids as [`GraphStore::lookup_vertices`] does.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown index and
    /// [`Error::SchemaConflict`] for a vertex index.
    pub fn lookup_edges(
        &self,
        index: &str,
        key: &str,
        value: &Value,
    ) -> Result<Vec<EdgeHandle<'_>>> {
        let index = self.index_of_kind(index, ElementKind::Edge)?;
        let encoded = encode_value(value)?;
        let mut hits = Vec::new();
        for raw in index.lookup(key, value)? {
            let id = EdgeId::from_bytes(&raw)?;
            let (out_vertex, local) = id.decompose();
            let row = self.vertex_row(out_vertex)?;
            let Some((in_vertex, label)) = self.resolve_edge(&row, local)? else {
                continue;
            };
            let current = row.get(
                self.layout.edge_properties_family(),
                PropertyId::compose(key, local).as_bytes(),
            );
            if current == Some(encoded.as_slice()) {
                hits.push(EdgeHandle::new(self, id, in_vertex, label));
            }
        }
        Ok(hits)
    }

    fn index_of_kind(&self, name: &str, kind: ElementKind) -> Result<Arc<AutomaticIndex>> {
        let index = self.get_index(name)?;
        if index.kind() != kind {
            return Err(Error::SchemaConflict(format!(
                "index '{name}' covers {}, not {kind}",
                index.kind()
            )));
        }
        Ok(index)
    }

    // === Vertex Properties ===

    pub(crate) fn vertex_property(&self, id: VertexId, key: &str) -> Result<Option<Value>> {
        validate_key(key, ElementKind::Vertex)?;
        let row = self.existing_vertex_row(id)?;
        row.get(self.layout.properties_family(), key.as_bytes())
            .map(decode_value)
            .transpose()
    }

    pub(crate) fn set_vertex_property(&self, id: VertexId, key: &str, value: Value) -> Result<()> {
        validate_key(key, ElementKind::Vertex)?;
        let encoded = encode_value(&value)?;
        let family = self.layout.properties_family();

        let guard = self.lock_vertex_row(id)?;
        let row = self.existing_vertex_row(id)?;
        let previous = row
            .get(family, key.as_bytes())
            .map(decode_value)
            .transpose()?;
        let put = Put::new(id.as_bytes().to_vec()).add(family, key.as_bytes(), encoded);
        self.store
            .put(self.layout.vertex_table(), put, guard.lock_for(id.as_bytes()))?;

        self.reindex(ElementKind::Vertex, id.as_bytes(), key, previous.as_ref(), Some(&value))
    }

    pub(crate) fn compare_and_set_vertex_property(
        &self,
        id: VertexId,
        key: &str,
        expected: Option<&Value>,
        value: Value,
    ) -> Result<bool> {
        validate_key(key, ElementKind::Vertex)?;
        let expected_bytes = expected.map(encode_value).transpose()?;
        let encoded = encode_value(&value)?;
        let family = self.layout.properties_family();

        let put = Put::new(id.as_bytes().to_vec()).add(family, key.as_bytes(), encoded);

        // An absent cell also matches on a removed row, so the unset case
        // writes under the row lock instead of swapping.
        let Some(expected_bytes) = expected_bytes else {
            let guard = self.lock_vertex_row(id)?;
            let row = self.existing_vertex_row(id)?;
            if row.contains(family, key.as_bytes()) {
                return Ok(false);
            }
            self.store
                .put(self.layout.vertex_table(), put, guard.lock_for(id.as_bytes()))?;
            self.reindex(ElementKind::Vertex, id.as_bytes(), key, None, Some(&value))?;
            return Ok(true);
        };

        self.existing_vertex_row(id)?;
        let swapped = self.store.check_and_put(
            self.layout.vertex_table(),
            family,
            key.as_bytes(),
            Some(expected_bytes.as_slice()),
            put,
        )?;
        if swapped {
            self.reindex(ElementKind::Vertex, id.as_bytes(), key, expected, Some(&value))?;
        }
        Ok(swapped)
    }

    pub(crate) fn remove_vertex_property(&self, id: VertexId, key: &str) -> Result<Option<Value>> {
        validate_key(key, ElementKind::Vertex)?;
        let family = self.layout.properties_family();
        let guard = self.lock_vertex_row(id)?;
        let row = self.existing_vertex_row(id)?;
        let Some(previous) = row.get(family, key.as_bytes()) else {
            return Ok(None);
        };
        let previous = decode_value(previous)?;

        let delete = Delete::new(id.as_bytes().to_vec()).column(family, key.as_bytes());
        self.store
            .delete(self.layout.vertex_table(), delete, guard.lock_for(id.as_bytes()))?;

        self.reindex(ElementKind::Vertex, id.as_bytes(), key, Some(&previous), None)?;
        Ok(Some(previous))
    }

    pub(crate) fn vertex_property_keys(&self, id: VertexId) -> Result<Vec<PropertyKey>> {
        let row = self.existing_vertex_row(id)?;
        row.columns(self.layout.properties_family())
            .filter(|(column, _)| *column != VERTEX_MARKER_COLUMN)
            .map(|(column, _)| -> Result<PropertyKey> { Ok(PropertyKey::from(utf8(column)?)) })
            .collect()
    }

    // === Edge Properties ===

    pub(crate) fn edge_property(&self, id: EdgeId, key: &str) -> Result<Option<Value>> {
        validate_key(key, ElementKind::Edge)?;
        let (out_vertex, local) = id.decompose();
        let row = self.existing_edge_row(out_vertex, local)?;
        row.get(
            self.layout.edge_properties_family(),
            PropertyId::compose(key, local).as_bytes(),
        )
        .map(decode_value)
        .transpose()
    }

    pub(crate) fn set_edge_property(&self, id: EdgeId, key: &str, value: Value) -> Result<()> {
        validate_key(key, ElementKind::Edge)?;
        let encoded = encode_value(&value)?;
        let family = self.layout.edge_properties_family();
        let (out_vertex, local) = id.decompose();
        let column = PropertyId::compose(key, local).into_bytes();

        let guard = self.lock_vertex_row(out_vertex)?;
        let row = self.existing_edge_row(out_vertex, local)?;
        let previous = row.get(family, &column).map(decode_value).transpose()?;
        let put = Put::new(out_vertex.as_bytes().to_vec()).add(family, column, encoded);
        self.store.put(
            self.layout.vertex_table(),
            put,
            guard.lock_for(out_vertex.as_bytes()),
        )?;

        self.reindex(ElementKind::Edge, id.as_bytes(), key, previous.as_ref(), Some(&value))
    }

    pub(crate) fn remove_edge_property(&self, id: EdgeId, key: &str) -> Result<Option<Value>> {
        validate_key(key, ElementKind::Edge)?;
        let family = self.layout.edge_properties_family();
        let (out_vertex, local) = id.decompose();
        let column = PropertyId::compose(key, local).into_bytes();

        let guard = self.lock_vertex_row(out_vertex)?;
        let row = self.existing_edge_row(out_vertex, local)?;
        let Some(previous) = row.get(family, &column) else {
            return Ok(None);
        };
        let previous = decode_value(previous)?;

        let delete = Delete::new(out_vertex.as_bytes().to_vec()).column(family, column);
        self.store.delete(
            self.layout.vertex_table(),
            delete,
            guard.lock_for(out_vertex.as_bytes()),
        )?;

        self.reindex(ElementKind::Edge, id.as_bytes(), key, Some(&previous), None)?;
        Ok(Some(previous))
    }

    pub(crate) fn edge_property_keys(&self, id: EdgeId) -> Result<Vec<PropertyKey>> {
        let (out_vertex, local) = id.decompose();
        let row = self.existing_edge_row(out_vertex, local)?;
        let mut keys = Vec::new();
        for (column, _) in row.columns(self.layout.edge_properties_family()) {
            match PropertyId::split(column) {
                Some((key, owner)) if owner == local && key != LABEL_KEY.as_bytes() => {
                    keys.push(PropertyKey::from(utf8(key)?));
                }
                _ => {}
            }
        }
        Ok(keys)
    }

    // === Adjacency ===

    pub(crate) fn out_edges(&self, id: VertexId, label: Option<&str>) -> Result<Vec<EdgeHandle<'_>>> {
        let row = self.existing_vertex_row(id)?;
        let mut edges = Vec::new();
        for (local, in_vertex) in row.columns(self.layout.out_edges_family()) {
            let local = EdgeLocalId::from_bytes(local)?;
            let in_vertex = VertexId::from_bytes(in_vertex)?;
            let edge_label = self.edge_label(&row, local)?;
            if label.is_none_or(|wanted| *wanted == *edge_label) {
                let edge_id = EdgeId::compose(id, local);
                edges.push(EdgeHandle::new(self, edge_id, in_vertex, edge_label));
            }
        }
        Ok(edges)
    }

    pub(crate) fn in_edges(&self, id: VertexId, label: Option<&str>) -> Result<Vec<EdgeHandle<'_>>> {
        let row = self.existing_vertex_row(id)?;
        let mut remote_rows: FxHashMap<VertexId, Row> = FxHashMap::default();
        let mut edges = Vec::new();

        for (_, edge_id) in row.columns(self.layout.in_edges_family()) {
            let edge_id = EdgeId::from_bytes(edge_id)?;
            let (out_vertex, local) = edge_id.decompose();
            if !remote_rows.contains_key(&out_vertex) {
                let fetched = self.vertex_row(out_vertex)?;
                remote_rows.insert(out_vertex, fetched);
            }
            let out_row = &remote_rows[&out_vertex];

            // Orphaned by a removed out-vertex.
            let Some((in_vertex, edge_label)) = self.resolve_edge(out_row, local)? else {
                continue;
            };
            if label.is_none_or(|wanted| *wanted == *edge_label) {
                edges.push(EdgeHandle::new(self, edge_id, in_vertex, edge_label));
            }
        }
        Ok(edges)
    }

    // === Row Access ===

    fn lock_vertex_row(&self, id: VertexId) -> Result<RowLockGuard<'_>> {
        RowLockGuard::acquire(
            self.store.as_ref(),
            self.layout.vertex_table(),
            &[&id.as_bytes()[..]],
            self.config.lock_timeout,
        )
    }

    pub(crate) fn vertex_row(&self, id: VertexId) -> Result<Row> {
        self.store.get(self.layout.vertex_table(), id.as_bytes())
    }

    fn existing_vertex_row(&self, id: VertexId) -> Result<Row> {
        let row = self.vertex_row(id)?;
        if row.is_empty() {
            return Err(Error::NotFound(NotFoundKind::Vertex));
        }
        Ok(row)
    }

    fn existing_edge_row(&self, out_vertex: VertexId, local: EdgeLocalId) -> Result<Row> {
        let row = self.vertex_row(out_vertex)?;
        if !row.contains(self.layout.out_edges_family(), local.as_bytes()) {
            return Err(Error::NotFound(NotFoundKind::Edge));
        }
        Ok(row)
    }

    /// Reads both endpoint rows and returns the out-vertex row.
    fn require_endpoints(&self, out_vertex: VertexId, in_vertex: VertexId) -> Result<Row> {
        let out_row = self.vertex_row(out_vertex)?;
        if out_row.is_empty() {
            return Err(Error::DanglingEndpoint(out_vertex));
        }
        if in_vertex != out_vertex && self.vertex_row(in_vertex)?.is_empty() {
            return Err(Error::DanglingEndpoint(in_vertex));
        }
        Ok(out_row)
    }

    /// Looks up the in-vertex of an edge in its out-vertex row.
    fn edge_in_vertex(&self, out_vertex: VertexId, local: EdgeLocalId) -> Result<VertexId> {
        let row = self.vertex_row(out_vertex)?;
        if row.is_empty() {
            return Err(Error::DanglingEndpoint(out_vertex));
        }
        let in_vertex = row
            .get(self.layout.out_edges_family(), local.as_bytes())
            .ok_or(Error::NotFound(NotFoundKind::Edge))?;
        VertexId::from_bytes(in_vertex)
    }

    /// Resolves in-vertex and label of edge `local` from its out-vertex row.
    fn resolve_edge(
        &self,
        out_row: &Row,
        local: EdgeLocalId,
    ) -> Result<Option<(VertexId, Arc<str>)>> {
        let Some(in_vertex) = out_row.get(self.layout.out_edges_family(), local.as_bytes()) else {
            return Ok(None);
        };
        let in_vertex = VertexId::from_bytes(in_vertex)?;
        Ok(Some((in_vertex, self.edge_label(out_row, local)?)))
    }

    /// Reads the raw label column; a missing label reads as empty.
    fn edge_label(&self, out_row: &Row, local: EdgeLocalId) -> Result<Arc<str>> {
        let column = PropertyId::compose(LABEL_KEY, local);
        match out_row.get(self.layout.edge_properties_family(), column.as_bytes()) {
            Some(raw) => Ok(Arc::from(utf8(raw)?)),
            None => Ok(Arc::from("")),
        }
    }

    // === Index Fan-out ===

    /// Moves `element_id` from the entry for `old` to the entry for `new` in
    /// every index covering `key` on `kind`.
    fn reindex(
        &self,
        kind: ElementKind,
        element_id: &[u8],
        key: &str,
        old: Option<&Value>,
        new: Option<&Value>,
    ) -> Result<()> {
        for index in self.registry.covering(kind, key) {
            if let Err(err) = update_index(&index, key, element_id, old, new) {
                warn!(
                    index = index.name(),
                    key,
                    error = %err,
                    "index update failed after property write"
                );
                return Err(err);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphStore")
            .field("config", &self.config)
            .field("indices", &self.registry.names())
            .finish_non_exhaustive()
    }
}

fn update_index(
    index: &AutomaticIndex,
    key: &str,
    element_id: &[u8],
    old: Option<&Value>,
    new: Option<&Value>,
) -> Result<()> {
    // Entries are keyed by encoding: 0.0 and -0.0 compare equal as values
    // but live in different rows.
    if let Some(old) = old {
        let replaced = match new {
            Some(new) => encode_value(old)? != encode_value(new)?,
            None => true,
        };
        if replaced {
            index.remove(key, old, element_id)?;
        }
    }
    if let Some(new) = new {
        index.put(key, new, element_id)?;
    }
    Ok(())
}

fn ensure_table(store: &dyn ColumnStore, descriptor: &TableDescriptor) -> Result<()> {
    if store.table_exists(descriptor.name())? {
        return Ok(());
    }
    match store.create_table(descriptor) {
        Ok(()) => {
            debug!(table = descriptor.name(), "bootstrapped table");
            Ok(())
        }
        Err(Error::Storage(StorageError::TableExists(_))) => Ok(()),
        Err(err) => Err(err),
    }
}

fn validate_key(key: &str, kind: ElementKind) -> Result<()> {
    if key.is_empty() || (kind == ElementKind::Edge && key == LABEL_KEY) {
        return Err(Error::InvalidPropertyKey(key.to_string()));
    }
    Ok(())
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8.into())
}
