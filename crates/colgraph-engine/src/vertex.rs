//! Vertex handles.

use std::fmt;

use colgraph_common::types::{PropertyKey, Value, VertexId};
use colgraph_common::utils::error::Result;

use crate::edge::EdgeHandle;
use crate::graph::GraphStore;

/// A view of one vertex, bound to the store it came from.
///
/// Holds only the id; every accessor reads or writes through the store, so
/// a handle whose vertex was removed fails with `NotFound`.
#[derive(Clone, Copy)]
pub struct VertexHandle<'g> {
    graph: &'g GraphStore,
    id: VertexId,
}

impl<'g> VertexHandle<'g> {
    pub(crate) fn new(graph: &'g GraphStore, id: VertexId) -> Self {
        Self { graph, id }
    }

    /// Returns the vertex id.
    #[must_use]
    pub fn id(&self) -> VertexId {
        self.id
    }

    /// Returns the store this handle reads through.
    #[must_use]
    pub fn graph(&self) -> &'g GraphStore {
        self.graph
    }

    /// Reads a property.
    pub fn get_property(&self, key: &str) -> Result<Option<Value>> {
        self.graph.vertex_property(self.id, key)
    }

    /// Writes a property and updates every vertex index covering `key`.
    pub fn set_property(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.graph.set_vertex_property(self.id, key, value.into())
    }

    /// Writes a property only if its current value is `expected` (`None`
    /// meaning unset). Returns whether the write happened; indices are
    /// updated only if it did.
    pub fn compare_and_set_property(
        &self,
        key: &str,
        expected: Option<&Value>,
        value: impl Into<Value>,
    ) -> Result<bool> {
        self.graph
            .compare_and_set_vertex_property(self.id, key, expected, value.into())
    }

    /// Removes a property, returning its previous value.
    pub fn remove_property(&self, key: &str) -> Result<Option<Value>> {
        self.graph.remove_vertex_property(self.id, key)
    }

    /// Returns the keys of every property set on the vertex.
    pub fn property_keys(&self) -> Result<Vec<PropertyKey>> {
        self.graph.vertex_property_keys(self.id)
    }

    /// Returns every edge leaving this vertex.
    pub fn out_edges(&self) -> Result<Vec<EdgeHandle<'g>>> {
        self.graph.out_edges(self.id, None)
    }

    /// Returns the edges leaving this vertex with the given label.
    pub fn out_edges_with_label(&self, label: &str) -> Result<Vec<EdgeHandle<'g>>> {
        self.graph.out_edges(self.id, Some(label))
    }

    /// Returns every edge entering this vertex whose out-vertex still
    /// exists.
    pub fn in_edges(&self) -> Result<Vec<EdgeHandle<'g>>> {
        self.graph.in_edges(self.id, None)
    }

    /// Returns the edges entering this vertex with the given label.
    pub fn in_edges_with_label(&self, label: &str) -> Result<Vec<EdgeHandle<'g>>> {
        self.graph.in_edges(self.id, Some(label))
    }

    /// Removes the vertex. Incident edges are left in place.
    pub fn remove(self) -> Result<()> {
        self.graph.remove_vertex(self.id)
    }
}

impl PartialEq for VertexHandle<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && std::ptr::eq(self.graph, other.graph)
    }
}

impl Eq for VertexHandle<'_> {}

impl fmt::Debug for VertexHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VertexHandle").field(&self.id).finish()
    }
}
