//! Edge handles.

use std::fmt;
use std::sync::Arc;

use colgraph_common::types::{EdgeId, PropertyKey, Value, VertexId};
use colgraph_common::utils::error::Result;

use crate::graph::GraphStore;
use crate::vertex::VertexHandle;

/// A view of one edge, bound to the store it came from.
///
/// In-vertex and label are resolved when the handle is created; properties
/// are read on demand from the out-vertex row.
#[derive(Clone)]
pub struct EdgeHandle<'g> {
    graph: &'g GraphStore,
    id: EdgeId,
    in_vertex: VertexId,
    label: Arc<str>,
}

impl<'g> EdgeHandle<'g> {
    pub(crate) fn new(
        graph: &'g GraphStore,
        id: EdgeId,
        in_vertex: VertexId,
        label: Arc<str>,
    ) -> Self {
        Self {
            graph,
            id,
            in_vertex,
            label,
        }
    }

    /// Returns the edge id.
    #[must_use]
    pub fn id(&self) -> EdgeId {
        self.id
    }

    /// Returns the label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the out-vertex id, the first half of the edge id.
    #[must_use]
    pub fn out_vertex_id(&self) -> VertexId {
        self.id.vertex_id()
    }

    /// Returns the in-vertex id.
    #[must_use]
    pub fn in_vertex_id(&self) -> VertexId {
        self.in_vertex
    }

    /// Returns a handle to the out-vertex, without checking it exists.
    #[must_use]
    pub fn out_vertex(&self) -> VertexHandle<'g> {
        VertexHandle::new(self.graph, self.out_vertex_id())
    }

    /// Returns a handle to the in-vertex, without checking it exists.
    #[must_use]
    pub fn in_vertex(&self) -> VertexHandle<'g> {
        VertexHandle::new(self.graph, self.in_vertex)
    }

    /// Reads a property. `"label"` is not a property; use
    /// [`EdgeHandle::label`].
    pub fn get_property(&self, key: &str) -> Result<Option<Value>> {
        self.graph.edge_property(self.id, key)
    }

    /// Writes a property and updates every edge index covering `key`.
    pub fn set_property(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.graph.set_edge_property(self.id, key, value.into())
    }

    /// Removes a property, returning its previous value.
    pub fn remove_property(&self, key: &str) -> Result<Option<Value>> {
        self.graph.remove_edge_property(self.id, key)
    }

    /// Returns the keys of every property set on the edge, label excluded.
    pub fn property_keys(&self) -> Result<Vec<PropertyKey>> {
        self.graph.edge_property_keys(self.id)
    }

    /// Removes the edge from both of its rows.
    pub fn remove(self) -> Result<()> {
        self.graph.remove_edge(self.id)
    }
}

impl fmt::Debug for EdgeHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeHandle")
            .field("id", &self.id)
            .field("in_vertex", &self.in_vertex)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
