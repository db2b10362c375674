//! Deterministic table, family and column naming.
//!
//! For a graph named `g`:
//!
//! | Object | Name |
//! |--------|------|
//! | vertex table | `g` |
//! | vertex properties family | `g_properties` |
//! | out-edges family | `g_outEdges` |
//! | in-edges family | `g_inEdges` |
//! | edge properties family | `gedge_properties` |
//! | index registry table | `g_indexes` |
//! | registry key family | `g_indexes_properties` |
//! | registry class family | `g_indexes_class` |
//! | per-key index table | `index-<name>-<key>` |
//! | per-key index family | `index-<name>-<key>-indexes` |
//!
//! The edge properties family has no separator after the graph name; stores
//! written by earlier releases use that spelling.

use crate::storage::TableDescriptor;

/// Reserved edge-property key holding the edge label.
pub const LABEL_KEY: &str = "label";

/// Column name of the cell that keeps a vertex row non-empty.
pub const VERTEX_MARKER_COLUMN: &[u8] = b"";

/// Column name of the element-class cell in a registry row.
pub const CLASS_COLUMN: &[u8] = b"";

const INDEX_TABLE_PREFIX: &str = "index";
const INDEX_FAMILY_SUFFIX: &str = "indexes";
const SEPARATOR: char = '-';

/// Naming authority for one graph. Pure, holds no mutable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaLayout {
    graph_name: String,
    properties_family: String,
    out_edges_family: String,
    in_edges_family: String,
    edge_properties_family: String,
    registry_table: String,
    registry_keys_family: String,
    registry_class_family: String,
}

impl SchemaLayout {
    /// Derives every name for `graph_name`.
    pub fn new(graph_name: impl Into<String>) -> Self {
        let graph_name = graph_name.into();
        let registry_table = format!("{graph_name}_indexes");
        Self {
            properties_family: format!("{graph_name}_properties"),
            out_edges_family: format!("{graph_name}_outEdges"),
            in_edges_family: format!("{graph_name}_inEdges"),
            edge_properties_family: format!("{graph_name}edge_properties"),
            registry_keys_family: format!("{registry_table}_properties"),
            registry_class_family: format!("{registry_table}_class"),
            registry_table,
            graph_name,
        }
    }

    /// Returns the graph name.
    #[must_use]
    pub fn graph_name(&self) -> &str {
        &self.graph_name
    }

    /// Returns the vertex table name.
    #[must_use]
    pub fn vertex_table(&self) -> &str {
        &self.graph_name
    }

    /// Returns the vertex properties family.
    #[must_use]
    pub fn properties_family(&self) -> &str {
        &self.properties_family
    }

    /// Returns the out-edges family (`EdgeLocalId -> in VertexId`).
    #[must_use]
    pub fn out_edges_family(&self) -> &str {
        &self.out_edges_family
    }

    /// Returns the in-edges family (`EdgeLocalId -> EdgeId`).
    #[must_use]
    pub fn in_edges_family(&self) -> &str {
        &self.in_edges_family
    }

    /// Returns the edge properties family (`PropertyId -> value`).
    #[must_use]
    pub fn edge_properties_family(&self) -> &str {
        &self.edge_properties_family
    }

    /// Returns the index registry table name.
    #[must_use]
    pub fn registry_table(&self) -> &str {
        &self.registry_table
    }

    /// Returns the registry family mapping indexed keys to index tables.
    #[must_use]
    pub fn registry_keys_family(&self) -> &str {
        &self.registry_keys_family
    }

    /// Returns the registry family holding each index's element class.
    #[must_use]
    pub fn registry_class_family(&self) -> &str {
        &self.registry_class_family
    }

    /// Returns the physical table name for one indexed key.
    #[must_use]
    pub fn index_table(&self, index_name: &str, key: &str) -> String {
        format!("{INDEX_TABLE_PREFIX}{SEPARATOR}{index_name}{SEPARATOR}{key}")
    }

    /// Returns the single family of an index table.
    #[must_use]
    pub fn index_family(index_table: &str) -> String {
        format!("{index_table}{SEPARATOR}{INDEX_FAMILY_SUFFIX}")
    }

    /// Describes the vertex table with its four families.
    #[must_use]
    pub fn vertex_table_descriptor(&self) -> TableDescriptor {
        TableDescriptor::new(self.vertex_table())
            .with_family(self.properties_family.as_str())
            .with_family(self.out_edges_family.as_str())
            .with_family(self.in_edges_family.as_str())
            .with_family(self.edge_properties_family.as_str())
    }

    /// Describes the index registry table.
    #[must_use]
    pub fn registry_table_descriptor(&self) -> TableDescriptor {
        TableDescriptor::new(self.registry_table.as_str())
            .with_family(self.registry_keys_family.as_str())
            .with_family(self.registry_class_family.as_str())
    }

    /// Describes a per-key index table.
    #[must_use]
    pub fn index_table_descriptor(index_table: &str) -> TableDescriptor {
        TableDescriptor::new(index_table).with_family(Self::index_family(index_table))
    }
}
