//! # colgraph-engine
//!
//! The main entry point for Colgraph: a directed, labeled property multigraph
//! with automatic secondary indices, stored in a column-family key-value
//! store.
//!
//! ## Modules
//!
//! - [`graph`] - The [`GraphStore`] facade and its physical layout
//! - [`vertex`] - Vertex handles: properties and adjacency
//! - [`edge`] - Edge handles: endpoints, label and properties
//! - [`config`] - Configuration options
//!
//! ## Example
//!
//! ```
//! use colgraph_engine::{Config, ElementKind, GraphStore, Value};
//!
//! let graph = GraphStore::in_memory(Config::new("social"))?;
//! graph.create_automatic_index("people", ElementKind::Vertex, &["age"])?;
//!
//! let alice = graph.add_vertex()?;
//! alice.set_property("age", 30i32)?;
//!
//! let hits = graph.lookup_vertices("people", "age", &Value::Int32(30))?;
//! assert_eq!(hits, vec![alice]);
//! # Ok::<(), colgraph_engine::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod edge;
pub mod graph;
mod locking;
pub mod vertex;

pub use config::Config;
pub use edge::EdgeHandle;
pub use graph::GraphStore;
pub use vertex::VertexHandle;

pub use colgraph_common::{
    EdgeId, ElementKind, Error, PropertyKey, Result, Value, VertexId,
};
pub use colgraph_core::index::{AutomaticIndex, IndexDescriptor};
