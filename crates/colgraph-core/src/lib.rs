//! # colgraph-core
//!
//! Schema layer for Colgraph: the column-store contract the graph is mapped
//! onto, the deterministic naming of tables and families, and the automatic
//! secondary indices.
//!
//! This crate depends only on `colgraph-common`. Concrete column stores live
//! in `colgraph-adapters`.
//!
//! ## Modules
//!
//! - [`storage`] - Column-store contract (rows, mutations, row locks)
//! - [`schema`] - Table, family and composite column naming
//! - [`index`] - Automatic single-property equality indices

pub mod index;
pub mod schema;
pub mod storage;

pub use index::{AutomaticIndex, IndexCatalog, IndexDescriptor, IndexRegistry};
pub use schema::SchemaLayout;
pub use storage::{ColumnStore, Delete, Put, Row, RowLock, TableDescriptor};
