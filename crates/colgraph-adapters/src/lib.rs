//! # colgraph-adapters
//!
//! Adapters layer for Colgraph: concrete column stores implementing
//! [`colgraph_core::storage::ColumnStore`].
//!
//! ## Modules
//!
//! - [`storage`] - Storage backends (in-memory)

pub mod storage;

pub use storage::MemColumnStore;
