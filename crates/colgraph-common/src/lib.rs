//! # colgraph-common
//!
//! Foundation layer for Colgraph: identifiers, typed values, their byte
//! codecs, and the error taxonomy.
//!
//! This crate provides the fundamental building blocks used by all other
//! Colgraph crates. It has no internal dependencies and should be kept minimal.
//!
//! ## Modules
//!
//! - [`types`] - Core type definitions (VertexId, EdgeId, Value, ElementKind)
//! - [`codec`] - Bit-exact encoders for typed values
//! - [`utils`] - Utility functions and helpers (hashing, errors)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod codec;
pub mod types;
pub mod utils;

// Re-export commonly used types at crate root
pub use types::{EdgeId, EdgeLocalId, ElementKind, PropertyId, PropertyKey, Value, VertexId};
pub use utils::error::{Error, Result};
