//! Core type definitions for Colgraph.
//!
//! This module contains all fundamental types used throughout the graph store:
//! - Identifier types ([`VertexId`], [`EdgeLocalId`], [`EdgeId`], [`PropertyId`])
//! - Property types ([`Value`], [`PropertyKey`])
//! - Element discrimination ([`ElementKind`])

mod element;
mod id;
mod value;

pub use element::ElementKind;
pub use id::{
    EDGE_ID_WIDTH, EDGE_LOCAL_ID_WIDTH, EdgeId, EdgeLocalId, IdGenerator, PropertyId,
    VERTEX_ID_WIDTH, VertexId,
};
pub use value::{PropertyKey, Value};
