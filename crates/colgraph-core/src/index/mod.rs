//! Automatic secondary indices.
//!
//! An automatic index covers one element kind and a fixed set of property
//! keys. Each key gets its own physical table; a row of that table is keyed
//! by an encoded property value and holds one column per element carrying
//! that value (column name and value both equal to the element id).
//!
//! - [`descriptor`] - Name, kind and key-to-table mapping of one index
//! - [`automatic`] - Entry maintenance and lookup against the index tables
//! - [`catalog`] - The persisted registry: create, get, list, drop
//! - [`registry`] - The live, in-process set of indices used for fan-out
//!
//! Index maintenance is not transactional with the property write that
//! triggers it, so lookups are best-effort relative to the primary record.

pub mod automatic;
pub mod catalog;
pub mod descriptor;
pub mod registry;

pub use automatic::AutomaticIndex;
pub use catalog::IndexCatalog;
pub use descriptor::IndexDescriptor;
pub use registry::IndexRegistry;
