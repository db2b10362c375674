//! Column-store backends.
//!
//! - [`MemColumnStore`] - In-process store with row locks, suitable for
//!   embedding and tests

mod memory;

pub use memory::MemColumnStore;
