//! Column-store contract.
//!
//! The graph is mapped onto a sorted, column-family key-value store. This
//! module defines the primitives the graph layer needs from such a store and
//! the value types exchanged with it:
//!
//! - [`row`] - Rows read back from the store and the mutations sent to it
//! - [`traits`] - The [`ColumnStore`] trait and the [`RowLock`] token
//!
//! # Guarantees expected from a store
//!
//! | Primitive | Guarantee |
//! |-----------|-----------|
//! | `put` / `delete` | atomic and isolated within one row |
//! | `check_and_put` | single-cell compare-and-swap, atomic with the put |
//! | `lock_row` | exclusive per row; writes by others wait for release |
//! | `scan` | finite and one-shot |
//!
//! Nothing spanning two rows is atomic.

pub mod row;
pub mod traits;

pub use row::{Cell, Delete, DeleteTarget, FamilyMap, Put, Row};
pub use traits::{ColumnStore, RowLock, TableDescriptor};
