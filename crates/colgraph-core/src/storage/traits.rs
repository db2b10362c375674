//! The [`ColumnStore`] trait.

use std::time::Duration;

use colgraph_common::utils::error::Result;

use super::row::{Delete, Put, Row};

/// Name and declared column families of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    name: String,
    families: Vec<String>,
}

impl TableDescriptor {
    /// Creates a descriptor with no families.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            families: Vec::new(),
        }
    }

    /// Declares a column family, builder style.
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.families.push(family.into());
        self
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared families.
    #[must_use]
    pub fn families(&self) -> &[String] {
        &self.families
    }
}

/// An exclusive lock on one row, issued by [`ColumnStore::lock_row`].
///
/// The token is not `Clone`: handing it back to
/// [`ColumnStore::unlock_row`] consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct RowLock {
    table: String,
    row: Vec<u8>,
    token: u64,
}

impl RowLock {
    /// Creates a lock token. Called by store implementations only.
    pub fn new(table: impl Into<String>, row: impl Into<Vec<u8>>, token: u64) -> Self {
        Self {
            table: table.into(),
            row: row.into(),
            token,
        }
    }

    /// Returns the table holding the locked row.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the locked row key.
    #[must_use]
    pub fn row(&self) -> &[u8] {
        &self.row
    }

    /// Returns the store-assigned token.
    #[must_use]
    pub fn token(&self) -> u64 {
        self.token
    }
}

/// A sorted, column-family key-value store with per-row atomicity.
///
/// Implementations must be thread-safe. Every method is a blocking call.
///
/// # Example
///
/// ```ignore
/// use colgraph_core::storage::{ColumnStore, Put};
///
/// fn example(store: &dyn ColumnStore) -> colgraph_common::Result<()> {
///     store.put("g", Put::new(b"row".to_vec()).add("g_properties", b"name".to_vec(), b"x".to_vec()), None)?;
///     let row = store.get("g", b"row")?;
///     assert!(row.contains("g_properties", b"name"));
///     Ok(())
/// }
/// ```
pub trait ColumnStore: Send + Sync {
    /// Creates a table.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::TableExists` if the name is taken.
    fn create_table(&self, descriptor: &TableDescriptor) -> Result<()>;

    /// Drops a table and all of its rows.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::TableNotFound` if the table does not exist.
    fn drop_table(&self, table: &str) -> Result<()>;

    /// Returns true if the table exists.
    fn table_exists(&self, table: &str) -> Result<bool>;

    /// Reads a whole row. An absent row is returned empty.
    fn get(&self, table: &str, row: &[u8]) -> Result<Row>;

    /// Writes every cell of `put` atomically.
    ///
    /// Without a lock, the write waits while another caller holds the row
    /// lock. With a lock, the lock must be held on `put`'s row.
    fn put(&self, table: &str, put: Put, lock: Option<&RowLock>) -> Result<()>;

    /// Applies `delete` atomically, with the same locking rules as
    /// [`ColumnStore::put`].
    fn delete(&self, table: &str, delete: Delete, lock: Option<&RowLock>) -> Result<()>;

    /// Applies `put` only if the cell `(family, column)` of `put`'s row
    /// currently holds `expected` (`None` meaning absent).
    ///
    /// Returns whether the put was applied.
    fn check_and_put(
        &self,
        table: &str,
        family: &str,
        column: &[u8],
        expected: Option<&[u8]>,
        put: Put,
    ) -> Result<bool>;

    /// Returns every row holding at least one cell in `family`.
    fn scan(&self, table: &str, family: &str) -> Result<Vec<Row>>;

    /// Acquires an exclusive lock on a row, waiting at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `Error::LockTimeout` if the lock is not granted in time.
    fn lock_row(&self, table: &str, row: &[u8], timeout: Duration) -> Result<RowLock>;

    /// Releases a row lock.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::LockNotHeld` if the token is not live.
    fn unlock_row(&self, lock: RowLock) -> Result<()>;
}
