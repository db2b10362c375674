//! Scoped row locks for edge and property mutations.

use std::time::Duration;

use colgraph_common::utils::error::Result;
use colgraph_core::storage::{ColumnStore, RowLock};
use smallvec::SmallVec;
use tracing::{trace, warn};

/// Row locks held for the duration of one graph mutation.
///
/// Rows are locked in the order given and released in reverse order when
/// the guard drops, on every exit path. A row listed twice is locked once.
pub(crate) struct RowLockGuard<'s> {
    store: &'s dyn ColumnStore,
    locks: SmallVec<[RowLock; 2]>,
}

impl<'s> RowLockGuard<'s> {
    /// Locks `rows` of `table` in order, each within `timeout`.
    ///
    /// If any acquisition fails, the locks already taken are released
    /// before the error is returned.
    pub(crate) fn acquire(
        store: &'s dyn ColumnStore,
        table: &str,
        rows: &[&[u8]],
        timeout: Duration,
    ) -> Result<Self> {
        let mut guard = Self {
            store,
            locks: SmallVec::new(),
        };
        for &row in rows {
            if guard.lock_for(row).is_some() {
                continue;
            }
            let lock = store.lock_row(table, row, timeout)?;
            trace!(table, token = lock.token(), "locked row");
            guard.locks.push(lock);
        }
        Ok(guard)
    }

    /// Returns the lock held on `row`.
    pub(crate) fn lock_for(&self, row: &[u8]) -> Option<&RowLock> {
        self.locks.iter().find(|lock| lock.row() == row)
    }
}

impl Drop for RowLockGuard<'_> {
    fn drop(&mut self) {
        while let Some(lock) = self.locks.pop() {
            let token = lock.token();
            match self.store.unlock_row(lock) {
                Ok(()) => trace!(token, "released row lock"),
                Err(err) => warn!(token, error = %err, "failed to release row lock"),
            }
        }
    }
}
