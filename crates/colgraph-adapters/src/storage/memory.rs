//! In-memory column store.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use colgraph_common::utils::error::{Error, Result, StorageError};
use colgraph_common::utils::hash::{FxHashMap, FxHashSet};
use colgraph_core::storage::{
    ColumnStore, Delete, DeleteTarget, Put, Row, RowLock, TableDescriptor,
};
use parking_lot::{Condvar, Mutex, MutexGuard, RwLock};
use tracing::trace;

/// How long an unlocked write waits for a foreign row lock by default.
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

type LockKey = (String, Vec<u8>);
type HeldLocks = FxHashMap<LockKey, u64>;

struct MemTable {
    families: FxHashSet<String>,
    rows: RwLock<BTreeMap<Vec<u8>, Row>>,
}

impl MemTable {
    fn new(descriptor: &TableDescriptor) -> Self {
        Self {
            families: descriptor.families().iter().cloned().collect(),
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    fn check_family(&self, table: &str, family: &str) -> Result<()> {
        if self.families.contains(family) {
            Ok(())
        } else {
            Err(StorageError::UnknownFamily {
                table: table.to_string(),
                family: family.to_string(),
            }
            .into())
        }
    }
}

fn apply_put(rows: &mut BTreeMap<Vec<u8>, Row>, put: &Put) {
    if put.is_empty() {
        return;
    }
    let row = rows
        .entry(put.row().to_vec())
        .or_insert_with(|| Row::new(put.row().to_vec()));
    for cell in put.cells() {
        row.insert(&cell.family, cell.column.clone(), cell.value.clone());
    }
}

/// A thread-safe, in-process column store.
///
/// Rows of a table are kept sorted by key in a `BTreeMap`. Row locks live in
/// one lock table guarded by a mutex; writes to a locked row by anyone but
/// the holder wait on a condition variable until the lock is released or
/// the store's lock timeout elapses. Reads never wait.
///
/// # Example
///
/// ```ignore
/// use colgraph_adapters::MemColumnStore;
/// use colgraph_core::storage::{ColumnStore, Put, TableDescriptor};
///
/// let store = MemColumnStore::new();
/// store.create_table(&TableDescriptor::new("t").with_family("f"))?;
/// store.put("t", Put::new(b"r".to_vec()).add("f", b"c".to_vec(), b"v".to_vec()), None)?;
/// assert_eq!(store.get("t", b"r")?.get("f", b"c"), Some(&b"v"[..]));
/// ```
pub struct MemColumnStore {
    tables: RwLock<FxHashMap<String, Arc<MemTable>>>,
    held: Mutex<HeldLocks>,
    released: Condvar,
    next_token: AtomicU64,
    lock_timeout: Duration,
}

impl MemColumnStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Creates an empty store whose unlocked writes wait at most `timeout`
    /// for a foreign row lock.
    #[must_use]
    pub fn with_lock_timeout(timeout: Duration) -> Self {
        Self {
            tables: RwLock::new(FxHashMap::default()),
            held: Mutex::new(FxHashMap::default()),
            released: Condvar::new(),
            next_token: AtomicU64::new(0),
            lock_timeout: timeout,
        }
    }

    /// Returns the wait bound for unlocked writes.
    #[must_use]
    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Returns true if some caller holds the lock on `row`.
    #[must_use]
    pub fn is_locked(&self, table: &str, row: &[u8]) -> bool {
        self.held
            .lock()
            .contains_key(&(table.to_string(), row.to_vec()))
    }

    /// Returns the number of non-empty rows in a table.
    pub fn row_count(&self, table: &str) -> Result<usize> {
        Ok(self.table(table)?.rows.read().len())
    }

    fn table(&self, name: &str) -> Result<Arc<MemTable>> {
        self.tables
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::TableNotFound(name.to_string()).into())
    }

    /// Waits until `row` is writable by the caller and returns the lock-table
    /// guard. Holding the guard across the write keeps new locks out until
    /// the write is applied.
    fn write_access(
        &self,
        table: &str,
        row: &[u8],
        lock: Option<&RowLock>,
    ) -> Result<MutexGuard<'_, HeldLocks>> {
        let mut held = self.held.lock();
        let key = (table.to_string(), row.to_vec());

        if let Some(lock) = lock {
            if lock.table() != table || lock.row() != row || held.get(&key) != Some(&lock.token()) {
                return Err(StorageError::LockNotHeld(lock.token()).into());
            }
            return Ok(held);
        }

        self.wait_released(&mut held, &key, self.lock_timeout)?;
        Ok(held)
    }

    fn wait_released(
        &self,
        held: &mut MutexGuard<'_, HeldLocks>,
        key: &LockKey,
        timeout: Duration,
    ) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while held.contains_key(key) {
            if self.released.wait_until(held, deadline).timed_out() && held.contains_key(key) {
                return Err(Error::LockTimeout {
                    table: key.0.clone(),
                    timeout,
                });
            }
        }
        Ok(())
    }
}

impl Default for MemColumnStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnStore for MemColumnStore {
    fn create_table(&self, descriptor: &TableDescriptor) -> Result<()> {
        let mut tables = self.tables.write();
        if tables.contains_key(descriptor.name()) {
            return Err(StorageError::TableExists(descriptor.name().to_string()).into());
        }
        tables.insert(
            descriptor.name().to_string(),
            Arc::new(MemTable::new(descriptor)),
        );
        trace!(table = descriptor.name(), "created table");
        Ok(())
    }

    fn drop_table(&self, table: &str) -> Result<()> {
        match self.tables.write().remove(table) {
            Some(_) => {
                trace!(table, "dropped table");
                Ok(())
            }
            None => Err(StorageError::TableNotFound(table.to_string()).into()),
        }
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.tables.read().contains_key(table))
    }

    fn get(&self, table: &str, row: &[u8]) -> Result<Row> {
        let mem = self.table(table)?;
        let rows = mem.rows.read();
        Ok(rows.get(row).cloned().unwrap_or_else(|| Row::new(row.to_vec())))
    }

    fn put(&self, table: &str, put: Put, lock: Option<&RowLock>) -> Result<()> {
        let mem = self.table(table)?;
        for cell in put.cells() {
            mem.check_family(table, &cell.family)?;
        }

        let _access = self.write_access(table, put.row(), lock)?;
        apply_put(&mut mem.rows.write(), &put);
        Ok(())
    }

    fn delete(&self, table: &str, delete: Delete, lock: Option<&RowLock>) -> Result<()> {
        let mem = self.table(table)?;
        for target in delete.targets() {
            let family = match target {
                DeleteTarget::Column { family, .. } | DeleteTarget::Family(family) => family,
            };
            mem.check_family(table, family)?;
        }

        let _access = self.write_access(table, delete.row(), lock)?;
        let mut rows = mem.rows.write();
        if delete.is_whole_row() {
            rows.remove(delete.row());
            return Ok(());
        }

        let Some(row) = rows.get_mut(delete.row()) else {
            return Ok(());
        };
        for target in delete.targets() {
            match target {
                DeleteTarget::Column { family, column } => {
                    row.remove_column(family, column);
                }
                DeleteTarget::Family(family) => row.remove_family(family),
            }
        }
        if row.is_empty() {
            rows.remove(delete.row());
        }
        Ok(())
    }

    fn check_and_put(
        &self,
        table: &str,
        family: &str,
        column: &[u8],
        expected: Option<&[u8]>,
        put: Put,
    ) -> Result<bool> {
        let mem = self.table(table)?;
        mem.check_family(table, family)?;
        for cell in put.cells() {
            mem.check_family(table, &cell.family)?;
        }

        let _access = self.write_access(table, put.row(), None)?;
        let mut rows = mem.rows.write();
        let current = rows.get(put.row()).and_then(|row| row.get(family, column));
        if current != expected {
            return Ok(false);
        }
        apply_put(&mut rows, &put);
        Ok(true)
    }

    fn scan(&self, table: &str, family: &str) -> Result<Vec<Row>> {
        let mem = self.table(table)?;
        mem.check_family(table, family)?;
        let rows = mem.rows.read();
        Ok(rows
            .values()
            .filter(|row| row.family(family).is_some())
            .cloned()
            .collect())
    }

    fn lock_row(&self, table: &str, row: &[u8], timeout: Duration) -> Result<RowLock> {
        self.table(table)?;

        let mut held = self.held.lock();
        let key = (table.to_string(), row.to_vec());
        self.wait_released(&mut held, &key, timeout)?;

        let token = self.next_token.fetch_add(1, Ordering::Relaxed) + 1;
        held.insert(key, token);
        trace!(table, token, "row lock acquired");
        Ok(RowLock::new(table, row.to_vec(), token))
    }

    fn unlock_row(&self, lock: RowLock) -> Result<()> {
        let mut held = self.held.lock();
        let key = (lock.table().to_string(), lock.row().to_vec());
        if held.get(&key) != Some(&lock.token()) {
            return Err(StorageError::LockNotHeld(lock.token()).into());
        }
        held.remove(&key);
        self.released.notify_all();
        trace!(table = lock.table(), token = lock.token(), "row lock released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::thread;

    fn store_with_table() -> MemColumnStore {
        let store = MemColumnStore::with_lock_timeout(Duration::from_millis(50));
        store
            .create_table(&TableDescriptor::new("t").with_family("a").with_family("b"))
            .unwrap();
        store
    }

    fn put(row: &[u8], family: &str, column: &[u8], value: &[u8]) -> Put {
        Put::new(row.to_vec()).add(family, column.to_vec(), value.to_vec())
    }

    #[test]
    fn test_table_administration() {
        let store = store_with_table();

        assert!(store.table_exists("t").unwrap());
        assert!(matches!(
            store.create_table(&TableDescriptor::new("t")),
            Err(Error::Storage(StorageError::TableExists(_)))
        ));

        store.drop_table("t").unwrap();
        assert!(!store.table_exists("t").unwrap());
        assert!(matches!(
            store.get("t", b"r"),
            Err(Error::Storage(StorageError::TableNotFound(_)))
        ));
        assert!(matches!(
            store.drop_table("t"),
            Err(Error::Storage(StorageError::TableNotFound(_)))
        ));
    }

    #[test]
    fn test_put_get_delete() {
        let store = store_with_table();

        let multi = put(b"r", "a", b"x", b"1").add("b", b"y".to_vec(), b"2".to_vec());
        store.put("t", multi, None).unwrap();

        let row = store.get("t", b"r").unwrap();
        assert_eq!(row.get("a", b"x"), Some(&b"1"[..]));
        assert_eq!(row.get("b", b"y"), Some(&b"2"[..]));

        store
            .delete("t", Delete::new(b"r".to_vec()).column("a", b"x".to_vec()), None)
            .unwrap();
        let row = store.get("t", b"r").unwrap();
        assert!(!row.contains("a", b"x"));
        assert!(!row.is_empty());

        store.delete("t", Delete::new(b"r".to_vec()).family("b"), None).unwrap();
        assert!(store.get("t", b"r").unwrap().is_empty());
        assert_eq!(store.row_count("t").unwrap(), 0);
    }

    #[test]
    fn test_whole_row_delete() {
        let store = store_with_table();
        store.put("t", put(b"r", "a", b"x", b"1"), None).unwrap();
        store.delete("t", Delete::new(b"r".to_vec()), None).unwrap();
        assert!(store.get("t", b"r").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_family_rejected() {
        let store = store_with_table();
        assert!(matches!(
            store.put("t", put(b"r", "zzz", b"x", b"1"), None),
            Err(Error::Storage(StorageError::UnknownFamily { .. }))
        ));
        assert!(store.get("t", b"r").unwrap().is_empty());
    }

    #[test]
    fn test_check_and_put() {
        let store = store_with_table();

        assert!(store.check_and_put("t", "a", b"x", None, put(b"r", "a", b"x", b"1")).unwrap());
        assert!(!store.check_and_put("t", "a", b"x", None, put(b"r", "a", b"x", b"2")).unwrap());
        assert!(!store
            .check_and_put("t", "a", b"x", Some(b"9"), put(b"r", "a", b"x", b"2"))
            .unwrap());
        assert!(store
            .check_and_put("t", "a", b"x", Some(b"1"), put(b"r", "a", b"x", b"2"))
            .unwrap());

        assert_eq!(store.get("t", b"r").unwrap().get("a", b"x"), Some(&b"2"[..]));
    }

    #[test]
    fn test_scan_by_family() {
        let store = store_with_table();
        store.put("t", put(b"r1", "a", b"x", b"1"), None).unwrap();
        store.put("t", put(b"r2", "b", b"y", b"2"), None).unwrap();
        store.put("t", put(b"r3", "a", b"z", b"3"), None).unwrap();

        let keys: Vec<Vec<u8>> = store
            .scan("t", "a")
            .unwrap()
            .iter()
            .map(|row| row.key().to_vec())
            .collect();
        assert_eq!(keys, vec![b"r1".to_vec(), b"r3".to_vec()]);
    }

    #[test]
    fn test_lock_timeout_is_retryable() {
        let store = store_with_table();
        let lock = store.lock_row("t", b"r", Duration::from_millis(10)).unwrap();
        assert!(store.is_locked("t", b"r"));

        let err = store.lock_row("t", b"r", Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, Error::LockTimeout { .. }));
        assert!(err.is_retryable());

        // Other rows are unaffected.
        let other = store.lock_row("t", b"s", Duration::from_millis(10)).unwrap();
        store.unlock_row(other).unwrap();

        store.unlock_row(lock).unwrap();
        assert!(!store.is_locked("t", b"r"));
    }

    #[test]
    fn test_writes_respect_row_locks() {
        let store = store_with_table();
        let lock = store.lock_row("t", b"r", Duration::from_millis(10)).unwrap();

        assert!(matches!(
            store.put("t", put(b"r", "a", b"x", b"1"), None),
            Err(Error::LockTimeout { .. })
        ));
        store.put("t", put(b"r", "a", b"x", b"1"), Some(&lock)).unwrap();

        let foreign = store.lock_row("t", b"s", Duration::from_millis(10)).unwrap();
        assert!(matches!(
            store.put("t", put(b"r", "a", b"x", b"2"), Some(&foreign)),
            Err(Error::Storage(StorageError::LockNotHeld(_)))
        ));

        store.unlock_row(foreign).unwrap();
        store.unlock_row(lock).unwrap();
        store.put("t", put(b"r", "a", b"x", b"3"), None).unwrap();
        assert_eq!(store.get("t", b"r").unwrap().get("a", b"x"), Some(&b"3"[..]));
    }

    #[test]
    fn test_unlock_twice_fails() {
        let store = store_with_table();
        let lock = store.lock_row("t", b"r", Duration::from_millis(10)).unwrap();
        let stale = RowLock::new("t", b"r".to_vec(), lock.token());
        store.unlock_row(lock).unwrap();
        assert!(matches!(
            store.unlock_row(stale),
            Err(Error::Storage(StorageError::LockNotHeld(_)))
        ));
    }

    #[test]
    fn test_release_wakes_waiter() {
        let store = store_with_table();
        let lock = store.lock_row("t", b"r", Duration::from_millis(10)).unwrap();

        thread::scope(|s| {
            let waiter = s.spawn(|| store.lock_row("t", b"r", Duration::from_secs(5)));
            thread::sleep(Duration::from_millis(20));
            store.unlock_row(lock).unwrap();

            let acquired = waiter.join().unwrap().unwrap();
            store.unlock_row(acquired).unwrap();
        });
    }

    #[derive(Debug, Clone)]
    enum Op {
        Put(u8, u8, u8),
        DeleteColumn(u8, u8),
        DeleteRow(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..4, 0u8..4, any::<u8>()).prop_map(|(r, c, v)| Op::Put(r, c, v)),
            (0u8..4, 0u8..4).prop_map(|(r, c)| Op::DeleteColumn(r, c)),
            (0u8..4).prop_map(Op::DeleteRow),
        ]
    }

    proptest! {
        #[test]
        fn prop_matches_sorted_map_model(ops in proptest::collection::vec(op(), 0..64)) {
            let store = store_with_table();
            let mut model: BTreeMap<(u8, u8), u8> = BTreeMap::new();

            for op in ops {
                match op {
                    Op::Put(r, c, v) => {
                        store.put("t", put(&[r], "a", &[c], &[v]), None).unwrap();
                        model.insert((r, c), v);
                    }
                    Op::DeleteColumn(r, c) => {
                        store.delete("t", Delete::new(vec![r]).column("a", vec![c]), None).unwrap();
                        model.remove(&(r, c));
                    }
                    Op::DeleteRow(r) => {
                        store.delete("t", Delete::new(vec![r]), None).unwrap();
                        model.retain(|(mr, _), _| *mr != r);
                    }
                }
            }

            for r in 0u8..4 {
                let row = store.get("t", &[r]).unwrap();
                let cells: Vec<(u8, u8)> = row.columns("a").map(|(c, v)| (c[0], v[0])).collect();
                let expected: Vec<(u8, u8)> = model
                    .range((r, 0)..=(r, u8::MAX))
                    .map(|(&(_, c), &v)| (c, v))
                    .collect();
                prop_assert_eq!(cells, expected);
            }
            let live_rows = model.keys().map(|(r, _)| *r).collect::<FxHashSet<_>>().len();
            prop_assert_eq!(store.row_count("t").unwrap(), live_rows);
        }
    }
}
