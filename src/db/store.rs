use std::path::Path;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::common::{OwnerId, RecordNo, Result, StoreConfig, StoreError};
use crate::concurrency::LockTable;
use crate::record::{Field, Schema};
use crate::storage::table::TableFile;

use super::RecordLock;

/// Result of a lock attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum LockOutcome {
    /// The caller now holds the record lock
    Acquired,
    /// The caller was interrupted while waiting and holds nothing
    Cancelled,
}

/// State guarded by the store's single critical section
struct StoreState {
    table: TableFile,
    locks: LockTable,
}

/// Thread-safe record store over one database file.
///
/// Every operation runs inside one exclusive section that guards the file
/// handle and the lock table together, so no operation ever observes a
/// partially written record. `lock` is the only operation that leaves the
/// section while in progress: it waits on `lock_released` until the holder
/// of the record calls `unlock`.
///
/// Locks are advisory. `update` and `delete` refuse callers that do not own
/// the record lock, but reads and finds never look at the lock table.
pub struct Store {
    /// Schema of the open file (immutable)
    schema: Arc<Schema>,
    /// File and lock table
    state: Mutex<StoreState>,
    /// Signalled whenever a lock is released or a waiter is interrupted
    lock_released: Condvar,
}

impl Store {
    /// Opens an existing database file with the default configuration.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, StoreConfig::default())
    }

    /// Opens an existing database file.
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: StoreConfig) -> Result<Self> {
        let table = TableFile::open(path, &config)?;
        Ok(Self::from_table(table))
    }

    /// Creates a new, empty database file for `schema` and opens it.
    pub fn initialize<P: AsRef<Path>>(path: P, schema: &Schema, config: StoreConfig) -> Result<Self> {
        let table = TableFile::create(path, schema, &config)?;
        Ok(Self::from_table(table))
    }

    fn from_table(table: TableFile) -> Self {
        Self {
            schema: Arc::clone(table.schema()),
            state: Mutex::new(StoreState {
                table,
                locks: LockTable::new(),
            }),
            lock_released: Condvar::new(),
        }
    }

    /// Returns the schema of the database file.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Creates a new record and returns its number.
    ///
    /// The new record is not locked. A reused slot may still carry the lock
    /// of whoever deleted it; that lock is dropped and waiters are woken.
    pub fn create<F: Field>(&self, fields: &[F]) -> Result<RecordNo> {
        let (rec_no, stale) = {
            let mut state = self.state.lock();
            let rec_no = state.table.insert(fields)?;
            (rec_no, state.locks.clear(rec_no))
        };

        if let Some(owner) = stale {
            debug!(%rec_no, %owner, "dropped lock of deleted record on slot reuse");
            self.lock_released.notify_all();
        }
        Ok(rec_no)
    }

    /// Reads a valid record.
    pub fn read(&self, rec_no: RecordNo) -> Result<Vec<String>> {
        self.state.lock().table.read(rec_no)
    }

    /// Overwrites a record. `owner` must hold the record lock.
    pub fn update<F: Field>(&self, rec_no: RecordNo, fields: &[F], owner: OwnerId) -> Result<()> {
        let mut state = self.state.lock();
        Self::check_owner(&state.locks, rec_no, owner)?;
        state.table.update(rec_no, fields)
    }

    /// Marks a record as deleted. `owner` must hold the record lock, and
    /// keeps holding it until it calls `unlock`.
    pub fn delete(&self, rec_no: RecordNo, owner: OwnerId) -> Result<()> {
        let mut state = self.state.lock();
        Self::check_owner(&state.locks, rec_no, owner)?;
        state.table.delete(rec_no)
    }

    /// Returns, in slot order, the valid records matching every criterion by
    /// prefix. Absent or empty criteria match anything.
    pub fn find<C: Field>(&self, criteria: &[C]) -> Result<Vec<RecordNo>> {
        self.state.lock().table.find(criteria)
    }

    /// Acquires the lock of `rec_no` for `owner`, waiting as long as another
    /// owner holds it.
    ///
    /// Locking a record the caller already holds returns immediately. Once
    /// the lock is free the record must still be valid, otherwise the call
    /// fails with `RecordNotFound`/`RecordDeleted` and nothing is locked.
    /// If `interrupt(owner)` is called while waiting, the attempt is
    /// abandoned with `LockOutcome::Cancelled`.
    pub fn lock(&self, rec_no: RecordNo, owner: OwnerId) -> Result<LockOutcome> {
        let mut state = self.state.lock();

        while state.locks.is_held_by_other(rec_no, owner) {
            if state.locks.take_interrupt(owner) {
                debug!(%rec_no, %owner, "lock attempt cancelled");
                return Ok(LockOutcome::Cancelled);
            }
            self.lock_released.wait(&mut state);
        }

        state.table.check_valid(rec_no)?;
        state.locks.grant(rec_no, owner);

        debug!(%rec_no, %owner, "lock granted");
        Ok(LockOutcome::Acquired)
    }

    /// Acquires the lock of `rec_no` and returns a guard releasing it on drop.
    /// Returns `None` if the attempt was cancelled.
    pub fn lock_guard(&self, rec_no: RecordNo, owner: OwnerId) -> Result<Option<RecordLock<'_>>> {
        match self.lock(rec_no, owner)? {
            LockOutcome::Acquired => Ok(Some(RecordLock::new(self, rec_no, owner))),
            LockOutcome::Cancelled => Ok(None),
        }
    }

    /// Releases the lock of `rec_no` if `owner` holds it and wakes all
    /// waiters. Never fails: releasing a lock the caller does not hold,
    /// or of a record that no longer exists, is a no-op.
    pub fn unlock(&self, rec_no: RecordNo, owner: OwnerId) {
        {
            let mut state = self.state.lock();
            if state.locks.release(rec_no, owner) {
                debug!(%rec_no, %owner, "lock released");
            }
        }
        self.lock_released.notify_all();
    }

    /// Returns true if any owner holds the lock of `rec_no`.
    pub fn is_locked(&self, rec_no: RecordNo) -> bool {
        self.state.lock().locks.is_locked(rec_no)
    }

    /// Returns true if `owner` holds the lock of `rec_no`.
    pub fn owns_lock(&self, rec_no: RecordNo, owner: OwnerId) -> bool {
        self.state.lock().locks.is_owned_by(rec_no, owner)
    }

    /// Interrupts `owner`: a `lock` call it is blocked in (or its next
    /// blocking wait) returns `LockOutcome::Cancelled`. The interrupt is
    /// discarded if `owner` is granted a lock first.
    pub fn interrupt(&self, owner: OwnerId) {
        self.state.lock().locks.interrupt(owner);
        self.lock_released.notify_all();
    }

    /// Number of valid records.
    pub fn record_count(&self) -> Result<usize> {
        self.state.lock().table.record_count()
    }

    /// Number of physical slots, valid or deleted.
    pub fn slot_count(&self) -> Result<u32> {
        self.state.lock().table.slot_count()
    }

    /// Flushes the database file to disk.
    pub fn sync(&self) -> Result<()> {
        self.state.lock().table.sync()
    }

    fn check_owner(locks: &LockTable, rec_no: RecordNo, owner: OwnerId) -> Result<()> {
        if locks.is_owned_by(rec_no, owner) {
            Ok(())
        } else {
            warn!(%rec_no, %owner, "modification refused, caller does not own the lock");
            Err(StoreError::NotLockOwner { rec_no, owner })
        }
    }
}
