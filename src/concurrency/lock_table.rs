use std::collections::{HashMap, HashSet};

use crate::common::{OwnerId, RecordNo};

/// In-memory advisory lock map for one store.
///
/// A record number is present iff it is locked, with exactly one owner.
/// The table holds no synchronization of its own; the store mutates it only
/// inside its critical section.
#[derive(Debug, Default)]
pub struct LockTable {
    /// Currently locked records and their owners
    locks: HashMap<RecordNo, OwnerId>,
    /// Owners with a pending interrupt for their next blocking wait
    interrupted: HashSet<OwnerId>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if anyone holds the lock of `rec_no`.
    pub fn is_locked(&self, rec_no: RecordNo) -> bool {
        self.locks.contains_key(&rec_no)
    }

    /// Returns the owner of the lock of `rec_no`, if any.
    pub fn owner_of(&self, rec_no: RecordNo) -> Option<OwnerId> {
        self.locks.get(&rec_no).copied()
    }

    /// Returns true if `owner` holds the lock of `rec_no`.
    pub fn is_owned_by(&self, rec_no: RecordNo, owner: OwnerId) -> bool {
        self.owner_of(rec_no) == Some(owner)
    }

    /// Returns true if the record is held by an owner other than `owner`,
    /// i.e. `owner` would have to wait.
    pub fn is_held_by_other(&self, rec_no: RecordNo, owner: OwnerId) -> bool {
        matches!(self.owner_of(rec_no), Some(current) if current != owner)
    }

    /// Records `owner` as holder of `rec_no` and discards any interrupt
    /// pending for it.
    ///
    /// # Panics
    /// Panics in debug builds if another owner already holds the lock.
    pub fn grant(&mut self, rec_no: RecordNo, owner: OwnerId) {
        debug_assert!(
            !self.is_held_by_other(rec_no, owner),
            "lock of {rec_no} granted while held by another owner"
        );
        self.locks.insert(rec_no, owner);
        self.interrupted.remove(&owner);
    }

    /// Removes the lock of `rec_no` if `owner` holds it.
    /// Returns true if a lock was released.
    pub fn release(&mut self, rec_no: RecordNo, owner: OwnerId) -> bool {
        if self.is_owned_by(rec_no, owner) {
            self.locks.remove(&rec_no);
            true
        } else {
            false
        }
    }

    /// Marks `owner` as interrupted until it next waits or is granted a lock.
    pub fn interrupt(&mut self, owner: OwnerId) {
        self.interrupted.insert(owner);
    }

    /// Consumes a pending interrupt for `owner`.
    pub fn take_interrupt(&mut self, owner: OwnerId) -> bool {
        self.interrupted.remove(&owner)
    }

    /// Drops the lock of `rec_no` whoever holds it, returning the former owner.
    pub fn clear(&mut self, rec_no: RecordNo) -> Option<OwnerId> {
        self.locks.remove(&rec_no)
    }

    /// Number of locked records.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
