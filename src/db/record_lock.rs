use crate::common::{OwnerId, RecordNo, Result};
use crate::record::Field;

use super::Store;

/// RAII guard for a held record lock.
/// Releases the lock when dropped.
pub struct RecordLock<'a> {
    store: &'a Store,
    rec_no: RecordNo,
    owner: OwnerId,
}

impl<'a> RecordLock<'a> {
    pub(crate) fn new(store: &'a Store, rec_no: RecordNo, owner: OwnerId) -> Self {
        Self {
            store,
            rec_no,
            owner,
        }
    }

    /// Returns the locked record number.
    pub fn rec_no(&self) -> RecordNo {
        self.rec_no
    }

    /// Overwrites the locked record.
    pub fn update<F: Field>(&self, fields: &[F]) -> Result<()> {
        self.store.update(self.rec_no, fields, self.owner)
    }

    /// Deletes the locked record. The lock is still released on drop.
    pub fn delete(&self) -> Result<()> {
        self.store.delete(self.rec_no, self.owner)
    }
}

impl Drop for RecordLock<'_> {
    fn drop(&mut self) {
        self.store.unlock(self.rec_no, self.owner);
    }
}
