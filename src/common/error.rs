use std::path::PathBuf;

use thiserror::Error;

use super::types::{OwnerId, RecordNo};

/// Store error types
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid database file '{}': {reason}", path.display())]
    InvalidFormat { path: PathBuf, reason: String },

    #[error("Record {0} does not exist")]
    RecordNotFound(RecordNo),

    #[error("Record {0} is marked as deleted")]
    RecordDeleted(RecordNo),

    #[error("Owner {owner} does not hold the lock of record {rec_no}")]
    NotLockOwner { rec_no: RecordNo, owner: OwnerId },

    #[error("Record is already present in database")]
    DuplicateKey,

    #[error("Values for columns {} too long", columns.join(", "))]
    ValueTooLong { columns: Vec<String> },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Database file seems corrupt: unsupported flag {flag:#04x} at record {rec_no}")]
    CorruptedFlag { rec_no: RecordNo, flag: u8 },
}

impl StoreError {
    /// Returns true for every error a caller sees as "record not found":
    /// a missing slot, a deleted slot, or a mutation without lock ownership.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::RecordNotFound(_)
                | StoreError::RecordDeleted(_)
                | StoreError::NotLockOwner { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
