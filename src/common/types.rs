use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Record number - the positional index of a slot in the data section.
///
/// A record's identity is its byte offset divided by the record length;
/// nothing is stored on disk to identify it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordNo(pub u32);

impl RecordNo {
    pub fn new(no: u32) -> Self {
        Self(no)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub fn as_u64(&self) -> u64 {
        self.0 as u64
    }
}

impl fmt::Display for RecordNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordNo({})", self.0)
    }
}

impl From<u32> for RecordNo {
    fn from(no: u32) -> Self {
        Self(no)
    }
}

static NEXT_OWNER_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a lock owner (a client session or worker thread).
///
/// Passed explicitly into every ownership-sensitive store call instead of
/// relying on the identity of the calling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(pub u64);

impl OwnerId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns a fresh owner id, unique within this process.
    pub fn next() -> Self {
        Self(NEXT_OWNER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerId({})", self.0)
    }
}
