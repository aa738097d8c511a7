//! Bodgitt - a flat-file record store with per-record advisory locking
//!
//! This crate persists records, each an ordered list of strings, inside a
//! single binary file with a self-describing schema header. Records can be
//! created, read, updated, deleted and found by prefix match, and callers
//! coordinate writes through cooperative per-record locks.
//!
//! # Architecture
//!
//! The system is organized into several layers:
//!
//! - **Record** (`record`): Schema and fixed-width slot format
//!   - `Schema`/`Column`: Column layout parsed from the file header
//!   - `RecordCodec`: Encodes/decodes one slot (flag byte + padded fields)
//!
//! - **Storage Layer** (`storage`): File access and record organization
//!   - `FileManager`: Positioned reads and writes on the database file
//!   - `RecordDirectory`: Slot offsets and full scans by status flag
//!   - `TableFile`: Unsynchronized create/read/update/delete/find
//!
//! - **Concurrency** (`concurrency`): The in-memory `LockTable`
//!
//! - **Store** (`db`): The thread-safe `Store` and its `RecordLock` guard
//!
//! # Example
//!
//! ```rust,no_run
//! use bodgitt::common::{OwnerId, StoreConfig};
//! use bodgitt::db::Store;
//! use bodgitt::record::Schema;
//!
//! let schema = Schema::builder()
//!     .column("name", 32)
//!     .column("location", 64)
//!     .column("owner", 8)
//!     .build();
//! let store = Store::initialize("contractors.db", &schema, StoreConfig::default()).unwrap();
//!
//! let rec_no = store.create(&["Fred & Nobby", "Smallville", ""]).unwrap();
//!
//! let owner = OwnerId::next();
//! if let Some(lock) = store.lock_guard(rec_no, owner).unwrap() {
//!     lock.update(&["Fred & Nobby", "Smallville", "1234"]).unwrap();
//! }
//!
//! let found = store.find(&[Some("Fred"), None, None]).unwrap();
//! assert_eq!(found, vec![rec_no]);
//! ```

pub mod common;
pub mod concurrency;
pub mod db;
pub mod record;
pub mod storage;

// Re-export commonly used types at the crate root
pub use common::{OwnerId, RecordNo, Result, StoreConfig, StoreError};
pub use db::{LockOutcome, RecordLock, Store};
