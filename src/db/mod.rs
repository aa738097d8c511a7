mod record_lock;
mod store;

pub use record_lock::RecordLock;
pub use store::{LockOutcome, Store};
