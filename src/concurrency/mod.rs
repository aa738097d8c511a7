mod lock_table;

pub use lock_table::*;
