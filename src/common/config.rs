use std::collections::BTreeSet;

/// Magic cookie identifying a valid database file
pub const MAGIC_COOKIE: u32 = 515;

/// Size of the magic cookie in bytes
pub const MAGIC_COOKIE_SIZE: usize = 4;

/// Size of the column count field in bytes
pub const COLUMN_COUNT_SIZE: usize = 2;

/// Size of the per-record status flag in bytes
pub const FLAG_SIZE: usize = 1;

/// Flag byte of a valid record
pub const FLAG_VALID: u8 = 0x00;

/// Flag byte of a record marked as deleted
pub const FLAG_DELETED: u8 = 0xFF;

/// Byte used to right-pad field values to their column length
pub const PAD_BYTE: u8 = b' ';

/// Runtime configuration of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Magic cookie the file header must carry
    magic: u32,

    /// Column ordinals ignored by the duplicate-key check on create.
    /// `None` means "the last column of the schema".
    unique_exclusions: Option<BTreeSet<usize>>,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self {
            magic: MAGIC_COOKIE,
            unique_exclusions: None,
        }
    }

    /// Sets the expected magic cookie.
    pub fn with_magic(mut self, magic: u32) -> Self {
        self.magic = magic;
        self
    }

    /// Sets the column ordinals excluded from duplicate detection.
    pub fn with_unique_exclusions(mut self, ordinals: impl IntoIterator<Item = usize>) -> Self {
        self.unique_exclusions = Some(ordinals.into_iter().collect());
        self
    }

    pub fn magic(&self) -> u32 {
        self.magic
    }

    /// Resolves the excluded column ordinals against a schema of
    /// `column_count` columns. Out-of-range ordinals are dropped.
    pub fn unique_exclusions(&self, column_count: usize) -> BTreeSet<usize> {
        match &self.unique_exclusions {
            Some(set) => set.iter().copied().filter(|&i| i < column_count).collect(),
            None => column_count.checked_sub(1).into_iter().collect(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new()
    }
}
