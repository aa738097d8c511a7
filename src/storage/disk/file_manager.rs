use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::common::Result;

/// FileManager performs positioned reads and writes on a single database file.
///
/// It is not synchronized; the store serializes every access to it.
pub struct FileManager {
    /// The database file
    db_file: File,
    /// Path to the database file
    db_path: PathBuf,
}

impl FileManager {
    /// Opens an existing database file for reading and writing.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(db_path.as_ref())?;

        Ok(Self::from_file(file, db_path.as_ref()))
    }

    /// Creates a new, empty database file. Fails if the file already exists.
    pub fn create_new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(db_path.as_ref())?;

        Ok(Self::from_file(file, db_path.as_ref()))
    }

    fn from_file(file: File, path: &Path) -> Self {
        Self {
            db_file: file,
            db_path: path.to_path_buf(),
        }
    }

    /// Returns the current length of the file in bytes.
    pub fn len(&self) -> Result<u64> {
        Ok(self.db_file.metadata()?.len())
    }

    /// Returns true if the file holds no bytes at all.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Reads exactly `data.len()` bytes starting at `offset`.
    /// Fails with `UnexpectedEof` if the file ends first.
    pub fn read_at(&mut self, offset: u64, data: &mut [u8]) -> Result<()> {
        self.db_file.seek(SeekFrom::Start(offset))?;
        self.db_file.read_exact(data)?;
        Ok(())
    }

    /// Reads a single byte at `offset`.
    pub fn read_byte_at(&mut self, offset: u64) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.read_at(offset, &mut byte)?;
        Ok(byte[0])
    }

    /// Writes `data` starting at `offset`, extending the file if needed.
    pub fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        self.db_file.seek(SeekFrom::Start(offset))?;
        self.db_file.write_all(data)?;
        self.db_file.flush()?;
        Ok(())
    }

    /// Returns the path to the database file.
    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    /// Flushes any buffered writes to disk.
    pub fn sync(&self) -> Result<()> {
        self.db_file.sync_all()?;
        Ok(())
    }
}

impl Drop for FileManager {
    fn drop(&mut self) {
        let _ = self.db_file.sync_all();
    }
}
