use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use bytes::{Buf, BufMut, BytesMut};
use tracing::{debug, error, warn};

use crate::common::{
    RecordNo, Result, StoreConfig, StoreError, COLUMN_COUNT_SIZE, MAGIC_COOKIE_SIZE,
};
use crate::record::{matches_prefix, Field, RecordCodec, RecordFlag, Schema, MAX_COLUMN_LENGTH};
use crate::storage::disk::FileManager;

use super::RecordDirectory;

/// Single-file record table.
///
/// ## File Layout
///
/// ```text
/// +--------------+----------------+------------------------------+----------------+
/// | Magic (4 BE) | Columns (2 BE) | Column descriptors           | Data section   |
/// |              |                | [name_len(1) name len(1)]... | [slot][slot].. |
/// +--------------+----------------+------------------------------+----------------+
/// ```
///
/// TableFile performs the raw CRUD work and is not thread safe; `Store`
/// wraps it in its single critical section.
pub struct TableFile {
    file: FileManager,
    codec: RecordCodec,
    directory: RecordDirectory,
    /// Column ordinals ignored by the duplicate-key check
    unique_exclusions: BTreeSet<usize>,
}

impl TableFile {
    /// Opens an existing database file and parses its schema header.
    ///
    /// Fails with `InvalidFormat` if the file is missing, unreadable, carries
    /// the wrong magic cookie or ends inside the header.
    pub fn open<P: AsRef<Path>>(path: P, config: &StoreConfig) -> Result<Self> {
        let path = path.as_ref();
        let invalid = |reason: String| StoreError::InvalidFormat {
            path: path.to_path_buf(),
            reason,
        };

        let mut file = FileManager::open(path).map_err(|e| match e {
            StoreError::Io(io) if io.kind() == ErrorKind::NotFound => {
                invalid("file does not exist".to_string())
            }
            StoreError::Io(io) => invalid(format!("file is not readable: {io}")),
            other => other,
        })?;

        let schema = Self::read_header(&mut file, config.magic()).map_err(invalid)?;
        let schema = Arc::new(schema);

        debug!(
            path = %path.display(),
            columns = schema.column_count(),
            record_length = schema.record_length(),
            data_section_start = schema.data_section_start(),
            "opened database file"
        );

        Ok(Self::with_schema(file, schema, config))
    }

    /// Writes a new database file holding only the header for `schema`, then
    /// opens it. Refuses to overwrite an existing file.
    pub fn create<P: AsRef<Path>>(path: P, schema: &Schema, config: &StoreConfig) -> Result<Self> {
        schema.validate()?;

        let mut file = FileManager::create_new(path.as_ref())?;
        let columns = schema.serialize();

        let mut header = BytesMut::with_capacity(MAGIC_COOKIE_SIZE + columns.len());
        header.put_u32(config.magic());
        header.put_slice(&columns);
        file.write_at(0, &header)?;
        file.sync()?;

        debug!(path = %path.as_ref().display(), columns = schema.column_count(), "created database file");

        Ok(Self::with_schema(file, Arc::new(schema.clone()), config))
    }

    fn with_schema(file: FileManager, schema: Arc<Schema>, config: &StoreConfig) -> Self {
        let unique_exclusions = config.unique_exclusions(schema.column_count());
        let directory = RecordDirectory::new(schema.data_section_start(), schema.record_length());

        Self {
            file,
            codec: RecordCodec::new(schema),
            directory,
            unique_exclusions,
        }
    }

    /// Parses magic cookie and column section.
    fn read_header(file: &mut FileManager, magic: u32) -> std::result::Result<Schema, String> {
        let len = file.len().map_err(|e| e.to_string())?;
        let prefix = (MAGIC_COOKIE_SIZE + COLUMN_COUNT_SIZE) as u64;
        if len < prefix {
            return Err(format!("file is too short ({len} bytes) to hold a header"));
        }

        let mut fixed = [0u8; MAGIC_COOKIE_SIZE + COLUMN_COUNT_SIZE];
        file.read_at(0, &mut fixed).map_err(|e| e.to_string())?;
        let mut buf = &fixed[..];

        let found = buf.get_u32();
        if found != magic {
            return Err(format!(
                "magic cookie {found} does not match expected {magic}"
            ));
        }

        // Each descriptor is at most name_len + 255 name bytes + value_len.
        let column_count = buf.get_u16() as u64;
        let max_descriptors = column_count * (MAX_COLUMN_LENGTH as u64 + 2);
        let available = max_descriptors.min(len - prefix) as usize;

        let mut header = vec![0u8; COLUMN_COUNT_SIZE + available];
        header[..COLUMN_COUNT_SIZE].copy_from_slice(&fixed[MAGIC_COOKIE_SIZE..]);
        file.read_at(prefix, &mut header[COLUMN_COUNT_SIZE..])
            .map_err(|e| e.to_string())?;

        Schema::deserialize(&mut &header[..])
            .ok_or_else(|| "file ends inside the column descriptors".to_string())
    }

    pub fn schema(&self) -> &Arc<Schema> {
        self.codec.schema()
    }

    /// Reads a valid record.
    ///
    /// A slot cut short by the end of the file is reported as an invalid
    /// format, not as an I/O error.
    pub fn read(&mut self, rec_no: RecordNo) -> Result<Vec<String>> {
        let offset = self.directory.position_of(&self.file, rec_no)?;
        let record_length = self.codec.record_length();
        if offset + record_length as u64 > self.file.len()? {
            return Err(self.truncated(rec_no));
        }

        let mut raw = vec![0u8; record_length];
        self.file.read_at(offset, &mut raw)?;

        let record = self.codec.decode(&raw).ok_or_else(|| self.truncated(rec_no))?;

        match record.flag() {
            Some(RecordFlag::Valid) => Ok(record.fields),
            Some(RecordFlag::Deleted) => Err(StoreError::RecordDeleted(rec_no)),
            None => Err(StoreError::CorruptedFlag {
                rec_no,
                flag: record.flag,
            }),
        }
    }

    /// Fails with `RecordNotFound` or `RecordDeleted` unless the slot is valid.
    pub fn check_valid(&mut self, rec_no: RecordNo) -> Result<()> {
        match self.directory.flag_of(&mut self.file, rec_no)? {
            RecordFlag::Valid => Ok(()),
            RecordFlag::Deleted => Err(StoreError::RecordDeleted(rec_no)),
        }
    }

    /// Overwrites the field data of a valid record; the flag stays untouched.
    pub fn update<F: Field>(&mut self, rec_no: RecordNo, fields: &[F]) -> Result<()> {
        self.check_valid(rec_no)?;
        let data = self.codec.encode(fields)?;

        let offset = self.directory.offset_of(rec_no) + self.codec.data_offset() as u64;
        self.file.write_at(offset, &data)?;

        debug!(%rec_no, "updated record");
        Ok(())
    }

    /// Marks a valid record as deleted. Its field bytes stay in place until
    /// a later insert reuses the slot.
    pub fn delete(&mut self, rec_no: RecordNo) -> Result<()> {
        self.check_valid(rec_no)?;

        let offset = self.directory.offset_of(rec_no);
        self.file.write_at(offset, &[RecordFlag::Deleted.as_byte()])?;

        debug!(%rec_no, "deleted record");
        Ok(())
    }

    /// Inserts a new valid record into the lowest deleted slot, or appends it.
    ///
    /// Fails with `ValueTooLong` before anything else is checked, then with
    /// `DuplicateKey` if an existing record matches on every column that is
    /// not excluded from uniqueness.
    pub fn insert<F: Field>(&mut self, fields: &[F]) -> Result<RecordNo> {
        let slot = self.codec.encode_record(RecordFlag::Valid, fields)?;

        let criteria: Vec<Option<&str>> = fields
            .iter()
            .enumerate()
            .map(|(i, f)| {
                if self.unique_exclusions.contains(&i) {
                    None
                } else {
                    f.value()
                }
            })
            .collect();

        if !self.find(&criteria)?.is_empty() {
            warn!("rejected insert of duplicate record");
            return Err(StoreError::DuplicateKey);
        }

        let rec_no = self.directory.first_insert_slot(&mut self.file)?;
        self.file.write_at(self.directory.offset_of(rec_no), &slot)?;

        debug!(%rec_no, "created record");
        Ok(rec_no)
    }

    /// Returns, in slot order, every valid record matching all criteria by
    /// prefix. Criteria must have exactly one entry per column.
    pub fn find<C: Field>(&mut self, criteria: &[C]) -> Result<Vec<RecordNo>> {
        let column_count = self.codec.schema().column_count();
        if criteria.len() != column_count {
            return Err(StoreError::InvalidArgument(format!(
                "the number of criteria ({}) must match the number of columns ({})",
                criteria.len(),
                column_count
            )));
        }

        let mut found = Vec::new();
        for rec_no in self.directory.valid_records(&mut self.file)? {
            let record = self.read(rec_no)?;
            let matches = criteria
                .iter()
                .zip(&record)
                .all(|(c, value)| matches_prefix(c.value(), value));
            if matches {
                found.push(rec_no);
            }
        }
        Ok(found)
    }

    /// Number of valid records.
    pub fn record_count(&mut self) -> Result<usize> {
        Ok(self.directory.valid_records(&mut self.file)?.len())
    }

    /// Number of physical slots, valid or deleted.
    pub fn slot_count(&self) -> Result<u32> {
        self.directory.slot_count(&self.file)
    }

    /// Flushes the file to disk.
    pub fn sync(&self) -> Result<()> {
        self.file.sync()
    }

    fn truncated(&self, rec_no: RecordNo) -> StoreError {
        error!(%rec_no, "record cut short by end of file, database file corrupt");
        StoreError::InvalidFormat {
            path: self.file.get_db_path().to_path_buf(),
            reason: format!("record {rec_no} is truncated by the end of the file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn schema() -> Schema {
        Schema::builder()
            .column("name", 8)
            .column("city", 6)
            .column("owner", 4)
            .build()
    }

    fn create_table() -> (TableFile, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let table =
            TableFile::create(dir.path().join("t.db"), &schema(), &StoreConfig::default()).unwrap();
        (table, dir)
    }

    #[test]
    fn test_create_writes_header() {
        let (table, dir) = create_table();
        drop(table);

        let bytes = std::fs::read(dir.path().join("t.db")).unwrap();
        assert_eq!(&bytes[..4], &[0x00, 0x00, 0x02, 0x03]);
        assert_eq!(&bytes[4..6], &[0x00, 0x03]);
        assert_eq!(bytes.len(), schema().data_section_start());
    }

    #[test]
    fn test_open_reads_schema() {
        let (table, dir) = create_table();
        drop(table);

        let table = TableFile::open(dir.path().join("t.db"), &StoreConfig::default()).unwrap();
        assert_eq!(**table.schema(), schema());
        assert_eq!(table.slot_count().unwrap(), 0);
    }

    #[test]
    fn test_open_wrong_magic() {
        let (table, dir) = create_table();
        drop(table);

        let config = StoreConfig::new().with_magic(4242);
        assert!(matches!(
            TableFile::open(dir.path().join("t.db"), &config),
            Err(StoreError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_open_missing_and_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::default();

        assert!(matches!(
            TableFile::open(dir.path().join("missing.db"), &config),
            Err(StoreError::InvalidFormat { .. })
        ));

        let short = dir.path().join("short.db");
        std::fs::write(&short, [0x00, 0x00, 0x02]).unwrap();
        assert!(matches!(
            TableFile::open(&short, &config),
            Err(StoreError::InvalidFormat { .. })
        ));

        let cut = dir.path().join("cut.db");
        std::fs::write(&cut, [0x00, 0x00, 0x02, 0x03, 0x00, 0x02, 0x04, b'n']).unwrap();
        assert!(matches!(
            TableFile::open(&cut, &config),
            Err(StoreError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_create_refuses_existing_file() {
        let (_table, dir) = create_table();
        assert!(matches!(
            TableFile::create(dir.path().join("t.db"), &schema(), &StoreConfig::default()),
            Err(StoreError::Io(_))
        ));
    }

    #[test]
    fn test_insert_read_update_delete() {
        let (mut table, _dir) = create_table();

        let rec = table.insert(&["Fred", "Rome", ""]).unwrap();
        assert_eq!(rec, RecordNo::new(0));
        assert_eq!(table.read(rec).unwrap(), vec!["Fred", "Rome", ""]);

        table.update(rec, &["Fred", "Paris", "42"]).unwrap();
        assert_eq!(table.read(rec).unwrap(), vec!["Fred", "Paris", "42"]);

        table.delete(rec).unwrap();
        assert!(matches!(table.read(rec), Err(StoreError::RecordDeleted(_))));
        assert!(matches!(table.delete(rec), Err(StoreError::RecordDeleted(_))));
        assert!(matches!(table.check_valid(rec), Err(StoreError::RecordDeleted(_))));
        assert_eq!(table.slot_count().unwrap(), 1);
    }

    #[test]
    fn test_read_past_end() {
        let (mut table, _dir) = create_table();
        assert!(matches!(
            table.read(RecordNo::new(0)),
            Err(StoreError::RecordNotFound(_))
        ));
        assert!(matches!(
            table.check_valid(RecordNo::new(3)),
            Err(StoreError::RecordNotFound(_))
        ));
    }

    #[test]
    fn test_insert_value_too_long_before_duplicate_check() {
        let (mut table, _dir) = create_table();
        table.insert(&["Fred", "Rome", ""]).unwrap();

        let err = table.insert(&["Fred", "Romeville", "12345"]).unwrap_err();
        match err {
            StoreError::ValueTooLong { columns } => assert_eq!(columns, vec!["city", "owner"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_ignores_owner_column() {
        let (mut table, _dir) = create_table();
        table.insert(&["Fred", "Rome", "1"]).unwrap();

        assert!(matches!(
            table.insert(&["Fred", "Rome", "2"]),
            Err(StoreError::DuplicateKey)
        ));
        assert!(table.insert(&["Fred", "Milan", "1"]).is_ok());
    }

    #[test]
    fn test_configured_unique_exclusions() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::new().with_unique_exclusions([1, 2]);
        let mut table = TableFile::create(dir.path().join("t.db"), &schema(), &config).unwrap();

        table.insert(&["Fred", "Rome", "1"]).unwrap();
        assert!(matches!(
            table.insert(&["Fred", "Milan", "2"]),
            Err(StoreError::DuplicateKey)
        ));
        assert!(table.insert(&["Anna", "Rome", "1"]).is_ok());
    }

    #[test]
    fn test_insert_reuses_lowest_deleted_slot() {
        let (mut table, _dir) = create_table();
        for name in ["a", "b", "c", "d"] {
            table.insert(&[name, "x", ""]).unwrap();
        }
        table.delete(RecordNo::new(2)).unwrap();
        table.delete(RecordNo::new(1)).unwrap();

        assert_eq!(table.insert(&["e", "x", ""]).unwrap(), RecordNo::new(1));
        assert_eq!(table.insert(&["f", "x", ""]).unwrap(), RecordNo::new(2));
        assert_eq!(table.insert(&["g", "x", ""]).unwrap(), RecordNo::new(4));
    }

    #[test]
    fn test_find_by_prefix() {
        let (mut table, _dir) = create_table();
        table.insert(&["Fred", "Rome", ""]).unwrap();
        table.insert(&["Freddy", "Rome", ""]).unwrap();
        table.insert(&["Alfred", "Rome", ""]).unwrap();
        table.insert(&["fred", "Milan", ""]).unwrap();

        let found = table.find(&[Some("Fred"), None, None]).unwrap();
        assert_eq!(found, vec![RecordNo::new(0), RecordNo::new(1)]);

        let found = table.find(&["", "Mi", ""]).unwrap();
        assert_eq!(found, vec![RecordNo::new(3)]);

        assert_eq!(table.find(&[None::<&str>, None, None]).unwrap().len(), 4);
        assert!(matches!(
            table.find(&["Fred"]),
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_corrupt_flag_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        let mut table = TableFile::create(&path, &schema(), &StoreConfig::default()).unwrap();
        let rec = table.insert(&["Fred", "Rome", ""]).unwrap();
        drop(table);

        let mut bytes = std::fs::read(&path).unwrap();
        bytes[schema().data_section_start()] = 0x7F;
        std::fs::write(&path, bytes).unwrap();

        let mut table = TableFile::open(&path, &StoreConfig::default()).unwrap();
        assert!(matches!(
            table.read(rec),
            Err(StoreError::CorruptedFlag { flag: 0x7F, .. })
        ));
    }

    #[test]
    fn test_truncated_trailing_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        let mut table = TableFile::create(&path, &schema(), &StoreConfig::default()).unwrap();
        table.insert(&["Fred", "Rome", ""]).unwrap();
        drop(table);

        // A valid flag followed by only part of the field data.
        let mut bytes = std::fs::read(&path).unwrap();
        bytes.extend_from_slice(&[0x00, b'A', b'n']);
        std::fs::write(&path, bytes).unwrap();

        let mut table = TableFile::open(&path, &StoreConfig::default()).unwrap();
        assert_eq!(table.slot_count().unwrap(), 2);
        assert_eq!(table.read(RecordNo::new(0)).unwrap(), vec!["Fred", "Rome", ""]);
        assert!(matches!(
            table.read(RecordNo::new(1)),
            Err(StoreError::InvalidFormat { .. })
        ));
        assert!(matches!(
            table.find(&[None::<&str>, None, None]),
            Err(StoreError::InvalidFormat { .. })
        ));
    }
}
