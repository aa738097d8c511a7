use tracing::error;

use crate::common::{RecordNo, Result, StoreError};
use crate::record::RecordFlag;
use crate::storage::disk::FileManager;

/// Maps record numbers to slot offsets and enumerates slots by status.
///
/// There is no index: every scan walks the flag byte of every slot from
/// slot 0 up to the end of the file.
#[derive(Debug, Clone, Copy)]
pub struct RecordDirectory {
    /// File offset of slot 0
    data_section_start: u64,
    /// Size of one slot in bytes
    record_length: u64,
}

impl RecordDirectory {
    pub fn new(data_section_start: usize, record_length: usize) -> Self {
        Self {
            data_section_start: data_section_start as u64,
            record_length: record_length as u64,
        }
    }

    /// Offset of a slot, whether or not it has ever been written.
    pub fn offset_of(&self, rec_no: RecordNo) -> u64 {
        self.data_section_start + rec_no.as_u64() * self.record_length
    }

    /// Offset of a slot that exists in the file.
    /// Fails with `RecordNotFound` if the slot starts at or past end of file.
    pub fn position_of(&self, file: &FileManager, rec_no: RecordNo) -> Result<u64> {
        let offset = self.offset_of(rec_no);
        if offset >= file.len()? {
            return Err(StoreError::RecordNotFound(rec_no));
        }
        Ok(offset)
    }

    /// Reads the status flag of an existing slot.
    pub fn flag_of(&self, file: &mut FileManager, rec_no: RecordNo) -> Result<RecordFlag> {
        let offset = self.position_of(file, rec_no)?;
        let byte = file.read_byte_at(offset)?;
        Self::interpret(rec_no, byte)
    }

    /// Number of slots the file holds, counting a trailing partial slot.
    pub fn slot_count(&self, file: &FileManager) -> Result<u32> {
        let len = file.len()?;
        if len <= self.data_section_start {
            return Ok(0);
        }
        let data = len - self.data_section_start;
        Ok(data.div_ceil(self.record_length) as u32)
    }

    /// Collects, in slot order, every record number whose flag equals `wanted`.
    pub fn scan(&self, file: &mut FileManager, wanted: RecordFlag) -> Result<Vec<RecordNo>> {
        let mut result = Vec::new();
        for no in 0..self.slot_count(file)? {
            let rec_no = RecordNo::new(no);
            let byte = file.read_byte_at(self.offset_of(rec_no))?;
            if Self::interpret(rec_no, byte)? == wanted {
                result.push(rec_no);
            }
        }
        Ok(result)
    }

    /// All valid record numbers in slot order.
    pub fn valid_records(&self, file: &mut FileManager) -> Result<Vec<RecordNo>> {
        self.scan(file, RecordFlag::Valid)
    }

    /// All deleted record numbers in slot order.
    pub fn deleted_records(&self, file: &mut FileManager) -> Result<Vec<RecordNo>> {
        self.scan(file, RecordFlag::Deleted)
    }

    /// Slot a new record goes into: the lowest deleted slot if there is one,
    /// otherwise the slot numbered by the count of valid records.
    pub fn first_insert_slot(&self, file: &mut FileManager) -> Result<RecordNo> {
        let deleted = self.deleted_records(file)?;
        match deleted.first() {
            Some(&rec_no) => Ok(rec_no),
            None => Ok(RecordNo::new(self.valid_records(file)?.len() as u32)),
        }
    }

    fn interpret(rec_no: RecordNo, byte: u8) -> Result<RecordFlag> {
        RecordFlag::from_byte(byte).ok_or_else(|| {
            error!(%rec_no, flag = byte, "unsupported record flag, database file corrupt");
            StoreError::CorruptedFlag { rec_no, flag: byte }
        })
    }
}
