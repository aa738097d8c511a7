use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};

use crate::common::{Result, StoreError, FLAG_DELETED, FLAG_SIZE, FLAG_VALID, PAD_BYTE};

use super::{Field, Schema};

/// Status flag stored in the first byte of every slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordFlag {
    Valid,
    Deleted,
}

impl RecordFlag {
    /// Interprets a flag byte. Any value but the two known ones is corruption.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            FLAG_VALID => Some(RecordFlag::Valid),
            FLAG_DELETED => Some(RecordFlag::Deleted),
            _ => None,
        }
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            RecordFlag::Valid => FLAG_VALID,
            RecordFlag::Deleted => FLAG_DELETED,
        }
    }
}

/// A decoded slot: the raw flag byte and the trimmed field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub flag: u8,
    pub fields: Vec<String>,
}

impl RawRecord {
    pub fn flag(&self) -> Option<RecordFlag> {
        RecordFlag::from_byte(self.flag)
    }
}

/// Encodes and decodes fixed-width slots for a schema.
///
/// ## Slot Binary Format
///
/// ```text
/// +------+-----------+-----------+-----+-----------+
/// | Flag | Field 0   | Field 1   | ... | Field n-1 |
/// | (1)  | (len 0)   | (len 1)   |     | (len n-1) |
/// +------+-----------+-----------+-----+-----------+
/// ```
///
/// Fields are left-justified and right-padded with spaces to exactly their
/// column length. There are no delimiters between fields.
#[derive(Debug, Clone)]
pub struct RecordCodec {
    schema: Arc<Schema>,
}

impl RecordCodec {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Checks a field slice against the schema without encoding it.
    ///
    /// Fails with `InvalidArgument` if the slice does not have one entry per
    /// column, and with `ValueTooLong` naming every column whose value is wider
    /// than the column.
    pub fn check<F: Field>(&self, fields: &[F]) -> Result<()> {
        if fields.len() != self.schema.column_count() {
            return Err(StoreError::InvalidArgument(format!(
                "expected {} fields, got {}",
                self.schema.column_count(),
                fields.len()
            )));
        }

        let columns: Vec<String> = self
            .schema
            .columns()
            .zip(fields)
            .filter(|(col, field)| field.value().map_or(0, str::len) > col.length())
            .map(|(col, _)| col.name().to_string())
            .collect();

        if columns.is_empty() {
            Ok(())
        } else {
            Err(StoreError::ValueTooLong { columns })
        }
    }

    /// Encodes the field data of a slot (everything after the flag byte).
    /// Absent fields are written as empty values.
    pub fn encode<F: Field>(&self, fields: &[F]) -> Result<Bytes> {
        self.check(fields)?;

        let mut buf = BytesMut::with_capacity(self.schema.data_length());
        for (col, field) in self.schema.columns().zip(fields) {
            let value = field.value().unwrap_or("").as_bytes();
            buf.put_slice(value);
            buf.put_bytes(PAD_BYTE, col.length() - value.len());
        }

        Ok(buf.freeze())
    }

    /// Encodes a whole slot: flag byte followed by the field data.
    pub fn encode_record<F: Field>(&self, flag: RecordFlag, fields: &[F]) -> Result<Bytes> {
        let data = self.encode(fields)?;

        let mut buf = BytesMut::with_capacity(self.schema.record_length());
        buf.put_u8(flag.as_byte());
        buf.put_slice(&data);

        Ok(buf.freeze())
    }

    /// Decodes a whole slot. The flag byte is returned as-is so the caller can
    /// report unknown values.
    pub fn decode(&self, raw: &[u8]) -> Option<RawRecord> {
        if raw.len() < self.schema.record_length() {
            return None;
        }

        let fields = self
            .schema
            .columns()
            .map(|col| {
                let bytes = &raw[col.offset()..col.offset() + col.length()];
                trim_padding(bytes)
            })
            .collect();

        Some(RawRecord {
            flag: raw[0],
            fields,
        })
    }

    /// Size of an encoded slot.
    pub fn record_length(&self) -> usize {
        self.schema.record_length()
    }

    /// Offset of the field data inside a slot.
    pub fn data_offset(&self) -> usize {
        FLAG_SIZE
    }
}

/// Strips trailing padding from a stored value.
fn trim_padding(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .rposition(|&b| b != PAD_BYTE && b != 0)
        .map_or(0, |i| i + 1);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
