use std::collections::HashMap;
use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::common::{
    Result, StoreError, COLUMN_COUNT_SIZE, FLAG_SIZE, MAGIC_COOKIE_SIZE,
};

/// Largest column name or value length a one-byte length field can describe.
pub const MAX_COLUMN_LENGTH: usize = u8::MAX as usize;

/// Largest column count a two-byte count field can describe.
pub const MAX_COLUMN_COUNT: usize = u16::MAX as usize;

/// Represents a single fixed-width column of the record schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name
    name: String,

    /// Maximum value length in bytes; every value is padded to exactly this width
    length: usize,

    /// Column position in the schema (0-indexed)
    ordinal: usize,

    /// Offset of the value inside a slot, counted from the flag byte
    offset: usize,
}

impl Column {
    /// Creates a new column definition.
    pub fn new(name: impl Into<String>, length: usize) -> Self {
        Self {
            name: name.into(),
            length,
            ordinal: 0, // Will be set by Schema
            offset: 0,  // Will be set by Schema
        }
    }

    /// Returns the column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value length in bytes.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Returns the column's ordinal position in the schema.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Returns the byte offset of this column's value inside a slot.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the size of this column's descriptor in the file header.
    pub fn descriptor_size(&self) -> usize {
        1 + self.name.len() + 1
    }

    /// Serializes the column descriptor.
    /// Format: name_len (1 byte) + name + value_len (1 byte)
    pub fn serialize(&self, buf: &mut BytesMut) {
        buf.put_u8(self.name.len() as u8);
        buf.put_slice(self.name.as_bytes());
        buf.put_u8(self.length as u8);
    }

    /// Deserializes a column descriptor, advancing the buffer past it.
    pub fn deserialize(buf: &mut impl Buf) -> Option<Self> {
        if buf.remaining() < 1 {
            return None;
        }
        let name_len = buf.get_u8() as usize;

        if buf.remaining() < name_len + 1 {
            return None;
        }
        let name = String::from_utf8_lossy(&buf.copy_to_bytes(name_len)).to_string();
        let length = buf.get_u8() as usize;

        Some(Column::new(name, length))
    }
}

/// The ordered column layout of a database file.
///
/// Column order defines both the on-disk field order and the index used by
/// every record and criteria slice.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Ordered list of columns
    columns: Vec<Column>,

    /// Map from column name to column index for fast lookup
    name_to_index: HashMap<String, usize>,

    /// Slot size: flag byte plus every column length
    record_length: usize,

    /// Offset of slot 0, i.e. the size of the file header
    data_section_start: usize,
}

impl Schema {
    /// Creates a new schema from a list of columns.
    pub fn new(columns: Vec<Column>) -> Self {
        let mut columns = columns;
        let mut name_to_index = HashMap::new();
        let mut record_length = FLAG_SIZE;
        let mut data_section_start = MAGIC_COOKIE_SIZE + COLUMN_COUNT_SIZE;

        for (i, col) in columns.iter_mut().enumerate() {
            col.ordinal = i;
            col.offset = record_length;
            name_to_index.insert(col.name.clone(), i);

            record_length += col.length;
            data_section_start += col.descriptor_size();
        }

        Self {
            columns,
            name_to_index,
            record_length,
            data_section_start,
        }
    }

    /// Creates a schema builder for fluent construction.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Returns the number of columns in the schema.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns the column at the given index.
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Returns the column with the given name.
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.name_to_index
            .get(name)
            .and_then(|&i| self.columns.get(i))
    }

    /// Returns the index of the column with the given name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Returns an iterator over all columns.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// Returns the size of one slot: flag byte plus all column lengths.
    pub fn record_length(&self) -> usize {
        self.record_length
    }

    /// Returns the size of the field data of one slot (without the flag).
    pub fn data_length(&self) -> usize {
        self.record_length - FLAG_SIZE
    }

    /// Returns the file offset of the first slot.
    pub fn data_section_start(&self) -> usize {
        self.data_section_start
    }

    /// Checks that the schema can be described by the file header.
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(StoreError::InvalidArgument(
                "schema must define at least one column".to_string(),
            ));
        }
        if self.columns.len() > MAX_COLUMN_COUNT {
            return Err(StoreError::InvalidArgument(format!(
                "schema defines {} columns, at most {} are supported",
                self.columns.len(),
                MAX_COLUMN_COUNT
            )));
        }
        for col in &self.columns {
            if col.name.len() > MAX_COLUMN_LENGTH {
                return Err(StoreError::InvalidArgument(format!(
                    "column name '{}' exceeds {} bytes",
                    col.name, MAX_COLUMN_LENGTH
                )));
            }
            if col.length == 0 || col.length > MAX_COLUMN_LENGTH {
                return Err(StoreError::InvalidArgument(format!(
                    "column '{}' has length {}, expected 1..={}",
                    col.name, col.length, MAX_COLUMN_LENGTH
                )));
            }
        }
        Ok(())
    }

    /// Serializes the column section of the header.
    /// Format: column_count (2 bytes, big-endian) + [column descriptors...]
    pub fn serialize(&self) -> Bytes {
        let mut buf =
            BytesMut::with_capacity(self.data_section_start - MAGIC_COOKIE_SIZE);

        buf.put_u16(self.columns.len() as u16);
        for col in &self.columns {
            col.serialize(&mut buf);
        }

        buf.freeze()
    }

    /// Deserializes the column section of the header.
    /// Returns None if the buffer ends before the last descriptor.
    pub fn deserialize(buf: &mut impl Buf) -> Option<Self> {
        if buf.remaining() < COLUMN_COUNT_SIZE {
            return None;
        }

        let column_count = buf.get_u16() as usize;
        let mut columns = Vec::with_capacity(column_count);

        for _ in 0..column_count {
            columns.push(Column::deserialize(buf)?);
        }

        Some(Schema::new(columns))
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}

impl Eq for Schema {}

/// Builder for constructing schemas fluently.
pub struct SchemaBuilder {
    columns: Vec<Column>,
}

impl SchemaBuilder {
    /// Creates a new schema builder.
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Adds a column of the given value length.
    pub fn column(mut self, name: impl Into<String>, length: usize) -> Self {
        self.columns.push(Column::new(name, length));
        self
    }

    /// Builds the schema.
    pub fn build(self) -> Schema {
        Schema::new(self.columns)
    }

    /// Builds the schema wrapped in an Arc for shared ownership.
    pub fn build_arc(self) -> Arc<Schema> {
        Arc::new(self.build())
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
