mod codec;
mod field;
mod schema;

pub use codec::{RawRecord, RecordCodec, RecordFlag};
pub use field::{matches_prefix, Field};
pub use schema::{Column, Schema, SchemaBuilder, MAX_COLUMN_COUNT, MAX_COLUMN_LENGTH};
