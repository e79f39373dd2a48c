//! rusqlite adapters for packed columns.

use msgpackfield_codec::Codec;
use msgpackfield_types::{RawInput, Value};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

/// Value bound as a packed BLOB parameter (`NULL` when absent).
///
/// Packing happens when the statement binds the parameter, so an unpackable
/// value surfaces as `rusqlite::Error::ToSqlConversionFailure`.
pub struct Packed<'a> {
    value: Option<&'a Value>,
    codec: &'a Codec,
}

impl<'a> Packed<'a> {
    pub fn new(value: Option<&'a Value>, codec: &'a Codec) -> Self {
        Self { value, codec }
    }
}

impl ToSql for Packed<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let packed = self
            .codec
            .encode(self.value)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        Ok(match packed {
            Some(bytes) => ToSqlOutput::Owned(rusqlite::types::Value::Blob(bytes)),
            None => ToSqlOutput::Owned(rusqlite::types::Value::Null),
        })
    }
}

/// Column contents before decoding.
///
/// BLOBs are packed values; TEXT is accepted as JSON for columns written by
/// tools that stored the edit-time form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredColumn(pub Option<RawInput>);

impl FromSql for StoredColumn {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(StoredColumn(None)),
            ValueRef::Blob(bytes) => Ok(StoredColumn(Some(RawInput::Binary(bytes.to_vec())))),
            ValueRef::Text(text) => Ok(StoredColumn(Some(RawInput::Text(
                String::from_utf8_lossy(text).into_owned(),
            )))),
            ValueRef::Integer(_) | ValueRef::Real(_) => Err(FromSqlError::InvalidType),
        }
    }
}

/// Column decoded with a default [`Codec`], for ad-hoc queries outside a
/// model store. Warnings go to `tracing`.
#[derive(Debug, Clone, PartialEq)]
pub struct Unpacked(pub Option<Value>);

impl FromSql for Unpacked {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let StoredColumn(raw) = StoredColumn::column_result(value)?;
        let codec = Codec::default();
        Ok(Unpacked(raw.and_then(|raw| codec.decode(&raw))))
    }
}
