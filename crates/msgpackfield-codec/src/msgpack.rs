//! Marker-level MessagePack reading and writing for [`Value`].
//!
//! `rmp` supplies the marker table, the primitive readers and the encoders.
//! The reader peeks each marker first so that string payloads can follow the
//! selected [`BinaryMode`] and errors can carry the offset of the value.

use msgpackfield_types::{MapBuilder, Value};
use rmp::Marker;
use rmp::{decode, encode};
use std::fmt;

use crate::options::BinaryMode;
use crate::{Error, Result};

/// Reasons a byte sequence is not a single well-formed MessagePack value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnpackError {
    UnexpectedEof { offset: usize },
    InvalidUtf8 { offset: usize },
    ReservedMarker { offset: usize },
    DepthExceeded { offset: usize, max_depth: usize },
    ExtraData { offset: usize },
}

impl fmt::Display for UnpackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnpackError::UnexpectedEof { offset } => {
                write!(f, "unexpected end of input at offset {}", offset)
            }
            UnpackError::InvalidUtf8 { offset } => {
                write!(f, "invalid UTF-8 in string at offset {}", offset)
            }
            UnpackError::ReservedMarker { offset } => {
                write!(f, "reserved marker 0xc1 at offset {}", offset)
            }
            UnpackError::DepthExceeded { offset, max_depth } => write!(
                f,
                "nesting deeper than {} at offset {}",
                max_depth, offset
            ),
            UnpackError::ExtraData { offset } => {
                write!(f, "extra data after value at offset {}", offset)
            }
        }
    }
}

impl std::error::Error for UnpackError {}

/// Unpack exactly one value from `buf`.
///
/// A map key that repeats keeps its first position and its last value.
pub fn unpack(
    buf: &[u8],
    mode: BinaryMode,
    max_depth: usize,
) -> std::result::Result<Value, UnpackError> {
    let mut reader = Reader {
        rest: buf,
        len: buf.len(),
        mode,
        max_depth,
    };
    let value = reader.read_value(0)?;
    if !reader.rest.is_empty() {
        return Err(UnpackError::ExtraData {
            offset: reader.offset(),
        });
    }
    Ok(value)
}

struct Reader<'a> {
    rest: &'a [u8],
    len: usize,
    mode: BinaryMode,
    max_depth: usize,
}

/// Every `rmp::decode` failure on a peeked marker is a short read.
fn truncated<E>(offset: usize) -> impl FnOnce(E) -> UnpackError {
    move |_| UnpackError::UnexpectedEof { offset }
}

impl<'a> Reader<'a> {
    fn offset(&self) -> usize {
        self.len - self.rest.len()
    }

    fn peek(&self) -> std::result::Result<Marker, UnpackError> {
        self.rest
            .first()
            .map(|b| Marker::from_u8(*b))
            .ok_or(UnpackError::UnexpectedEof {
                offset: self.offset(),
            })
    }

    fn take(&mut self, n: usize) -> std::result::Result<&'a [u8], UnpackError> {
        let rest: &'a [u8] = self.rest;
        if n > rest.len() {
            return Err(UnpackError::UnexpectedEof {
                offset: self.offset(),
            });
        }
        let (head, tail) = rest.split_at(n);
        self.rest = tail;
        Ok(head)
    }

    fn read_value(&mut self, depth: usize) -> std::result::Result<Value, UnpackError> {
        let offset = self.offset();
        let marker = self.peek()?;
        let rd = &mut self.rest;
        let value = match marker {
            Marker::Reserved => return Err(UnpackError::ReservedMarker { offset }),
            Marker::Null => {
                decode::read_nil(rd).map_err(truncated(offset))?;
                Value::Nil
            }
            Marker::True | Marker::False => {
                Value::Bool(decode::read_bool(rd).map_err(truncated(offset))?)
            }
            Marker::FixPos(_) | Marker::U8 | Marker::U16 | Marker::U32 | Marker::U64 => {
                Value::UInt(decode::read_int::<u64, _>(rd).map_err(truncated(offset))?)
            }
            Marker::FixNeg(_) | Marker::I8 | Marker::I16 | Marker::I32 | Marker::I64 => {
                int(decode::read_int::<i64, _>(rd).map_err(truncated(offset))?)
            }
            Marker::F32 => Value::Float(decode::read_f32(rd).map_err(truncated(offset))?.into()),
            Marker::F64 => Value::Float(decode::read_f64(rd).map_err(truncated(offset))?),
            Marker::FixStr(_) | Marker::Str8 | Marker::Str16 | Marker::Str32 => {
                let len = decode::read_str_len(rd).map_err(truncated(offset))?;
                self.read_str(len as usize)?
            }
            Marker::Bin8 | Marker::Bin16 | Marker::Bin32 => {
                let len = decode::read_bin_len(rd).map_err(truncated(offset))?;
                Value::Bytes(self.take(len as usize)?.to_vec())
            }
            Marker::FixArray(_) | Marker::Array16 | Marker::Array32 => {
                let len = decode::read_array_len(rd).map_err(truncated(offset))?;
                self.read_array(len as usize, depth, offset)?
            }
            Marker::FixMap(_) | Marker::Map16 | Marker::Map32 => {
                let len = decode::read_map_len(rd).map_err(truncated(offset))?;
                self.read_map(len as usize, depth, offset)?
            }
            Marker::FixExt1
            | Marker::FixExt2
            | Marker::FixExt4
            | Marker::FixExt8
            | Marker::FixExt16
            | Marker::Ext8
            | Marker::Ext16
            | Marker::Ext32 => {
                let meta = decode::read_ext_meta(rd).map_err(truncated(offset))?;
                Value::Ext(meta.typeid, self.take(meta.size as usize)?.to_vec())
            }
        };
        Ok(value)
    }

    fn read_str(&mut self, len: usize) -> std::result::Result<Value, UnpackError> {
        let offset = self.offset();
        let data = self.take(len)?;
        match self.mode {
            BinaryMode::Utf8 => std::str::from_utf8(data)
                .map(|s| Value::String(s.to_string()))
                .map_err(|_| UnpackError::InvalidUtf8 { offset }),
            BinaryMode::Raw => Ok(Value::Bytes(data.to_vec())),
        }
    }

    fn check_depth(&self, depth: usize, offset: usize) -> std::result::Result<(), UnpackError> {
        if depth >= self.max_depth {
            return Err(UnpackError::DepthExceeded {
                offset,
                max_depth: self.max_depth,
            });
        }
        Ok(())
    }

    fn read_array(
        &mut self,
        len: usize,
        depth: usize,
        offset: usize,
    ) -> std::result::Result<Value, UnpackError> {
        self.check_depth(depth, offset)?;
        // Every element takes at least one byte.
        let mut items = Vec::with_capacity(len.min(self.rest.len()));
        for _ in 0..len {
            items.push(self.read_value(depth + 1)?);
        }
        Ok(Value::Array(items))
    }

    fn read_map(
        &mut self,
        len: usize,
        depth: usize,
        offset: usize,
    ) -> std::result::Result<Value, UnpackError> {
        self.check_depth(depth, offset)?;
        let mut entries = MapBuilder::with_capacity(len.min(self.rest.len() / 2));
        for _ in 0..len {
            let key = self.read_value(depth + 1)?;
            let value = self.read_value(depth + 1)?;
            entries.insert(key, value);
        }
        Ok(entries.finish())
    }
}

fn int(n: i64) -> Value {
    match u64::try_from(n) {
        Ok(u) => Value::UInt(u),
        Err(_) => Value::Int(n),
    }
}

/// Pack `value` onto the end of `out`.
pub fn pack(value: &Value, out: &mut Vec<u8>, use_bin_type: bool) -> Result<()> {
    match value {
        Value::Nil => encoded(encode::write_nil(out))?,
        Value::Bool(b) => encoded(encode::write_bool(out, *b))?,
        Value::Int(n) => encoded(encode::write_sint(out, *n))?,
        Value::UInt(n) => encoded(encode::write_uint(out, *n))?,
        Value::Float(f) => encoded(encode::write_f64(out, *f))?,
        Value::String(s) => {
            encoded(encode::write_str_len(out, len32(s.len(), "string")?))?;
            out.extend_from_slice(s.as_bytes());
        }
        Value::Bytes(b) => {
            let len = len32(b.len(), "bytes")?;
            if use_bin_type {
                encoded(encode::write_bin_len(out, len))?;
            } else {
                encoded(encode::write_str_len(out, len))?;
            }
            out.extend_from_slice(b);
        }
        Value::Ext(tag, data) => {
            encoded(encode::write_ext_meta(out, len32(data.len(), "ext")?, *tag))?;
            out.extend_from_slice(data);
        }
        Value::Array(items) => {
            encoded(encode::write_array_len(out, len32(items.len(), "array")?))?;
            for item in items {
                pack(item, out, use_bin_type)?;
            }
        }
        Value::Map(entries) => {
            encoded(encode::write_map_len(out, len32(entries.len(), "map")?))?;
            for (k, v) in entries {
                pack(k, out, use_bin_type)?;
                pack(v, out, use_bin_type)?;
            }
        }
    }
    Ok(())
}

fn encoded<T, E: fmt::Display>(result: std::result::Result<T, E>) -> Result<()> {
    result.map(|_| ()).map_err(|e| Error::Encode(e.to_string()))
}

fn len32(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| Error::Encode(format!("{} of length {} exceeds the MessagePack limit", what, len)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(value: &Value) -> Vec<u8> {
        let mut out = Vec::new();
        pack(value, &mut out, true).unwrap();
        out
    }

    #[test]
    fn test_pack_small_map() {
        let value = Value::Map(vec![("a".into(), Value::UInt(1))]);
        assert_eq!(packed(&value), vec![0x81, 0xa1, b'a', 0x01]);
    }

    #[test]
    fn test_unpack_scalars() {
        assert_eq!(unpack(&[0xc0], BinaryMode::Utf8, 8), Ok(Value::Nil));
        assert_eq!(unpack(&[0xc3], BinaryMode::Utf8, 8), Ok(Value::Bool(true)));
        assert_eq!(unpack(&[0xff], BinaryMode::Utf8, 8), Ok(Value::Int(-1)));
        assert_eq!(unpack(&[0xcd, 0x01, 0x00], BinaryMode::Utf8, 8), Ok(Value::UInt(256)));
        assert_eq!(unpack(&[0xd0, 0x05], BinaryMode::Utf8, 8), Ok(Value::UInt(5)));
    }

    #[test]
    fn test_negative_and_large_integers_round_trip() {
        for value in [Value::Int(-33), Value::Int(i64::MIN), Value::UInt(u64::MAX)] {
            assert_eq!(unpack(&packed(&value), BinaryMode::Utf8, 8), Ok(value));
        }
    }

    #[test]
    fn test_str_modes() {
        let bytes = [0xa2, b'h', b'i'];
        assert_eq!(unpack(&bytes, BinaryMode::Utf8, 8), Ok(Value::from("hi")));
        assert_eq!(
            unpack(&bytes, BinaryMode::Raw, 8),
            Ok(Value::Bytes(b"hi".to_vec()))
        );
    }

    #[test]
    fn test_invalid_utf8_only_fails_in_utf8_mode() {
        let bytes = [0xa2, 0xff, 0xfe];
        assert_eq!(
            unpack(&bytes, BinaryMode::Utf8, 8),
            Err(UnpackError::InvalidUtf8 { offset: 1 })
        );
        assert_eq!(
            unpack(&bytes, BinaryMode::Raw, 8),
            Ok(Value::Bytes(vec![0xff, 0xfe]))
        );
    }

    #[test]
    fn test_bin_is_bytes_in_both_modes() {
        let bytes = [0xc4, 0x02, 0x00, 0x01];
        for mode in [BinaryMode::Utf8, BinaryMode::Raw] {
            assert_eq!(unpack(&bytes, mode, 8), Ok(Value::Bytes(vec![0, 1])));
        }
    }

    #[test]
    fn test_legacy_bytes_use_str_type() {
        let mut out = Vec::new();
        pack(&Value::Bytes(vec![0x61]), &mut out, false).unwrap();
        assert_eq!(out, vec![0xa1, 0x61]);
    }

    #[test]
    fn test_ext_round_trip() {
        let value = Value::Ext(5, vec![1, 2, 3, 4]);
        let bytes = packed(&value);
        assert_eq!(bytes[0], 0xd6);
        assert_eq!(unpack(&bytes, BinaryMode::Utf8, 8), Ok(value));
    }

    #[test]
    fn test_truncated_input() {
        assert_eq!(
            unpack(&[], BinaryMode::Utf8, 8),
            Err(UnpackError::UnexpectedEof { offset: 0 })
        );
        assert_eq!(
            unpack(&[0x92, 0x01], BinaryMode::Utf8, 8),
            Err(UnpackError::UnexpectedEof { offset: 2 })
        );
        assert!(unpack(&[0xdb, 0xff, 0xff, 0xff, 0xff], BinaryMode::Raw, 8).is_err());
    }

    #[test]
    fn test_reserved_marker_and_extra_data() {
        assert_eq!(
            unpack(&[0xc1], BinaryMode::Utf8, 8),
            Err(UnpackError::ReservedMarker { offset: 0 })
        );
        assert_eq!(
            unpack(&[0x01, 0x02], BinaryMode::Utf8, 8),
            Err(UnpackError::ExtraData { offset: 1 })
        );
    }

    #[test]
    fn test_depth_limit() {
        let nested = [0x91, 0x91, 0x91, 0x90];
        assert!(unpack(&nested, BinaryMode::Utf8, 4).is_ok());
        assert_eq!(
            unpack(&nested, BinaryMode::Utf8, 3),
            Err(UnpackError::DepthExceeded {
                offset: 3,
                max_depth: 3
            })
        );
    }

    #[test]
    fn test_repeated_map_key_last_value_wins() {
        let bytes = [0x83, 0xa1, b'a', 0x01, 0xa1, b'b', 0x00, 0xa1, b'a', 0x02];
        let value = unpack(&bytes, BinaryMode::Utf8, 8).unwrap();
        assert_eq!(
            value,
            Value::Map(vec![("a".into(), Value::UInt(2)), ("b".into(), Value::UInt(0))])
        );
        assert_eq!(value.get("a"), Some(&Value::UInt(2)));
        assert_eq!(value.as_map().map(|m| m.len()), Some(2));
    }

    #[test]
    fn test_truncated_payloads() {
        assert_eq!(
            unpack(&[0xcd, 0x01], BinaryMode::Utf8, 8),
            Err(UnpackError::UnexpectedEof { offset: 0 })
        );
        assert_eq!(
            unpack(&[0x91, 0xa3, b'a'], BinaryMode::Utf8, 8),
            Err(UnpackError::UnexpectedEof { offset: 2 })
        );
        assert!(unpack(&[0xd6, 0x01, 0x00], BinaryMode::Utf8, 8).is_err());
    }

    #[test]
    fn test_non_string_map_keys() {
        let value = Value::Map(vec![(Value::UInt(1), Value::Nil), (Value::Nil, true.into())]);
        assert_eq!(unpack(&packed(&value), BinaryMode::Utf8, 8), Ok(value));
    }
}
