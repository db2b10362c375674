//! Tagged scalar value codec.
//!
//! Wire format: one tag byte followed by the type's canonical payload.
//!
//! | Tag | Type | Payload |
//! |-----|------|---------|
//! | 0 | bytes | raw, variable |
//! | 1 | string | UTF-8, variable |
//! | 2 | int64 | 8 bytes BE |
//! | 3 | int32 | 4 bytes BE |
//! | 4 | int16 | 2 bytes BE |
//! | 5 | float32 | 4 bytes BE IEEE-754 |
//! | 6 | float64 | 8 bytes BE IEEE-754 |
//! | 7 | bool | 1 byte, `0xFF` / `0x00` |
//!
//! Encoded values double as index row keys, so the encoding is canonical:
//! equal values always produce equal bytes.

use byteorder::{BigEndian, ByteOrder};

use crate::types::Value;
use crate::utils::error::{CodecError, Result};

/// Historical marker for values of an unsupported type.
pub const NON_SUPPORTED_TAG: u8 = 100;

const TRUE_BYTE: u8 = 0xFF;
const FALSE_BYTE: u8 = 0x00;

/// Leading tag byte of an encoded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueTag {
    /// Raw byte sequence.
    Bytes = 0,
    /// UTF-8 string.
    String = 1,
    /// 64-bit signed integer.
    Int64 = 2,
    /// 32-bit signed integer.
    Int32 = 3,
    /// 16-bit signed integer.
    Int16 = 4,
    /// 32-bit float.
    Float32 = 5,
    /// 64-bit float.
    Float64 = 6,
    /// Boolean.
    Bool = 7,
}

impl ValueTag {
    /// Parses a tag byte.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnsupportedType`] for the non-supported marker
    /// and any byte outside the tag set.
    pub fn from_byte(byte: u8) -> Result<Self> {
        Ok(match byte {
            0 => Self::Bytes,
            1 => Self::String,
            2 => Self::Int64,
            3 => Self::Int32,
            4 => Self::Int16,
            5 => Self::Float32,
            6 => Self::Float64,
            7 => Self::Bool,
            NON_SUPPORTED_TAG => {
                return Err(CodecError::UnsupportedType("non-supported marker".into()).into());
            }
            other => return Err(CodecError::UnsupportedType(format!("tag {other}")).into()),
        })
    }

    /// Returns the tag for a value, if its type is encodable.
    #[must_use]
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Bytes(_) => Some(Self::Bytes),
            Value::String(_) => Some(Self::String),
            Value::Int64(_) => Some(Self::Int64),
            Value::Int32(_) => Some(Self::Int32),
            Value::Int16(_) => Some(Self::Int16),
            Value::Float32(_) => Some(Self::Float32),
            Value::Float64(_) => Some(Self::Float64),
            Value::Bool(_) => Some(Self::Bool),
            Value::Null | Value::List(_) => None,
        }
    }

    /// Returns the payload width for fixed-width types.
    #[must_use]
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            Self::Bytes | Self::String => None,
            Self::Int64 | Self::Float64 => Some(8),
            Self::Int32 | Self::Float32 => Some(4),
            Self::Int16 => Some(2),
            Self::Bool => Some(1),
        }
    }

    /// Returns the type name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bytes => "bytes",
            Self::String => "string",
            Self::Int64 => "int64",
            Self::Int32 => "int32",
            Self::Int16 => "int16",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Bool => "bool",
        }
    }
}

/// Encodes a value as tag byte plus payload.
///
/// # Errors
///
/// Returns [`CodecError::UnsupportedType`] for [`Value::Null`] and
/// [`Value::List`].
pub fn encode_value(value: &Value) -> Result<Vec<u8>> {
    Ok(match value {
        Value::Bytes(b) => tagged(ValueTag::Bytes, b),
        Value::String(s) => tagged(ValueTag::String, s.as_bytes()),
        Value::Int64(v) => fixed(ValueTag::Int64, |buf| BigEndian::write_i64(buf, *v)),
        Value::Int32(v) => fixed(ValueTag::Int32, |buf| BigEndian::write_i32(buf, *v)),
        Value::Int16(v) => fixed(ValueTag::Int16, |buf| BigEndian::write_i16(buf, *v)),
        Value::Float32(v) => fixed(ValueTag::Float32, |buf| {
            BigEndian::write_u32(buf, v.to_bits());
        }),
        Value::Float64(v) => fixed(ValueTag::Float64, |buf| {
            BigEndian::write_u64(buf, v.to_bits());
        }),
        Value::Bool(v) => tagged(ValueTag::Bool, &[if *v { TRUE_BYTE } else { FALSE_BYTE }]),
        Value::Null | Value::List(_) => {
            return Err(CodecError::UnsupportedType(value.type_name().to_string()).into());
        }
    })
}

fn tagged(tag: ValueTag, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1 + payload.len());
    buf.push(tag as u8);
    buf.extend_from_slice(payload);
    buf
}

fn fixed(tag: ValueTag, write: impl FnOnce(&mut [u8])) -> Vec<u8> {
    let width = tag.fixed_width().unwrap_or(0);
    let mut buf = vec![0u8; 1 + width];
    buf[0] = tag as u8;
    write(&mut buf[1..]);
    buf
}

/// Decodes a tag byte plus payload.
///
/// # Errors
///
/// Returns [`CodecError::UnsupportedType`] for an unknown tag,
/// [`CodecError::MalformedPayload`] if the input is empty or the payload
/// width does not match the tag, and [`CodecError::InvalidUtf8`] for a
/// string payload that is not UTF-8.
pub fn decode_value(bytes: &[u8]) -> Result<Value> {
    let (&tag_byte, payload) = bytes.split_first().ok_or(CodecError::MalformedPayload {
        tag: "tagged value",
        expected: 1,
        actual: 0,
    })?;
    let tag = ValueTag::from_byte(tag_byte)?;

    if let Some(width) = tag.fixed_width() {
        if payload.len() != width {
            return Err(CodecError::MalformedPayload {
                tag: tag.name(),
                expected: width,
                actual: payload.len(),
            }
            .into());
        }
    }

    Ok(match tag {
        ValueTag::Bytes => Value::Bytes(payload.into()),
        ValueTag::String => {
            let s = std::str::from_utf8(payload).map_err(|_| CodecError::InvalidUtf8)?;
            Value::String(s.into())
        }
        ValueTag::Int64 => Value::Int64(BigEndian::read_i64(payload)),
        ValueTag::Int32 => Value::Int32(BigEndian::read_i32(payload)),
        ValueTag::Int16 => Value::Int16(BigEndian::read_i16(payload)),
        ValueTag::Float32 => Value::Float32(f32::from_bits(BigEndian::read_u32(payload))),
        ValueTag::Float64 => Value::Float64(f64::from_bits(BigEndian::read_u64(payload))),
        ValueTag::Bool => Value::Bool(payload[0] != FALSE_BYTE),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::Error;
    use proptest::prelude::*;

    #[test]
    fn test_bit_exact_layout() {
        assert_eq!(encode_value(&Value::Int32(30)).unwrap(), vec![3, 0, 0, 0, 30]);
        assert_eq!(encode_value(&Value::Int16(-1)).unwrap(), vec![4, 0xFF, 0xFF]);
        assert_eq!(encode_value(&Value::Bool(true)).unwrap(), vec![7, 0xFF]);
        assert_eq!(encode_value(&Value::Bool(false)).unwrap(), vec![7, 0x00]);
        assert_eq!(encode_value(&Value::from("ab")).unwrap(), vec![1, b'a', b'b']);
        assert_eq!(encode_value(&Value::from(Vec::<u8>::new())).unwrap(), vec![0]);
        assert_eq!(
            encode_value(&Value::Float32(1.0)).unwrap(),
            vec![5, 0x3F, 0x80, 0x00, 0x00]
        );
    }

    #[test]
    fn test_same_number_different_width_is_different_key() {
        let narrow = encode_value(&Value::Int32(30)).unwrap();
        let wide = encode_value(&Value::Int64(30)).unwrap();
        assert_ne!(narrow, wide);
    }

    #[test]
    fn test_unsupported_values() {
        assert!(matches!(
            encode_value(&Value::Null),
            Err(Error::Codec(CodecError::UnsupportedType(_)))
        ));
        assert!(matches!(
            encode_value(&Value::from(vec![Value::Int32(1)])),
            Err(Error::Codec(CodecError::UnsupportedType(_)))
        ));
        assert!(matches!(
            decode_value(&[NON_SUPPORTED_TAG]),
            Err(Error::Codec(CodecError::UnsupportedType(_)))
        ));
        assert!(matches!(
            decode_value(&[42, 1, 2]),
            Err(Error::Codec(CodecError::UnsupportedType(_)))
        ));
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(matches!(
            decode_value(&[]),
            Err(Error::Codec(CodecError::MalformedPayload { .. }))
        ));
        assert!(matches!(
            decode_value(&[2, 0, 0, 0]),
            Err(Error::Codec(CodecError::MalformedPayload { tag: "int64", expected: 8, actual: 3 }))
        ));
        assert!(matches!(
            decode_value(&[7]),
            Err(Error::Codec(CodecError::MalformedPayload { .. }))
        ));
        assert!(matches!(
            decode_value(&[1, 0xC3, 0x28]),
            Err(Error::Codec(CodecError::InvalidUtf8))
        ));
    }

    #[test]
    fn test_any_nonzero_bool_byte_is_true() {
        assert_eq!(decode_value(&[7, 0x01]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_nan_bits_survive() {
        let nan = f64::from_bits(0x7FF8_0000_0000_1234);
        let decoded = decode_value(&encode_value(&Value::Float64(nan)).unwrap()).unwrap();
        assert_eq!(decoded.as_float64().map(f64::to_bits), Some(nan.to_bits()));
    }

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            proptest::collection::vec(any::<u8>(), 0..32).prop_map(Value::from),
            ".*".prop_map(Value::from),
            any::<i64>().prop_map(Value::Int64),
            any::<i32>().prop_map(Value::Int32),
            any::<i16>().prop_map(Value::Int16),
            any::<f32>().prop_filter("NaN != NaN", |v| !v.is_nan()).prop_map(Value::Float32),
            any::<f64>().prop_filter("NaN != NaN", |v| !v.is_nan()).prop_map(Value::Float64),
            any::<bool>().prop_map(Value::Bool),
        ]
    }

    proptest! {
        #[test]
        fn prop_value_round_trip(value in scalar()) {
            let encoded = encode_value(&value).unwrap();
            prop_assert_eq!(decode_value(&encoded).unwrap(), value);
        }
    }
}
