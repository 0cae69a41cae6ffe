// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sample wire codec.
//!
//! ```text
//! offset 0                                                     end
//! | field 0 | pad | field 1 | ... | field N-1 |
//!   primitives: little endian, aligned to min(size, 8) from offset 0
//!   string:     u32 len (incl. NUL) | utf-8 bytes | 0x00
//!   sequence:   u32 count | element 0 | element 1 | ...
//! ```
//!
//! Fields go out in descriptor order, so equal samples always produce
//! identical bytes. Decoding accepts exactly what encoding produces: short
//! buffers, out-of-range lengths, bad booleans, bad UTF-8 and leftover bytes
//! are all rejected.

use crate::dynamic::{DynamicData, DynamicValue, PrimitiveKind, TypeDescriptor, TypeKind};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Why a sample could not be encoded or decoded.
#[derive(Debug)]
pub enum CodecError {
    /// Payload ended before the value at `offset` was complete.
    Truncated { offset: usize, need: usize },
    /// A string or sequence is longer than its declared bound.
    BoundExceeded { len: usize, max: usize },
    /// A length does not fit the u32 prefix.
    LengthOverflow(usize),
    /// Boolean byte other than 0 or 1.
    InvalidBool(u8),
    /// String length prefix of zero or missing terminator.
    BadTerminator,
    /// String contains a NUL before its end.
    InteriorNul,
    Utf8(std::string::FromUtf8Error),
    /// Value kind does not match the descriptor.
    KindMismatch {
        expected: &'static str,
        found: &'static str,
    },
    MissingField(String),
    /// Bytes left over after the sample.
    TrailingBytes(usize),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { offset, need } => {
                write!(f, "payload truncated at offset {} ({} more bytes needed)", offset, need)
            }
            Self::BoundExceeded { len, max } => {
                write!(f, "length {} exceeds bound {}", len, max)
            }
            Self::LengthOverflow(len) => write!(f, "length {} does not fit in u32", len),
            Self::InvalidBool(b) => write!(f, "invalid bool byte 0x{:02x}", b),
            Self::BadTerminator => write!(f, "string is not NUL-terminated"),
            Self::InteriorNul => write!(f, "string contains an interior NUL"),
            Self::Utf8(e) => write!(f, "string is not UTF-8: {}", e),
            Self::KindMismatch { expected, found } => {
                write!(f, "expected {} value, found {}", expected, found)
            }
            Self::MissingField(name) => write!(f, "missing field '{}'", name),
            Self::TrailingBytes(n) => write!(f, "{} trailing bytes after sample", n),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Utf8(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::string::FromUtf8Error> for CodecError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::Utf8(e)
    }
}

/// Encode a sample. Deterministic for a given descriptor and value.
pub fn encode_sample(data: &DynamicData) -> Result<Vec<u8>, CodecError> {
    let mut out = SampleWriter {
        bytes: Vec::with_capacity(64),
    };
    out.value(data.value(), &data.descriptor().kind)?;
    Ok(out.bytes)
}

/// Decode a sample of type `descriptor`. The whole payload must be consumed.
pub fn decode_sample(
    bytes: &[u8],
    descriptor: &Arc<TypeDescriptor>,
) -> Result<DynamicData, CodecError> {
    let mut input = SampleReader { bytes, pos: 0 };
    let value = input.value(&descriptor.kind)?;
    let left = input.left();
    if left != 0 {
        return Err(CodecError::TrailingBytes(left));
    }
    // Decoding follows the descriptor, so the value conforms by construction.
    Ok(DynamicData::from_decoded(descriptor, value))
}

fn check_bound(len: usize, max: Option<usize>) -> Result<(), CodecError> {
    match max {
        Some(max) if len > max => Err(CodecError::BoundExceeded { len, max }),
        _ => Ok(()),
    }
}

struct SampleWriter {
    bytes: Vec<u8>,
}

impl SampleWriter {
    /// Append `raw` after padding to its natural alignment.
    fn put<const N: usize>(&mut self, raw: [u8; N]) {
        let align = N.min(8);
        let pad = (align - self.bytes.len() % align) % align;
        self.bytes.resize(self.bytes.len() + pad, 0);
        self.bytes.extend_from_slice(&raw);
    }

    fn put_len(&mut self, len: usize) -> Result<(), CodecError> {
        let len = u32::try_from(len).map_err(|_| CodecError::LengthOverflow(len))?;
        self.put(len.to_le_bytes());
        Ok(())
    }

    fn value(&mut self, value: &DynamicValue, kind: &TypeKind) -> Result<(), CodecError> {
        match (kind, value) {
            (TypeKind::Primitive(p), _) => self.primitive(value, *p),
            (TypeKind::Struct(fields), DynamicValue::Struct(map)) => {
                for field in fields {
                    let v = map
                        .get(&field.name)
                        .ok_or_else(|| CodecError::MissingField(field.name.clone()))?;
                    self.value(v, &field.type_desc.kind)?;
                }
                Ok(())
            }
            (TypeKind::Sequence(seq), DynamicValue::Sequence(items)) => {
                check_bound(items.len(), seq.max_length)?;
                self.put_len(items.len())?;
                items
                    .iter()
                    .try_for_each(|item| self.value(item, &seq.element_type.kind))
            }
            (TypeKind::Struct(_), other) => Err(CodecError::KindMismatch {
                expected: "struct",
                found: other.kind_name(),
            }),
            (TypeKind::Sequence(_), other) => Err(CodecError::KindMismatch {
                expected: "sequence",
                found: other.kind_name(),
            }),
        }
    }

    fn primitive(&mut self, value: &DynamicValue, kind: PrimitiveKind) -> Result<(), CodecError> {
        use DynamicValue as V;
        use PrimitiveKind as K;

        match (kind, value) {
            (K::Bool, V::Bool(v)) => self.put([u8::from(*v)]),
            (K::U8, V::U8(v)) => self.put([*v]),
            (K::I8, V::I8(v)) => self.put(v.to_le_bytes()),
            (K::U16, V::U16(v)) => self.put(v.to_le_bytes()),
            (K::I16, V::I16(v)) => self.put(v.to_le_bytes()),
            (K::U32, V::U32(v)) => self.put(v.to_le_bytes()),
            (K::I32, V::I32(v)) => self.put(v.to_le_bytes()),
            (K::U64, V::U64(v)) => self.put(v.to_le_bytes()),
            (K::I64, V::I64(v)) => self.put(v.to_le_bytes()),
            (K::F32, V::F32(v)) => self.put(v.to_le_bytes()),
            (K::F64, V::F64(v)) => self.put(v.to_le_bytes()),
            (K::String { max_length }, V::String(s)) => {
                check_bound(s.len(), max_length)?;
                if s.bytes().any(|b| b == 0) {
                    return Err(CodecError::InteriorNul);
                }
                self.put_len(s.len() + 1)?;
                self.bytes.extend_from_slice(s.as_bytes());
                self.bytes.push(0);
            }
            (kind, other) => {
                return Err(CodecError::KindMismatch {
                    expected: kind.name(),
                    found: other.kind_name(),
                })
            }
        }
        Ok(())
    }
}

struct SampleReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SampleReader<'a> {
    fn left(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    fn slice(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if n > self.left() {
            return Err(CodecError::Truncated {
                offset: self.pos,
                need: n - self.left(),
            });
        }
        let bytes = self.bytes;
        let start = self.pos;
        self.pos += n;
        Ok(&bytes[start..start + n])
    }

    /// Read `N` bytes at their natural alignment.
    fn take<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let align = N.min(8);
        let pad = (align - self.pos % align) % align;
        self.slice(pad)?;
        let mut raw = [0u8; N];
        raw.copy_from_slice(self.slice(N)?);
        Ok(raw)
    }

    fn len_prefix(&mut self) -> Result<usize, CodecError> {
        Ok(u32::from_le_bytes(self.take()?) as usize)
    }

    fn value(&mut self, kind: &TypeKind) -> Result<DynamicValue, CodecError> {
        match kind {
            TypeKind::Primitive(p) => self.primitive(*p),
            TypeKind::Struct(fields) => {
                let mut map = HashMap::with_capacity(fields.len());
                for field in fields {
                    map.insert(field.name.clone(), self.value(&field.type_desc.kind)?);
                }
                Ok(DynamicValue::Struct(map))
            }
            TypeKind::Sequence(seq) => {
                let count = self.len_prefix()?;
                check_bound(count, seq.max_length)?;
                // Each element takes at least one byte: refuse counts the
                // payload cannot hold before reserving memory for them.
                if count > self.left() {
                    return Err(CodecError::Truncated {
                        offset: self.pos,
                        need: count - self.left(),
                    });
                }
                (0..count)
                    .map(|_| self.value(&seq.element_type.kind))
                    .collect::<Result<Vec<_>, _>>()
                    .map(DynamicValue::Sequence)
            }
        }
    }

    fn primitive(&mut self, kind: PrimitiveKind) -> Result<DynamicValue, CodecError> {
        use DynamicValue as V;
        use PrimitiveKind as K;

        Ok(match kind {
            K::Bool => match self.take::<1>()?[0] {
                0 => V::Bool(false),
                1 => V::Bool(true),
                b => return Err(CodecError::InvalidBool(b)),
            },
            K::U8 => V::U8(self.take::<1>()?[0]),
            K::I8 => V::I8(i8::from_le_bytes(self.take()?)),
            K::U16 => V::U16(u16::from_le_bytes(self.take()?)),
            K::I16 => V::I16(i16::from_le_bytes(self.take()?)),
            K::U32 => V::U32(u32::from_le_bytes(self.take()?)),
            K::I32 => V::I32(i32::from_le_bytes(self.take()?)),
            K::U64 => V::U64(u64::from_le_bytes(self.take()?)),
            K::I64 => V::I64(i64::from_le_bytes(self.take()?)),
            K::F32 => V::F32(f32::from_le_bytes(self.take()?)),
            K::F64 => V::F64(f64::from_le_bytes(self.take()?)),
            K::String { max_length } => {
                let len = self.len_prefix()?;
                let Some(text_len) = len.checked_sub(1) else {
                    return Err(CodecError::BadTerminator);
                };
                check_bound(text_len, max_length)?;
                let raw = self.slice(len)?;
                let (text, nul) = raw.split_at(text_len);
                if nul != [0] {
                    return Err(CodecError::BadTerminator);
                }
                if text.contains(&0) {
                    return Err(CodecError::InteriorNul);
                }
                V::String(String::from_utf8(text.to_vec())?)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::TypeDescriptorBuilder;

    fn hello() -> Arc<TypeDescriptor> {
        Arc::new(
            TypeDescriptorBuilder::new("HelloWorld")
                .string_field("message")
                .field("index", PrimitiveKind::U32)
                .build(),
        )
    }

    fn hello_sample(message: &str, index: u32) -> DynamicData {
        let mut data = DynamicData::new(&hello());
        data.set("message", message).expect("message");
        data.set("index", index).expect("index");
        data
    }

    #[test]
    fn test_hello_world_layout() {
        let encoded = encode_sample(&hello_sample("Hi", 7)).expect("encode");
        // len=3 | 'H' 'i' NUL | pad | index=7
        assert_eq!(encoded, vec![3, 0, 0, 0, b'H', b'i', 0, 0, 7, 0, 0, 0]);

        let decoded = decode_sample(&encoded, &hello()).expect("decode");
        assert_eq!(decoded.get::<String>("message").expect("message"), "Hi");
        assert_eq!(decoded.get::<u32>("index").expect("index"), 7);
    }

    #[test]
    fn test_alignment_of_mixed_primitives() {
        let desc = Arc::new(
            TypeDescriptorBuilder::new("Telemetry")
                .field("valid", PrimitiveKind::Bool)
                .field("channel", PrimitiveKind::U8)
                .field("seq", PrimitiveKind::U32)
                .field("value", PrimitiveKind::F64)
                .field("delta", PrimitiveKind::I16)
                .build(),
        );
        let mut data = DynamicData::new(&desc);
        data.set("valid", true).expect("valid");
        data.set("channel", 3u8).expect("channel");
        data.set("seq", 0x0102_0304u32).expect("seq");
        data.set("value", -1.5f64).expect("value");
        data.set("delta", -2i16).expect("delta");

        let encoded = encode_sample(&data).expect("encode");
        // bool@0 u8@1 pad u32@4 f64@8 i16@16
        assert_eq!(encoded.len(), 18);
        assert_eq!(&encoded[4..8], &[4, 3, 2, 1]);
        assert_eq!(&encoded[16..18], &(-2i16).to_le_bytes());

        let decoded = decode_sample(&encoded, &desc).expect("decode");
        assert_eq!(decoded.get::<f64>("value").expect("value"), -1.5);
        assert_eq!(decoded.get::<i16>("delta").expect("delta"), -2);
    }

    #[test]
    fn test_field_order_is_descriptor_order() {
        let desc = hello();
        let mut a = DynamicData::new(&desc);
        a.set("index", 9u32).expect("index");
        a.set("message", "same").expect("message");

        assert_eq!(
            encode_sample(&a).expect("encode"),
            encode_sample(&hello_sample("same", 9)).expect("encode")
        );
    }

    #[test]
    fn test_sequence_and_nested_struct() {
        let point = Arc::new(
            TypeDescriptorBuilder::new("GeoPoint")
                .field("lat", PrimitiveKind::F32)
                .field("lon", PrimitiveKind::F32)
                .build(),
        );
        let track = Arc::new(
            TypeDescriptorBuilder::new("Track")
                .nested_field("start", Arc::clone(&point))
                .bounded_sequence_field("hops", PrimitiveKind::U16, 4)
                .build(),
        );

        let mut start = DynamicData::new(&point);
        start.set("lat", 48.5f32).expect("lat");
        start.set("lon", 2.25f32).expect("lon");
        let mut data = DynamicData::new(&track);
        data.set("start", start.into_value()).expect("start");
        data.set("hops", vec![10u16, 20, 30]).expect("hops");

        let encoded = encode_sample(&data).expect("encode");
        let decoded = decode_sample(&encoded, &track).expect("decode");

        assert_eq!(decoded.get::<Vec<u16>>("hops").expect("hops"), vec![10, 20, 30]);
        let start = decoded.get_field("start").expect("start");
        assert_eq!(start.get_field("lon").and_then(|v| v.as_f32()), Some(2.25));
    }

    #[test]
    fn test_every_prefix_is_rejected() {
        let encoded = encode_sample(&hello_sample("Hello world", 1)).expect("encode");
        for cut in 0..encoded.len() {
            assert!(
                decode_sample(&encoded[..cut], &hello()).is_err(),
                "{}-byte prefix decoded",
                cut
            );
        }
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut encoded = encode_sample(&hello_sample("", 0)).expect("encode");
        encoded.push(0);
        assert!(matches!(
            decode_sample(&encoded, &hello()),
            Err(CodecError::TrailingBytes(1))
        ));
    }

    #[test]
    fn test_malformed_inputs() {
        let flag = Arc::new(
            TypeDescriptorBuilder::new("Flag")
                .field("on", PrimitiveKind::Bool)
                .build(),
        );
        assert!(decode_sample(&[1], &flag).is_ok());
        assert!(matches!(decode_sample(&[2], &flag), Err(CodecError::InvalidBool(2))));

        let blob = Arc::new(
            TypeDescriptorBuilder::new("Blob")
                .sequence_field("data", PrimitiveKind::U8)
                .build(),
        );
        assert!(matches!(
            decode_sample(&u32::MAX.to_le_bytes(), &blob),
            Err(CodecError::Truncated { .. })
        ));

        let text = Arc::new(TypeDescriptorBuilder::new("Text").string_field("s").build());
        assert!(matches!(
            decode_sample(&[2, 0, 0, 0, 0xff, 0], &text),
            Err(CodecError::Utf8(_))
        ));
        assert!(matches!(
            decode_sample(&[0, 0, 0, 0], &text),
            Err(CodecError::BadTerminator)
        ));
        assert!(matches!(
            decode_sample(&[2, 0, 0, 0, b'a', b'b'], &text),
            Err(CodecError::BadTerminator)
        ));
    }

    #[test]
    fn test_bounds_enforced_both_ways() {
        let tag = Arc::new(
            TypeDescriptorBuilder::new("Tag")
                .bounded_string_field("name", 3)
                .build(),
        );
        // "abcd" on the wire with a 3-char bound
        let bytes = [5, 0, 0, 0, b'a', b'b', b'c', b'd', 0];
        assert!(matches!(
            decode_sample(&bytes, &tag),
            Err(CodecError::BoundExceeded { len: 4, max: 3 })
        ));

        let mut data = DynamicData::new(&tag);
        data.set("name", "abc").expect("within bound");
        assert!(encode_sample(&data).is_ok());
    }
}
