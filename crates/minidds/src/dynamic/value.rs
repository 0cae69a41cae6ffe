// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Untyped field values and conversions to and from Rust types.

use crate::dynamic::DynamicDataError;
use std::collections::HashMap;

/// Value of one field (or a whole sample, as `Struct`).
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicValue {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Struct(HashMap<String, DynamicValue>),
    Sequence(Vec<DynamicValue>),
}

/// Read a Rust value out of a [`DynamicValue`].
pub trait FromDynamicValue: Sized {
    fn from_dynamic(value: &DynamicValue) -> Result<Self, DynamicDataError>;
}

/// Turn a Rust value into a [`DynamicValue`].
pub trait IntoDynamicValue {
    fn into_dynamic(self) -> DynamicValue;
}

pub(crate) fn mismatch(expected: &str, found: &DynamicValue) -> DynamicDataError {
    DynamicDataError::TypeMismatch {
        expected: expected.to_string(),
        got: found.kind_name().to_string(),
    }
}

// One line per scalar: accessor, From, and both conversion traits.
macro_rules! scalar {
    ($($variant:ident($ty:ty) as $getter:ident),* $(,)?) => {
        impl DynamicValue {
            $(
                pub fn $getter(&self) -> Option<$ty> {
                    if let Self::$variant(v) = self { Some(*v) } else { None }
                }
            )*
        }

        $(
            impl From<$ty> for DynamicValue {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }

            impl IntoDynamicValue for $ty {
                fn into_dynamic(self) -> DynamicValue {
                    DynamicValue::$variant(self)
                }
            }

            impl FromDynamicValue for $ty {
                fn from_dynamic(value: &DynamicValue) -> Result<Self, DynamicDataError> {
                    value
                        .$getter()
                        .ok_or_else(|| mismatch(stringify!($ty), value))
                }
            }
        )*
    };
}

scalar! {
    Bool(bool) as as_bool,
    U8(u8) as as_u8,
    U16(u16) as as_u16,
    U32(u32) as as_u32,
    U64(u64) as as_u64,
    I8(i8) as as_i8,
    I16(i16) as as_i16,
    I32(i32) as as_i32,
    I64(i64) as as_i64,
    F32(f32) as as_f32,
    F64(f64) as as_f64,
}

impl DynamicValue {
    pub fn as_str(&self) -> Option<&str> {
        if let Self::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    pub fn as_sequence(&self) -> Option<&[DynamicValue]> {
        if let Self::Sequence(items) = self {
            Some(items)
        } else {
            None
        }
    }

    /// Member of a struct value.
    pub fn get_field(&self, name: &str) -> Option<&DynamicValue> {
        if let Self::Struct(map) = self {
            map.get(name)
        } else {
            None
        }
    }

    /// Insert a struct member. Returns `false` on non-struct values.
    pub fn set_field(&mut self, name: impl Into<String>, value: DynamicValue) -> bool {
        let Self::Struct(map) = self else {
            return false;
        };
        map.insert(name.into(), value);
        true
    }

    /// Short kind label for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::String(_) => "string",
            Self::Struct(_) => "struct",
            Self::Sequence(_) => "sequence",
        }
    }
}

impl From<String> for DynamicValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for DynamicValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl<T: Into<DynamicValue>> From<Vec<T>> for DynamicValue {
    fn from(items: Vec<T>) -> Self {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl IntoDynamicValue for DynamicValue {
    fn into_dynamic(self) -> DynamicValue {
        self
    }
}

impl IntoDynamicValue for String {
    fn into_dynamic(self) -> DynamicValue {
        DynamicValue::String(self)
    }
}

impl IntoDynamicValue for &str {
    fn into_dynamic(self) -> DynamicValue {
        DynamicValue::String(self.to_owned())
    }
}

impl<T: IntoDynamicValue> IntoDynamicValue for Vec<T> {
    fn into_dynamic(self) -> DynamicValue {
        DynamicValue::Sequence(self.into_iter().map(T::into_dynamic).collect())
    }
}

impl FromDynamicValue for String {
    fn from_dynamic(value: &DynamicValue) -> Result<Self, DynamicDataError> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| mismatch("string", value))
    }
}

impl<T: FromDynamicValue> FromDynamicValue for Vec<T> {
    fn from_dynamic(value: &DynamicValue) -> Result<Self, DynamicDataError> {
        value
            .as_sequence()
            .ok_or_else(|| mismatch("sequence", value))?
            .iter()
            .map(T::from_dynamic)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_accessors_are_exact() {
        let index = DynamicValue::from(7u32);
        assert_eq!(index.as_u32(), Some(7));
        assert_eq!(index.as_u64(), None, "no widening");
        assert_eq!(u32::from_dynamic(&index), Ok(7));
        assert!(matches!(
            i32::from_dynamic(&index),
            Err(DynamicDataError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_struct_members() {
        let mut sample = DynamicValue::Struct(HashMap::new());
        assert!(sample.set_field("message", "Hello world".into()));
        assert!(sample.set_field("index", 1u32.into()));

        assert_eq!(
            sample.get_field("message").and_then(DynamicValue::as_str),
            Some("Hello world")
        );
        assert_eq!(sample.get_field("index").and_then(|v| v.as_u32()), Some(1));
        assert!(sample.get_field("missing").is_none());

        let mut flag = DynamicValue::from(true);
        assert!(!flag.set_field("x", 0u8.into()));
        assert!(flag.get_field("x").is_none());
    }

    #[test]
    fn test_sequences_convert_elementwise() {
        let raw = vec![3u8, 1, 4].into_dynamic();
        assert_eq!(raw.kind_name(), "sequence");
        assert_eq!(Vec::<u8>::from_dynamic(&raw), Ok(vec![3, 1, 4]));

        let mixed = DynamicValue::Sequence(vec![1u8.into(), "x".into()]);
        assert!(Vec::<u8>::from_dynamic(&mixed).is_err());
    }
}
