// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime description of sample types.
//!
//! A sample type is a named struct whose fields are primitives, strings,
//! sequences or nested structs. Field order is significant: it is the wire
//! order and part of the type's identity.

use std::fmt;
use std::sync::Arc;

/// Leaf field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    /// UTF-8 text, optionally bounded in bytes.
    String { max_length: Option<usize> },
}

impl PrimitiveKind {
    /// Encoded width for fixed-size kinds.
    pub fn width(&self) -> Option<usize> {
        Some(match self {
            Self::Bool | Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
            Self::String { .. } => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::String { .. } => "string",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String {
                max_length: Some(max),
            } => write!(f, "string<{}>", max),
            other => f.write_str(other.name()),
        }
    }
}

/// Shape of a type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    /// Named fields in declaration order.
    Struct(Vec<FieldDescriptor>),
    Sequence(SequenceDescriptor),
}

/// A named type. Shared as `Arc<TypeDescriptor>` once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub name: String,
    pub kind: TypeKind,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn primitive(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self::new(name, TypeKind::Primitive(kind))
    }

    pub fn struct_type(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self::new(name, TypeKind::Struct(fields))
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeKind::Struct(_))
    }

    /// Declared fields, or `None` for non-struct types.
    pub fn fields(&self) -> Option<&[FieldDescriptor]> {
        if let TypeKind::Struct(fields) = &self.kind {
            Some(fields)
        } else {
            None
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields()?.iter().find(|f| f.name == name)
    }

    /// Structural rendering used for type identity and conflict reports.
    ///
    /// `Reading{id:u32,tag:string<16>,raw:seq<u8>}`. Nested structs keep
    /// their names; anonymous field types do not.
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_struct() {
            f.write_str(&self.name)?;
        }
        fmt::Display::fmt(&self.kind, f)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => fmt::Display::fmt(p, f),
            Self::Struct(fields) => {
                f.write_str("{")?;
                for (i, field) in fields.iter().enumerate() {
                    let sep = if i == 0 { "" } else { "," };
                    write!(f, "{}{}:{}", sep, field.name, field.type_desc)?;
                }
                f.write_str("}")
            }
            Self::Sequence(seq) => match seq.max_length {
                Some(max) => write!(f, "seq<{};{}>", seq.element_type, max),
                None => write!(f, "seq<{}>", seq.element_type),
            },
        }
    }
}

/// One struct member.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub type_desc: Arc<TypeDescriptor>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, type_desc: Arc<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            type_desc,
        }
    }
}

/// Variable-length list of one element type.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceDescriptor {
    pub element_type: Arc<TypeDescriptor>,
    /// `None` = unbounded.
    pub max_length: Option<usize>,
}

impl SequenceDescriptor {
    pub fn new(element_type: Arc<TypeDescriptor>, max_length: Option<usize>) -> Self {
        Self {
            element_type,
            max_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::TypeDescriptorBuilder;

    #[test]
    fn test_fixed_widths() {
        assert_eq!(PrimitiveKind::Bool.width(), Some(1));
        assert_eq!(PrimitiveKind::I16.width(), Some(2));
        assert_eq!(PrimitiveKind::F32.width(), Some(4));
        assert_eq!(PrimitiveKind::U64.width(), Some(8));
        assert_eq!(PrimitiveKind::String { max_length: None }.width(), None);
    }

    #[test]
    fn test_field_lookup() {
        let desc = TypeDescriptor::struct_type(
            "Pose",
            vec![
                FieldDescriptor::new(
                    "frame",
                    Arc::new(TypeDescriptor::primitive("", PrimitiveKind::U32)),
                ),
                FieldDescriptor::new(
                    "yaw",
                    Arc::new(TypeDescriptor::primitive("", PrimitiveKind::F64)),
                ),
            ],
        );
        assert!(desc.is_struct());
        assert_eq!(desc.fields().map(<[_]>::len), Some(2));
        assert_eq!(
            desc.field("yaw").map(|f| &f.type_desc.kind),
            Some(&TypeKind::Primitive(PrimitiveKind::F64))
        );
        assert!(desc.field("roll").is_none());
    }

    #[test]
    fn test_canonical_rendering() {
        let origin = Arc::new(
            TypeDescriptorBuilder::new("Point")
                .field("x", PrimitiveKind::F32)
                .build(),
        );
        let desc = TypeDescriptorBuilder::new("Reading")
            .field("id", PrimitiveKind::U32)
            .bounded_string_field("tag", 16)
            .sequence_field("raw", PrimitiveKind::U8)
            .bounded_sequence_field("window", PrimitiveKind::I16, 4)
            .nested_field("origin", origin)
            .build();
        assert_eq!(
            desc.canonical(),
            "Reading{id:u32,tag:string<16>,raw:seq<u8>,window:seq<i16;4>,origin:Point{x:f32}}"
        );
    }

    #[test]
    fn test_field_order_is_part_of_identity() {
        let a = TypeDescriptorBuilder::new("Pair")
            .field("left", PrimitiveKind::I32)
            .field("right", PrimitiveKind::I32)
            .build();
        let swapped = TypeDescriptorBuilder::new("Pair")
            .field("right", PrimitiveKind::I32)
            .field("left", PrimitiveKind::I32)
            .build();

        assert_ne!(a, swapped);
        assert_ne!(a.canonical(), swapped.canonical());
    }
}
