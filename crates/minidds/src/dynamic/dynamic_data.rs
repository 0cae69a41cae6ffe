// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type-checked sample container.
//!
//! A [`DynamicData`] always conforms to its descriptor: every declared field
//! is present, holds the declared kind and respects its bound. `set` and
//! `from_value` enforce this, so the codec never sees a malformed value.

use crate::dynamic::value::mismatch;
use crate::dynamic::{
    DynamicValue, FromDynamicValue, IntoDynamicValue, PrimitiveKind, TypeDescriptor, TypeKind,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Field access or conformance failure.
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicDataError {
    /// Name is not declared by the type (or is missing from a struct value).
    FieldNotFound(String),
    TypeMismatch { expected: String, got: String },
    /// Field access on a descriptor that is not a struct.
    NotAStruct(String),
    /// String (in bytes) or sequence (in elements) longer than its bound.
    TooLong {
        kind: &'static str,
        length: usize,
        max: usize,
    },
}

impl fmt::Display for DynamicDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldNotFound(name) => write!(f, "no field named '{}'", name),
            Self::TypeMismatch { expected, got } => {
                write!(f, "expected {}, got {}", expected, got)
            }
            Self::NotAStruct(name) => write!(f, "'{}' has no fields", name),
            Self::TooLong { kind, length, max } => {
                write!(f, "{} of length {} exceeds bound {}", kind, length, max)
            }
        }
    }
}

impl std::error::Error for DynamicDataError {}

/// A sample whose shape is known only at runtime.
#[derive(Debug, Clone)]
pub struct DynamicData {
    descriptor: Arc<TypeDescriptor>,
    value: DynamicValue,
}

impl DynamicData {
    /// Sample with every field at its zero value.
    pub fn new(descriptor: &Arc<TypeDescriptor>) -> Self {
        Self {
            descriptor: Arc::clone(descriptor),
            value: zero(&descriptor.kind),
        }
    }

    /// Wrap an existing value after checking it against `descriptor`.
    pub fn from_value(
        descriptor: &Arc<TypeDescriptor>,
        value: DynamicValue,
    ) -> Result<Self, DynamicDataError> {
        check_conforms(&value, &descriptor.kind)?;
        Ok(Self::from_decoded(descriptor, value))
    }

    /// Wrap a value the caller built by walking `descriptor`.
    pub(crate) fn from_decoded(descriptor: &Arc<TypeDescriptor>, value: DynamicValue) -> Self {
        Self {
            descriptor: Arc::clone(descriptor),
            value,
        }
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    pub fn type_name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn value(&self) -> &DynamicValue {
        &self.value
    }

    pub fn into_value(self) -> DynamicValue {
        self.value
    }

    /// Read a field as a Rust value.
    pub fn get<T: FromDynamicValue>(&self, name: &str) -> Result<T, DynamicDataError> {
        T::from_dynamic(self.get_field(name)?)
    }

    /// Replace a field. The sample is left untouched when the value does not
    /// fit the field.
    pub fn set<T: IntoDynamicValue>(&mut self, name: &str, value: T) -> Result<(), DynamicDataError> {
        let field = self
            .descriptor
            .field(name)
            .ok_or_else(|| self.unknown(name))?;
        let value = value.into_dynamic();
        check_conforms(&value, &field.type_desc.kind)?;

        let DynamicValue::Struct(members) = &mut self.value else {
            return Err(DynamicDataError::NotAStruct(self.descriptor.name.clone()));
        };
        members.insert(name.to_owned(), value);
        Ok(())
    }

    /// Borrow a field's raw value.
    pub fn get_field(&self, name: &str) -> Result<&DynamicValue, DynamicDataError> {
        if !self.descriptor.is_struct() {
            return Err(DynamicDataError::NotAStruct(self.descriptor.name.clone()));
        }
        self.descriptor
            .field(name)
            .and_then(|_| self.value.get_field(name))
            .ok_or_else(|| self.unknown(name))
    }

    /// `(name, value)` pairs in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &DynamicValue)> {
        self.descriptor
            .fields()
            .unwrap_or_default()
            .iter()
            .filter_map(move |f| Some((f.name.as_str(), self.value.get_field(&f.name)?)))
    }

    fn unknown(&self, name: &str) -> DynamicDataError {
        log::debug!("[DynamicData] '{}' has no field '{}'", self.type_name(), name);
        DynamicDataError::FieldNotFound(name.to_owned())
    }
}

impl PartialEq for DynamicData {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor.name == other.descriptor.name && self.value == other.value
    }
}

fn zero(kind: &TypeKind) -> DynamicValue {
    use DynamicValue as V;
    match kind {
        TypeKind::Struct(fields) => V::Struct(
            fields
                .iter()
                .map(|f| (f.name.clone(), zero(&f.type_desc.kind)))
                .collect::<HashMap<_, _>>(),
        ),
        TypeKind::Sequence(_) => V::Sequence(Vec::new()),
        TypeKind::Primitive(p) => match p {
            PrimitiveKind::Bool => V::Bool(false),
            PrimitiveKind::U8 => V::U8(0),
            PrimitiveKind::U16 => V::U16(0),
            PrimitiveKind::U32 => V::U32(0),
            PrimitiveKind::U64 => V::U64(0),
            PrimitiveKind::I8 => V::I8(0),
            PrimitiveKind::I16 => V::I16(0),
            PrimitiveKind::I32 => V::I32(0),
            PrimitiveKind::I64 => V::I64(0),
            PrimitiveKind::F32 => V::F32(0.0),
            PrimitiveKind::F64 => V::F64(0.0),
            PrimitiveKind::String { .. } => V::String(String::new()),
        },
    }
}

fn within(kind: &'static str, length: usize, max: Option<usize>) -> Result<(), DynamicDataError> {
    match max {
        Some(max) if length > max => Err(DynamicDataError::TooLong { kind, length, max }),
        _ => Ok(()),
    }
}

/// Check that `value` has exactly the shape `kind` describes.
pub(crate) fn check_conforms(value: &DynamicValue, kind: &TypeKind) -> Result<(), DynamicDataError> {
    use DynamicValue as V;
    use PrimitiveKind as K;

    match kind {
        TypeKind::Struct(fields) => {
            let V::Struct(members) = value else {
                return Err(mismatch("struct", value));
            };
            for field in fields {
                let member = members
                    .get(&field.name)
                    .ok_or_else(|| DynamicDataError::FieldNotFound(field.name.clone()))?;
                check_conforms(member, &field.type_desc.kind)?;
            }
            // Every declared field matched; anything more is undeclared.
            match members.keys().find(|k| !fields.iter().any(|f| &f.name == *k)) {
                Some(extra) => Err(DynamicDataError::FieldNotFound(extra.clone())),
                None => Ok(()),
            }
        }
        TypeKind::Sequence(seq) => {
            let V::Sequence(items) = value else {
                return Err(mismatch("sequence", value));
            };
            within("sequence", items.len(), seq.max_length)?;
            items
                .iter()
                .try_for_each(|item| check_conforms(item, &seq.element_type.kind))
        }
        TypeKind::Primitive(K::String { max_length }) => match value {
            V::String(s) => within("string", s.len(), *max_length),
            other => Err(mismatch("string", other)),
        },
        TypeKind::Primitive(p) => {
            if value.kind_name() == p.name() {
                Ok(())
            } else {
                Err(mismatch(p.name(), value))
            }
        }
    }
}
