// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Chained construction of struct sample types.

use crate::dynamic::{FieldDescriptor, PrimitiveKind, SequenceDescriptor, TypeDescriptor, TypeKind};
use std::sync::Arc;

/// Builds a struct [`TypeDescriptor`]; fields keep the order they are added in.
///
/// ```rust
/// use minidds::dynamic::{PrimitiveKind, TypeDescriptorBuilder};
///
/// let hello = TypeDescriptorBuilder::new("HelloWorld")
///     .string_field("message")
///     .field("index", PrimitiveKind::U32)
///     .build();
/// assert_eq!(hello.canonical(), "HelloWorld{message:string,index:u32}");
/// ```
#[derive(Debug)]
pub struct TypeDescriptorBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
}

fn leaf(kind: PrimitiveKind) -> Arc<TypeDescriptor> {
    Arc::new(TypeDescriptor::primitive("", kind))
}

impl TypeDescriptorBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    fn push(mut self, name: impl Into<String>, type_desc: Arc<TypeDescriptor>) -> Self {
        self.fields.push(FieldDescriptor::new(name, type_desc));
        self
    }

    fn sequence(self, name: impl Into<String>, element: PrimitiveKind, max: Option<usize>) -> Self {
        let seq = SequenceDescriptor::new(leaf(element), max);
        self.push(name, Arc::new(TypeDescriptor::new("", TypeKind::Sequence(seq))))
    }

    pub fn field(self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        self.push(name, leaf(kind))
    }

    /// Unbounded UTF-8 string.
    pub fn string_field(self, name: impl Into<String>) -> Self {
        self.field(name, PrimitiveKind::String { max_length: None })
    }

    /// String of at most `max_length` bytes.
    pub fn bounded_string_field(self, name: impl Into<String>, max_length: usize) -> Self {
        let kind = PrimitiveKind::String {
            max_length: Some(max_length),
        };
        self.field(name, kind)
    }

    pub fn sequence_field(self, name: impl Into<String>, element: PrimitiveKind) -> Self {
        self.sequence(name, element, None)
    }

    pub fn bounded_sequence_field(
        self,
        name: impl Into<String>,
        element: PrimitiveKind,
        max_length: usize,
    ) -> Self {
        self.sequence(name, element, Some(max_length))
    }

    /// Embed another struct type.
    pub fn nested_field(self, name: impl Into<String>, nested: Arc<TypeDescriptor>) -> Self {
        self.push(name, nested)
    }

    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor::struct_type(self.name, self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_in_call_order() {
        let desc = TypeDescriptorBuilder::new("Heartbeat")
            .field("node", PrimitiveKind::U16)
            .string_field("status")
            .field("uptime_s", PrimitiveKind::U64)
            .build();

        let names: Vec<&str> = desc
            .fields()
            .unwrap_or_default()
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, ["node", "status", "uptime_s"]);
    }

    #[test]
    fn test_sequence_bounds_recorded() {
        let desc = TypeDescriptorBuilder::new("Frame")
            .bounded_sequence_field("pixels", PrimitiveKind::U8, 64)
            .sequence_field("depth", PrimitiveKind::F32)
            .build();

        let bound = |field: &str| match desc.field(field).map(|f| &f.type_desc.kind) {
            Some(TypeKind::Sequence(seq)) => seq.max_length,
            other => panic!("{} is not a sequence: {:?}", field, other),
        };
        assert_eq!(bound("pixels"), Some(64));
        assert_eq!(bound("depth"), None);
    }
}
