// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `HelloWorld` sample type.
//!
//! ```text
//! struct HelloWorld {
//!     string message;
//!     unsigned long index;
//! };
//! ```

use crate::dds::{Result, DDS};
use crate::dynamic::{DynamicData, PrimitiveKind, TypeDescriptor, TypeDescriptorBuilder};
use std::sync::{Arc, OnceLock};

static DESCRIPTOR: OnceLock<Arc<TypeDescriptor>> = OnceLock::new();

/// Greeting sample: a text message and a publish index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelloWorld {
    message: String,
    index: u32,
}

impl HelloWorld {
    pub fn new(message: impl Into<String>, index: u32) -> Self {
        Self {
            message: message.into(),
            index,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn set_index(&mut self, index: u32) {
        self.index = index;
    }
}

impl DDS for HelloWorld {
    fn type_descriptor() -> Arc<TypeDescriptor> {
        Arc::clone(DESCRIPTOR.get_or_init(|| {
            Arc::new(
                TypeDescriptorBuilder::new("HelloWorld")
                    .string_field("message")
                    .field("index", PrimitiveKind::U32)
                    .build(),
            )
        }))
    }

    fn to_dynamic(&self) -> Result<DynamicData> {
        let mut data = DynamicData::new(&Self::type_descriptor());
        data.set("message", self.message.as_str())?;
        data.set("index", self.index)?;
        Ok(data)
    }

    fn from_dynamic(data: &DynamicData) -> Result<Self> {
        Ok(Self {
            message: data.get::<String>("message")?,
            index: data.get::<u32>("index")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::SampleTypeRegistry;

    #[test]
    fn test_accessors() {
        let mut sample = HelloWorld::default();
        assert_eq!(sample.message(), "");
        assert_eq!(sample.index(), 0);

        sample.set_message("Hello world");
        sample.set_index(3);
        assert_eq!(sample, HelloWorld::new("Hello world", 3));
    }

    #[test]
    fn test_descriptor_is_shared() {
        let a = HelloWorld::type_descriptor();
        let b = HelloWorld::type_descriptor();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.canonical(), "HelloWorld{message:string,index:u32}");
    }

    #[test]
    fn test_roundtrip_through_handle() {
        let registry = SampleTypeRegistry::new();
        let handle = registry
            .register(HelloWorld::type_descriptor())
            .expect("register");

        let original = HelloWorld::new("Hello world", 42);
        let bytes = handle
            .encode(&original.to_dynamic().expect("to_dynamic"))
            .expect("encode");
        // u32 length (12) + "Hello world\0" + u32 index
        assert_eq!(bytes.len(), 4 + 12 + 4);

        let decoded = HelloWorld::from_dynamic(&handle.decode(&bytes).expect("decode"))
            .expect("from_dynamic");
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_assign_leaves_target_on_error() {
        let other = Arc::new(
            TypeDescriptorBuilder::new("Other")
                .field("value", PrimitiveKind::F64)
                .build(),
        );
        let data = DynamicData::new(&other);

        let mut sample = HelloWorld::new("keep", 9);
        assert!(sample.assign_from_dynamic(&data).is_err());
        assert_eq!(sample, HelloWorld::new("keep", 9));
    }
}
