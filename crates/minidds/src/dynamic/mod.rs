// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sample types described at runtime.
//!
//! ```text
//! TypeDescriptorBuilder --build--> TypeDescriptor --register--> SampleTypeHandle
//!                                                                 |  encode / decode
//! DynamicData (type-checked field map) <---------------------------+
//! ```
//!
//! Descriptors are immutable. The registry binds each type name to one
//! structure for as long as a handle to it is alive, and the handle is what
//! endpoints use to move samples to and from bytes.
//!
//! ```rust
//! use minidds::dynamic::{DynamicData, PrimitiveKind, SampleTypeRegistry, TypeDescriptorBuilder};
//! use std::sync::Arc;
//!
//! let registry = SampleTypeRegistry::new();
//! let handle = registry
//!     .register(Arc::new(
//!         TypeDescriptorBuilder::new("Battery")
//!             .field("cell", PrimitiveKind::U8)
//!             .field("volts", PrimitiveKind::F32)
//!             .build(),
//!     ))
//!     .unwrap();
//!
//! let mut sample = DynamicData::new(handle.descriptor());
//! sample.set("cell", 3u8).unwrap();
//! sample.set("volts", 3.7f32).unwrap();
//!
//! let bytes = handle.encode(&sample).unwrap();
//! assert_eq!(handle.decode(&bytes).unwrap().get::<u8>("cell").unwrap(), 3);
//! ```

mod builder;
mod codec;
mod dynamic_data;
mod registry;
mod type_descriptor;
mod value;

pub use builder::TypeDescriptorBuilder;
pub use codec::{decode_sample, encode_sample, CodecError};
pub use dynamic_data::{DynamicData, DynamicDataError};
pub use registry::{SampleTypeHandle, SampleTypeRegistry, TypeId};
pub use type_descriptor::{
    FieldDescriptor, PrimitiveKind, SequenceDescriptor, TypeDescriptor, TypeKind,
};
pub use value::{DynamicValue, FromDynamicValue, IntoDynamicValue};
