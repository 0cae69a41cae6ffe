// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sample type registry.
//!
//! Maps type names to immutable descriptors and hands out
//! [`SampleTypeHandle`]s, the only way to encode or decode a sample.
//!
//! Entries are held weakly: a type stays registered while at least one
//! handle (usually owned by a topic) is alive. Registering the same name
//! with a different field list while the first registration is alive fails
//! with [`Error::TypeConflict`].

use crate::dds::{Error, Result};
use crate::dynamic::{decode_sample, encode_sample, DynamicData, TypeDescriptor};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::{Arc, Weak};

/// Structural type identifier.
///
/// MD5 of the canonical rendering (type name + ordered fields), truncated to
/// 14 bytes. Equal ids mean equal descriptors for all practical purposes;
/// matching still compares descriptors.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId([u8; 14]);

impl TypeId {
    /// Compute the id of a descriptor.
    pub fn of(descriptor: &TypeDescriptor) -> Self {
        use md5::{Digest, Md5};
        let mut hasher = Md5::new();
        hasher.update(descriptor.canonical().as_bytes());
        let result = hasher.finalize();
        let mut bytes = [0u8; 14];
        bytes.copy_from_slice(&result[..14]);
        Self(bytes)
    }

    /// Get raw bytes
    pub const fn as_bytes(&self) -> &[u8; 14] {
        &self.0
    }
}

impl std::fmt::Debug for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TypeId(")?;
        for byte in &self.0[..4] {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, "...)")
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

struct RegisteredType {
    descriptor: Arc<TypeDescriptor>,
    type_id: TypeId,
}

/// Shared handle to a registered sample type.
#[derive(Clone)]
pub struct SampleTypeHandle {
    inner: Arc<RegisteredType>,
}

impl SampleTypeHandle {
    pub fn name(&self) -> &str {
        &self.inner.descriptor.name
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.inner.descriptor
    }

    pub fn type_id(&self) -> TypeId {
        self.inner.type_id
    }

    /// Structural identity: same name, same ordered fields.
    pub fn same_type(&self, other: &SampleTypeHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.inner.type_id == other.inner.type_id
                && *self.inner.descriptor == *other.inner.descriptor)
    }

    /// Encode a dynamic sample of this type.
    ///
    /// Deterministic: fields are written in descriptor order.
    pub fn encode(&self, data: &DynamicData) -> Result<Vec<u8>> {
        if !Arc::ptr_eq(data.descriptor(), &self.inner.descriptor)
            && **data.descriptor() != *self.inner.descriptor
        {
            return Err(Error::MalformedSample(format!(
                "sample of type '{}' does not conform to '{}'",
                data.type_name(),
                self.name()
            )));
        }
        encode_sample(data).map_err(Error::from)
    }

    /// Decode bytes produced by [`encode`](Self::encode).
    pub fn decode(&self, bytes: &[u8]) -> Result<DynamicData> {
        decode_sample(bytes, &self.inner.descriptor).map_err(Error::from)
    }
}

impl PartialEq for SampleTypeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_type(other)
    }
}

impl std::fmt::Debug for SampleTypeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleTypeHandle")
            .field("name", &self.name())
            .field("type_id", &self.inner.type_id)
            .finish()
    }
}

/// Registry of sample types, keyed by type name.
#[derive(Default)]
pub struct SampleTypeRegistry {
    types: DashMap<String, Weak<RegisteredType>>,
}

impl SampleTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor (idempotent for identical descriptors).
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidType`] if the descriptor is not a struct with unique,
    ///   non-empty field names.
    /// - [`Error::TypeConflict`] if the name is live with a different shape.
    pub fn register(&self, descriptor: Arc<TypeDescriptor>) -> Result<SampleTypeHandle> {
        validate_descriptor(&descriptor)?;

        match self.types.entry(descriptor.name.clone()) {
            Entry::Occupied(mut occupied) => {
                if let Some(existing) = occupied.get().upgrade() {
                    if *existing.descriptor == *descriptor {
                        return Ok(SampleTypeHandle { inner: existing });
                    }
                    log::warn!(
                        "[TypeRegistry] Rejecting redefinition of '{}'",
                        descriptor.name
                    );
                    return Err(Error::TypeConflict {
                        name: descriptor.name.clone(),
                        existing: existing.descriptor.canonical(),
                        requested: descriptor.canonical(),
                    });
                }
                let registered = Self::make(descriptor);
                occupied.insert(Arc::downgrade(&registered));
                Ok(SampleTypeHandle { inner: registered })
            }
            Entry::Vacant(vacant) => {
                let registered = Self::make(descriptor);
                vacant.insert(Arc::downgrade(&registered));
                Ok(SampleTypeHandle { inner: registered })
            }
        }
    }

    /// Register a struct type from `(field name, field type)` pairs.
    pub fn register_fields(
        &self,
        name: &str,
        fields: Vec<crate::dynamic::FieldDescriptor>,
    ) -> Result<SampleTypeHandle> {
        self.register(Arc::new(TypeDescriptor::struct_type(name, fields)))
    }

    /// Look up a live registration by name.
    pub fn get(&self, name: &str) -> Option<SampleTypeHandle> {
        self.types
            .get(name)
            .and_then(|weak| weak.upgrade())
            .map(|inner| SampleTypeHandle { inner })
    }

    /// Encode `data` as `handle`'s type.
    pub fn encode(&self, handle: &SampleTypeHandle, data: &DynamicData) -> Result<Vec<u8>> {
        handle.encode(data)
    }

    /// Decode `bytes` as `handle`'s type.
    pub fn decode(&self, handle: &SampleTypeHandle, bytes: &[u8]) -> Result<DynamicData> {
        handle.decode(bytes)
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.types
            .iter()
            .filter(|entry| entry.value().strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries whose last handle is gone.
    pub fn prune(&self) {
        self.types.retain(|_, weak| weak.strong_count() > 0);
    }

    /// Entries held by the map, live or not.
    pub(crate) fn slot_count(&self) -> usize {
        self.types.len()
    }

    fn make(descriptor: Arc<TypeDescriptor>) -> Arc<RegisteredType> {
        let type_id = TypeId::of(&descriptor);
        log::debug!(
            "[TypeRegistry] Registered '{}' as {}",
            descriptor.name,
            type_id
        );
        Arc::new(RegisteredType {
            descriptor,
            type_id,
        })
    }
}

impl std::fmt::Debug for SampleTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleTypeRegistry")
            .field("live_types", &self.len())
            .finish()
    }
}

fn validate_descriptor(descriptor: &TypeDescriptor) -> Result<()> {
    if descriptor.name.is_empty() {
        return Err(Error::InvalidType("type name is empty".into()));
    }
    let fields = descriptor
        .fields()
        .ok_or_else(|| Error::InvalidType(format!("'{}' is not a struct", descriptor.name)))?;

    let mut seen = HashSet::with_capacity(fields.len());
    for field in fields {
        if field.name.is_empty() {
            return Err(Error::InvalidType(format!(
                "'{}' has an unnamed field",
                descriptor.name
            )));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(Error::InvalidType(format!(
                "'{}' declares field '{}' twice",
                descriptor.name, field.name
            )));
        }
    }
    Ok(())
}
