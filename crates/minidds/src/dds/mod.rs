// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # DDS Core API
//!
//! In-process publish/subscribe built on the DDS entity model.
//!
//! ## Overview
//!
//! - **TopicDirectory**: explicit registry of topics per domain; matches endpoints
//! - **Participant**: factory binding a directory and a domain id
//! - **DataWriter/DataReader**: endpoints that send/receive typed samples
//! - **QoS**: reader history depth (KEEP_LAST)
//!
//! ## Quick Start
//!
//! ```rust
//! use minidds::{HelloWorld, Participant, QoS, TopicDirectory};
//! use std::time::Duration;
//!
//! let directory = TopicDirectory::new();
//! let participant = Participant::builder("hello")
//!     .directory(directory.clone())
//!     .domain_id(0)
//!     .build()?;
//!
//! let reader = participant.create_reader::<HelloWorld>("HelloWorld", QoS::default())?;
//! let writer = participant.create_writer::<HelloWorld>("HelloWorld", QoS::default())?;
//!
//! writer.write(&HelloWorld::new("Hello world", 1))?;
//! assert!(reader.wait_for_sample(Duration::from_millis(100)));
//!
//! let mut sample = HelloWorld::default();
//! assert!(reader.take_sample(&mut sample));
//! assert_eq!(sample.index(), 1);
//! # Ok::<(), minidds::Error>(())
//! ```
//!
//! ## Entity Hierarchy
//!
//! ```text
//! TopicDirectory
//! +-- domain 0
//! |   +-- topic "HelloWorld" (HelloWorld)
//! |       +-- DataWriter<T> --TopicMerger--> DeliveryChannel --> DataReader<T>
//! +-- domain 1
//!     +-- ...
//! ```

mod domain_registry;
mod participant;
/// QoS policy definitions.
pub mod qos;
mod reader;
mod topic;
mod writer;

pub use domain_registry::{
    AttachToken, DomainId, EndpointId, EndpointKind, ReaderAttachment, TopicDirectory,
    WriterAttachment,
};
pub use participant::{Participant, ParticipantBuilder};
pub use qos::{History, QoS};
pub use reader::{DataReader, ReaderState, ReaderStats, SampleInfo};
pub use topic::TopicDescription;
pub use writer::DataWriter;

use crate::dynamic::{CodecError, DynamicData, DynamicDataError, TypeDescriptor};
use std::sync::Arc;

/// Errors returned by minidds operations.
///
/// Timeouts are not errors: `DataReader::wait_for_sample` reports them as
/// `false`.
///
/// ```rust
/// use minidds::{Error, Participant, QoS};
///
/// let participant = Participant::new("qos-check")?;
/// let err = participant
///     .create_reader::<minidds::HelloWorld>("HelloWorld", QoS::keep_last(0))
///     .unwrap_err();
/// assert!(matches!(err, Error::InvalidQos(_)));
/// # Ok::<(), Error>(())
/// ```
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// QoS policy is invalid (e.g., zero history depth).
    InvalidQos(String),
    /// Domain id above `config::MAX_DOMAIN_ID`.
    InvalidDomainId(u32),
    /// Topic name empty or too long.
    InvalidTopicName(String),
    /// Type descriptor cannot describe a sample (not a struct, duplicate fields).
    InvalidType(String),

    // ========================================================================
    // Data Errors
    // ========================================================================
    /// A name is already bound to a structurally different sample type.
    ///
    /// Raised by the type registry (name = type name) and by the topic
    /// directory (name = topic name).
    TypeConflict {
        name: String,
        existing: String,
        requested: String,
    },
    /// Encoded bytes (or a dynamic sample) do not conform to the sample type.
    MalformedSample(String),
    /// Encoded sample exceeds the configured maximum.
    SampleTooLarge { size: usize, max: usize },
    /// Field access on a dynamic sample failed.
    Field(DynamicDataError),

    // ========================================================================
    // Entity Errors
    // ========================================================================
    /// Endpoint was detached (or its directory was dropped).
    NotAttached,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidQos(msg) => write!(f, "Invalid QoS policy: {}", msg),
            Error::InvalidDomainId(id) => write!(
                f,
                "Invalid domain_id: {} (must be 0-{})",
                id,
                crate::config::MAX_DOMAIN_ID
            ),
            Error::InvalidTopicName(msg) => write!(f, "Invalid topic name: {}", msg),
            Error::InvalidType(msg) => write!(f, "Invalid sample type: {}", msg),
            Error::TypeConflict {
                name,
                existing,
                requested,
            } => write!(
                f,
                "Type conflict on '{}': registered as {}, requested {}",
                name, existing, requested
            ),
            Error::MalformedSample(msg) => write!(f, "Malformed sample: {}", msg),
            Error::SampleTooLarge { size, max } => {
                write!(f, "Sample too large: {} bytes (max {})", size, max)
            }
            Error::Field(e) => write!(f, "Field error: {}", e),
            Error::NotAttached => write!(f, "Endpoint is not attached"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Field(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DynamicDataError> for Error {
    fn from(e: DynamicDataError) -> Self {
        Error::Field(e)
    }
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Error::MalformedSample(e.to_string())
    }
}

/// Result alias for minidds operations.
pub type Result<T> = core::result::Result<T, Error>;

/// DDS trait: typed sample contract.
///
/// A sample type describes itself once (`type_descriptor`) and converts to
/// and from the dynamic representation used on the wire. Field order in the
/// descriptor is the encoding order.
pub trait DDS: Sized + Send + Sync + 'static {
    /// Type descriptor, built once and shared.
    fn type_descriptor() -> Arc<TypeDescriptor>;

    /// Convert to a dynamic sample conforming to `type_descriptor()`.
    fn to_dynamic(&self) -> Result<DynamicData>;

    /// Build from a dynamic sample.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a field is missing or has the wrong kind.
    fn from_dynamic(data: &DynamicData) -> Result<Self>;

    /// Overwrite `self` from a dynamic sample. Leaves `self` untouched on error.
    fn assign_from_dynamic(&mut self, data: &DynamicData) -> Result<()> {
        *self = Self::from_dynamic(data)?;
        Ok(())
    }
}
