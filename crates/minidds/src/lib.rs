// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # minidds - in-process publish/subscribe
//!
//! Typed topics, writers and readers following the DDS entity model, with
//! every endpoint living in one process. Samples are encoded once with a
//! runtime-registered sample type and handed to every matched reader.
//!
//! ## Quick Start
//!
//! ```rust
//! use minidds::{HelloWorld, Participant, QoS, Result};
//! use std::time::Duration;
//!
//! fn main() -> Result<()> {
//!     let participant = Participant::builder("my_app")
//!         .domain_id(0)
//!         .build()?;
//!
//!     let reader = participant.create_reader::<HelloWorld>("HelloWorld", QoS::default())?;
//!     let writer = participant.create_writer::<HelloWorld>("HelloWorld", QoS::default())?;
//!
//!     writer.write(&HelloWorld::new("Hello world", 1))?;
//!
//!     if reader.wait_for_sample(Duration::from_secs(1)) {
//!         let mut sample = HelloWorld::default();
//!         if reader.take_sample(&mut sample) {
//!             println!("Received {} {}", sample.message(), sample.index());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |   Participant -> DataWriter<T> / DataReader<T>                      |
//! +---------------------------------------------------------------------+
//! |   TopicDirectory (domains, topics, matching) | SampleTypeRegistry   |
//! +---------------------------------------------------------------------+
//! |   TopicMerger -> DeliveryChannel -> HistoryQueue (drop-oldest)      |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TopicDirectory`] | Explicit registry of topics per domain |
//! | [`Participant`] | Factory binding a directory and a domain id |
//! | [`DataWriter`] | Publishes typed samples to a topic |
//! | [`DataReader`] | Receives typed samples with a bounded wait |
//! | [`QoS`] | Reader history depth |
//!
//! ## Modules Overview
//!
//! - [`dds`] - Core API (start here)
//! - [`dynamic`] - Sample type descriptors, dynamic samples, encoding
//! - [`config`] - Limits, defaults and environment overrides
//! - [`core`] - Delivery primitives (history queue, fan-out)

/// Global configuration (limits, defaults, runtime config).
pub mod config;
/// Delivery runtime (history queues, channels, fan-out).
pub mod core;
/// Core DDS API (Participant, DataReader, DataWriter, TopicDirectory).
pub mod dds;
/// Dynamic types: runtime sample descriptors and encoding.
pub mod dynamic;
/// Sample types shipped with the crate.
pub mod generated;

pub use dds::{
    DataReader, DataWriter, DomainId, EndpointId, Error, History, Participant,
    ParticipantBuilder, QoS, ReaderState, ReaderStats, Result, SampleInfo, TopicDescription,
    TopicDirectory, DDS,
};
pub use dynamic::{SampleTypeHandle, SampleTypeRegistry, TypeDescriptor};
pub use generated::HelloWorld;

/// minidds version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
