// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # DDS DataWriter
//!
//! The [`DataWriter`] publishes typed samples to a topic.
//!
//! ## Overview
//!
//! A DataWriter:
//! - Encodes each sample once with the topic's sample type
//! - Hands the shared encoded form to every reader matched at publish time
//! - Preserves its own publish order toward each reader
//! - Never waits for readers (fire-and-forget)
//!
//! ## Example
//!
//! ```rust
//! use minidds::{HelloWorld, Participant, QoS, Result};
//!
//! fn main() -> Result<()> {
//!     let participant = Participant::builder("publisher")
//!         .domain_id(0)
//!         .build()?;
//!
//!     let writer = participant.create_writer::<HelloWorld>("HelloWorld", QoS::default())?;
//!
//!     // No reader yet: the sample is simply not delivered.
//!     writer.write(&HelloWorld::new("Hello world", 1))?;
//!     assert_eq!(writer.samples_written(), 1);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Delivery Path
//!
//! ```text
//! write() -> encode -> TopicMerger -+-> DeliveryChannel -> reader A history
//!                                   +-> DeliveryChannel -> reader B history
//! ```
//!
//! ## See Also
//!
//! - [`DataReader`](crate::DataReader) - The subscribing counterpart
//! - [`QoS`](crate::QoS) - Quality of Service configuration

mod runtime;

pub use runtime::DataWriter;
