// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # DDS DataReader
//!
//! The [`DataReader`] receives samples published on a topic.
//!
//! ## Overview
//!
//! A DataReader:
//! - Receives samples from every matching DataWriter
//! - Buffers them in a bounded history (KEEP_LAST, drops oldest on overflow)
//! - Offers a bounded blocking wait and non-blocking take
//! - Tracks sample metadata (writer, sequence number, timestamps)
//!
//! ## Example
//!
//! ```rust
//! use minidds::{HelloWorld, Participant, QoS, Result};
//! use std::time::Duration;
//!
//! fn main() -> Result<()> {
//!     let participant = Participant::builder("subscriber")
//!         .domain_id(0)
//!         .build()?;
//!
//!     let reader = participant.create_reader::<HelloWorld>("HelloWorld", QoS::default())?;
//!
//!     if reader.wait_for_sample(Duration::from_millis(10)) {
//!         while let Some(sample) = reader.take()? {
//!             println!("Received {} {}", sample.message(), sample.index());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## State Machine
//!
//! ```text
//! Idle --wait_for_sample--> Waiting --+--> Ready    --take--> Idle
//!                                     +--> TimedOut --take--> Idle
//! (take on an empty history also returns to Idle)
//! (any) --detach--> Detached
//! ```
//!
//! ## See Also
//!
//! - [`DataWriter`](crate::DataWriter) - The publishing counterpart
//! - [`QoS`](crate::QoS) - Quality of Service configuration

mod runtime;

pub use runtime::{DataReader, ReaderState, ReaderStats, SampleInfo};
