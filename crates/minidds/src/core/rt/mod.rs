// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime primitives for sample delivery.

pub mod channel;
pub mod history;
pub mod merger;

pub use channel::{DeliveryChannel, EndpointId};
pub use history::{now_ns, EncodedSample, HistoryQueue, PushOutcome, QueuedSample, WaitOutcome};
pub use merger::{FanOut, TopicMerger};
