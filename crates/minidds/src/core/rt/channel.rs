// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-pair delivery path from one writer to one reader.

use super::history::{EncodedSample, HistoryQueue, PushOutcome};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifier of an attached endpoint, unique within its directory.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct EndpointId(u64);

impl EndpointId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EndpointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ep-{}", self.0)
    }
}

/// Delivery channel for one matched (writer, reader) pair.
///
/// Pushes land in the reader's [`HistoryQueue`], which is shared by every
/// channel feeding that reader; ordering per writer is the order of `push`
/// calls, and overflow follows the reader's drop-oldest policy.
pub struct DeliveryChannel {
    writer: EndpointId,
    reader: EndpointId,
    queue: Arc<HistoryQueue>,
    delivered: AtomicU64,
    evicted: AtomicU64,
}

impl DeliveryChannel {
    #[must_use]
    pub fn new(writer: EndpointId, reader: EndpointId, queue: Arc<HistoryQueue>) -> Self {
        Self {
            writer,
            reader,
            queue,
            delivered: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
        }
    }

    pub fn writer(&self) -> EndpointId {
        self.writer
    }

    pub fn reader(&self) -> EndpointId {
        self.reader
    }

    /// Hand a sample to the reader. Never blocks beyond the queue mutex.
    pub fn push(&self, sample: EncodedSample) -> PushOutcome {
        let outcome = self.queue.push(sample);
        match outcome {
            PushOutcome::Stored => {
                self.delivered.fetch_add(1, Ordering::Relaxed);
            }
            PushOutcome::Evicted => {
                self.delivered.fetch_add(1, Ordering::Relaxed);
                self.evicted.fetch_add(1, Ordering::Relaxed);
            }
            PushOutcome::Closed => {}
        }
        outcome
    }

    /// Samples accepted by the reader through this channel.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Pushes through this channel that forced an eviction.
    pub fn evictions(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    /// Whether the reader side is gone.
    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }
}

impl std::fmt::Debug for DeliveryChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryChannel")
            .field("writer", &self.writer)
            .field("reader", &self.reader)
            .field("delivered", &self.delivered())
            .finish()
    }
}
