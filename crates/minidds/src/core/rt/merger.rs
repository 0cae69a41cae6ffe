// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fan-out dispatcher from one writer to N reader channels.
//!
//! `TopicMerger` hands each published sample to every registered channel.
//! Publishing holds the read lock; attaching or detaching a reader takes the
//! write lock, so a publish in flight sees either the old or the new reader
//! set, never a half-updated one.

use super::channel::{DeliveryChannel, EndpointId};
use super::history::{EncodedSample, PushOutcome};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Per-writer fan-out set.
pub struct TopicMerger {
    channels: RwLock<Vec<Arc<DeliveryChannel>>>,
    closed: AtomicBool,
}

/// Summary of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Readers that accepted the sample.
    pub delivered: usize,
    /// Readers that had to drop an older sample to accept it.
    pub evicted: usize,
}

impl TopicMerger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Register a reader channel (called during matching).
    ///
    /// # Idempotence
    /// A second channel for the same reader is ignored. Returns `true` if the
    /// channel was newly added, `false` if already present or closed.
    pub fn add_channel(&self, channel: Arc<DeliveryChannel>) -> bool {
        let reader = channel.reader();
        let mut channels = recover_write(&self.channels, "TopicMerger::add_channel");

        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        if channels.iter().any(|c| c.reader() == reader) {
            log::debug!(
                "[TopicMerger] Reader {} already registered, ignoring duplicate",
                reader
            );
            return false;
        }

        channels.push(channel);
        log::debug!(
            "[TopicMerger] Registered reader {}, now have {} readers",
            reader,
            channels.len()
        );
        true
    }

    /// Unregister a reader. Waits for in-flight pushes to finish.
    pub fn remove_reader(&self, reader: EndpointId) -> bool {
        let mut channels = recover_write(&self.channels, "TopicMerger::remove_reader");
        let before = channels.len();
        channels.retain(|c| c.reader() != reader);
        before != channels.len()
    }

    /// Dispatch a sample to all readers (non-blocking, drop-oldest per reader).
    pub fn push(&self, sample: &EncodedSample) -> FanOut {
        let channels = recover_read(&self.channels, "TopicMerger::push");

        let mut fan_out = FanOut::default();
        for channel in channels.iter() {
            match channel.push(sample.clone()) {
                PushOutcome::Stored => fan_out.delivered += 1,
                PushOutcome::Evicted => {
                    fan_out.delivered += 1;
                    fan_out.evicted += 1;
                }
                PushOutcome::Closed => {}
            }
        }
        fan_out
    }

    /// Drop every channel and refuse new ones. Idempotent.
    pub fn close(&self) {
        let mut channels = recover_write(&self.channels, "TopicMerger::close");
        self.closed.store(true, Ordering::Release);
        channels.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Readers currently matched.
    #[must_use]
    pub fn reader_count(&self) -> usize {
        recover_read(&self.channels, "TopicMerger::reader_count").len()
    }

    /// Ids of the registered readers.
    #[must_use]
    pub fn readers(&self) -> Vec<EndpointId> {
        recover_read(&self.channels, "TopicMerger::readers")
            .iter()
            .map(|c| c.reader())
            .collect()
    }
}

impl Default for TopicMerger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TopicMerger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicMerger")
            .field("readers", &self.reader_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

// The channel list is never left half-updated, so a poisoned lock is safe to reuse.
fn recover_read<'a, T>(lock: &'a RwLock<T>, context: &str) -> RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(|poisoned| {
        log::warn!("[TopicMerger] {} found lock poisoned, recovering", context);
        poisoned.into_inner()
    })
}

fn recover_write<'a, T>(lock: &'a RwLock<T>, context: &str) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|poisoned| {
        log::warn!("[TopicMerger] {} found lock poisoned, recovering", context);
        poisoned.into_inner()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rt::HistoryQueue;

    fn sample(seq: u64) -> EncodedSample {
        EncodedSample {
            writer: EndpointId::from_raw(1),
            sequence: seq,
            source_timestamp_ns: 0,
            payload: Arc::from(vec![0u8; 4]),
        }
    }

    fn channel_to(reader: u64, queue: &Arc<HistoryQueue>) -> Arc<DeliveryChannel> {
        Arc::new(DeliveryChannel::new(
            EndpointId::from_raw(1),
            EndpointId::from_raw(reader),
            Arc::clone(queue),
        ))
    }

    #[test]
    fn test_channels_listed_in_match_order() {
        let merger = TopicMerger::new();
        assert!(merger.readers().is_empty());

        let q1 = Arc::new(HistoryQueue::new(16));
        let q2 = Arc::new(HistoryQueue::new(16));

        assert!(merger.add_channel(channel_to(2, &q1)));
        assert!(merger.add_channel(channel_to(3, &q2)));

        assert_eq!(
            merger.readers(),
            vec![EndpointId::from_raw(2), EndpointId::from_raw(3)]
        );
    }

    #[test]
    fn test_rematch_does_not_duplicate_delivery() {
        let merger = TopicMerger::new();
        let queue = Arc::new(HistoryQueue::new(16));

        assert!(merger.add_channel(channel_to(2, &queue)));
        assert!(
            !merger.add_channel(channel_to(2, &queue)),
            "reader 2 is already matched"
        );

        assert_eq!(merger.push(&sample(1)).delivered, 1);
        assert_eq!(queue.len(), 1, "delivered once despite the second match");
    }

    #[test]
    fn test_full_reader_evicts_without_blocking_others() {
        let merger = TopicMerger::new();
        let q1 = Arc::new(HistoryQueue::new(16));
        let q2 = Arc::new(HistoryQueue::new(1));

        merger.add_channel(channel_to(2, &q1));
        merger.add_channel(channel_to(3, &q2));

        assert_eq!(merger.push(&sample(1)).delivered, 2);
        let second = merger.push(&sample(2));
        assert_eq!(second, FanOut { delivered: 2, evicted: 1 });

        assert_eq!(q1.pop().map(|q| q.sample.sequence), Some(1));
        assert_eq!(q2.pop().map(|q| q.sample.sequence), Some(2));
    }

    #[test]
    fn test_push_with_no_readers_is_ok() {
        let merger = TopicMerger::new();
        assert_eq!(merger.push(&sample(1)), FanOut::default());
    }

    #[test]
    fn test_remove_and_close() {
        let merger = TopicMerger::new();
        let queue = Arc::new(HistoryQueue::new(4));
        merger.add_channel(channel_to(2, &queue));

        assert!(merger.remove_reader(EndpointId::from_raw(2)));
        assert!(!merger.remove_reader(EndpointId::from_raw(2)));
        assert_eq!(merger.push(&sample(1)).delivered, 0);

        merger.add_channel(channel_to(2, &queue));
        merger.close();
        assert!(merger.is_closed());
        assert!(merger.readers().is_empty());
        assert!(!merger.add_channel(channel_to(3, &queue)));
    }
}
