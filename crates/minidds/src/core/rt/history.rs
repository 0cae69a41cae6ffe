// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounded reader history with blocking wait.
//!
//! ```text
//! push (writers) --> [S0][S1][S2]...[Sdepth-1] --> pop (reader)
//!                     ^ evicted first when full
//! ```
//!
//! One queue per reader. Writers never block on it beyond the mutex: a full
//! queue drops its oldest unread sample to admit the new one (KEEP_LAST).
//! Readers park on a condition variable until a sample arrives, the deadline
//! passes, or the queue is closed.

use super::channel::EndpointId;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Wall-clock timestamp in nanoseconds since the Unix epoch.
pub fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// An encoded sample as it travels from one writer to its readers.
///
/// The payload is immutable and shared, so fan-out to N readers costs N
/// reference count increments.
#[derive(Debug, Clone)]
pub struct EncodedSample {
    /// Publishing writer.
    pub writer: EndpointId,
    /// Per-writer sequence number, starting at 1.
    pub sequence: u64,
    /// Time the writer published the sample.
    pub source_timestamp_ns: u64,
    /// Encoded bytes.
    pub payload: Arc<[u8]>,
}

/// A sample held in a reader's history.
#[derive(Debug, Clone)]
pub struct QueuedSample {
    pub sample: EncodedSample,
    /// Time the sample entered this reader's history.
    pub reception_timestamp_ns: u64,
}

/// Result of pushing into a history queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Stored without loss.
    Stored,
    /// Stored; the oldest unread sample was dropped to make room.
    Evicted,
    /// Queue is closed; sample discarded.
    Closed,
}

/// Result of waiting on a history queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// At least one sample is available.
    Ready,
    /// Deadline passed with the queue still empty.
    TimedOut,
    /// Queue was closed (reader detached).
    Closed,
}

struct QueueState {
    samples: VecDeque<QueuedSample>,
    closed: bool,
}

/// Bounded, thread-safe reader history (drop-oldest on overflow).
pub struct HistoryQueue {
    state: Mutex<QueueState>,
    available: Condvar,
    depth: usize,
    received: AtomicU64,
    dropped: AtomicU64,
}

impl HistoryQueue {
    /// Create a queue holding at most `depth` samples (minimum 1).
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            state: Mutex::new(QueueState {
                samples: VecDeque::with_capacity(depth),
                closed: false,
            }),
            available: Condvar::new(),
            depth,
            received: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Append a sample, evicting the oldest when full. Never blocks.
    pub fn push(&self, sample: EncodedSample) -> PushOutcome {
        let mut state = self.state.lock();
        if state.closed {
            return PushOutcome::Closed;
        }

        let mut outcome = PushOutcome::Stored;
        if state.samples.len() >= self.depth {
            if let Some(evicted) = state.samples.pop_front() {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::debug!(
                    "[HistoryQueue] depth {} reached, dropped seq {} from writer {}",
                    self.depth,
                    evicted.sample.sequence,
                    evicted.sample.writer
                );
            }
            outcome = PushOutcome::Evicted;
        }

        state.samples.push_back(QueuedSample {
            sample,
            reception_timestamp_ns: now_ns(),
        });
        self.received.fetch_add(1, Ordering::Relaxed);
        drop(state);

        self.available.notify_all();
        outcome
    }

    /// Remove and return the oldest sample.
    pub fn pop(&self) -> Option<QueuedSample> {
        let mut state = self.state.lock();
        if state.closed {
            return None;
        }
        state.samples.pop_front()
    }

    /// Block until a sample is available, `timeout` elapses, or the queue is
    /// closed. Spurious wakeups re-wait against the original deadline.
    pub fn wait_nonempty(&self, timeout: Duration) -> WaitOutcome {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();

        loop {
            if state.closed {
                return WaitOutcome::Closed;
            }
            if !state.samples.is_empty() {
                return WaitOutcome::Ready;
            }

            match deadline {
                Some(deadline) => {
                    if self.available.wait_until(&mut state, deadline).timed_out() {
                        return if state.closed {
                            WaitOutcome::Closed
                        } else if state.samples.is_empty() {
                            WaitOutcome::TimedOut
                        } else {
                            WaitOutcome::Ready
                        };
                    }
                }
                // Timeout too large to represent: wait without deadline.
                None => self.available.wait(&mut state),
            }
        }
    }

    /// Close the queue: discard buffered samples and wake every waiter.
    ///
    /// Idempotent. Returns `true` on the first call.
    pub fn close(&self) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.closed = true;
        state.samples.clear();
        drop(state);

        self.available.notify_all();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.state.lock().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of buffered samples.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Samples accepted since creation (including later evicted ones).
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Samples evicted by overflow.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for HistoryQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryQueue")
            .field("depth", &self.depth)
            .field("len", &self.len())
            .field("dropped", &self.dropped())
            .finish()
    }
}
