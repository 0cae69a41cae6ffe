// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use crate::core::rt::{HistoryQueue, QueuedSample, WaitOutcome};
use crate::dds::{
    AttachToken, DomainId, EndpointId, Error, Participant, QoS, ReaderAttachment, Result, DDS,
};
use crate::dynamic::{DynamicData, SampleTypeHandle};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Observable reader state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReaderState {
    /// No wait in progress.
    Idle = 0,
    /// A `wait_for_sample` call is blocked.
    Waiting = 1,
    /// The last wait found a sample.
    Ready = 2,
    /// The last wait hit its deadline.
    TimedOut = 3,
    /// Detached; every operation is inert.
    Detached = 4,
}

impl ReaderState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Waiting,
            2 => Self::Ready,
            3 => Self::TimedOut,
            4 => Self::Detached,
            _ => Self::Idle,
        }
    }
}

/// Reader statistics.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderStats {
    /// Samples that entered the history.
    pub received: u64,
    /// Samples taken and decoded successfully.
    pub taken: u64,
    /// Samples evicted unread by overflow.
    pub dropped: u64,
    /// Samples taken that failed to decode.
    pub malformed: u64,
}

/// Metadata accompanying a taken sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleInfo {
    /// Publishing writer.
    pub writer: EndpointId,
    /// Writer's sequence number (starts at 1).
    pub sequence: u64,
    /// Wall clock at publish, nanoseconds since the Unix epoch.
    pub source_timestamp_ns: u64,
    /// Wall clock at arrival in this reader's history.
    pub reception_timestamp_ns: u64,
}

impl From<&QueuedSample> for SampleInfo {
    fn from(queued: &QueuedSample) -> Self {
        Self {
            writer: queued.sample.writer,
            sequence: queued.sample.sequence,
            source_timestamp_ns: queued.sample.source_timestamp_ns,
            reception_timestamp_ns: queued.reception_timestamp_ns,
        }
    }
}

/// A typed DataReader that receives samples on a topic.
///
/// `DataReader<T>` receives samples of type `T` from matching
/// [`DataWriter<T>`](crate::DataWriter) instances and decodes them on take.
///
/// # Malformed samples
///
/// A payload that does not decode as `T` is consumed, counted in
/// [`ReaderStats::malformed`] and logged. `take_sample` reports it as
/// `false`; `take` surfaces it as `Error::MalformedSample`. Later takes are
/// unaffected.
///
/// # Thread Safety
///
/// `DataReader<T>` is `Send + Sync`. Several threads may wait on the same
/// reader; each sample is taken by exactly one of them.
pub struct DataReader<T: DDS> {
    topic: String,
    domain_id: DomainId,
    qos: QoS,
    sample_type: SampleTypeHandle,
    queue: Arc<HistoryQueue>,
    state: AtomicU8,
    taken: AtomicU64,
    malformed: AtomicU64,
    /// Detaches from the directory on drop
    token: AttachToken,
    _phantom: core::marker::PhantomData<T>,
    /// Keeps the directory alive for as long as the endpoint exists.
    /// Declared last so the token detaches before it is released.
    participant: Arc<Participant>,
}

impl<T: DDS> DataReader<T> {
    pub(crate) fn new(
        topic: String,
        domain_id: DomainId,
        qos: QoS,
        sample_type: SampleTypeHandle,
        queue: Arc<HistoryQueue>,
        attachment: ReaderAttachment,
        participant: Arc<Participant>,
    ) -> Self {
        Self {
            topic,
            domain_id,
            qos,
            sample_type,
            queue,
            state: AtomicU8::new(ReaderState::Idle as u8),
            taken: AtomicU64::new(0),
            malformed: AtomicU64::new(0),
            token: attachment.token,
            _phantom: core::marker::PhantomData,
            participant,
        }
    }

    /// Block until a sample is available or `timeout` elapses.
    ///
    /// Returns `true` if at least one sample can be taken. Returns `false`
    /// on timeout, and immediately (or as soon as it happens) once the
    /// reader is detached.
    pub fn wait_for_sample(&self, timeout: Duration) -> bool {
        if !self.token.is_attached() {
            self.set_state(ReaderState::Detached);
            return false;
        }

        self.set_state(ReaderState::Waiting);
        match self.queue.wait_nonempty(timeout) {
            WaitOutcome::Ready => {
                self.set_state(ReaderState::Ready);
                true
            }
            WaitOutcome::TimedOut => {
                self.set_state(ReaderState::TimedOut);
                false
            }
            WaitOutcome::Closed => {
                self.set_state(ReaderState::Detached);
                false
            }
        }
    }

    /// Take the oldest sample into `sample`.
    ///
    /// Returns `false` if the history is empty, the sample is malformed
    /// (in which case it is consumed and `sample` is left untouched), or the
    /// reader is detached.
    pub fn take_sample(&self, sample: &mut T) -> bool {
        let (data, info) = match self.next_dynamic() {
            Ok(Some(next)) => next,
            Ok(None) => return false,
            Err(e) => {
                log::debug!("[reader] take_sample on '{}' failed: {}", self.topic, e);
                return false;
            }
        };

        match sample.assign_from_dynamic(&data) {
            Ok(()) => {
                self.taken.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(e) => {
                self.reject(&info, &e);
                false
            }
        }
    }

    /// Take the oldest sample, removing it from the history.
    ///
    /// # Returns
    /// - `Ok(Some(sample))` if a sample was available
    /// - `Ok(None)` if the history is empty
    /// - `Err(MalformedSample)` if the sample failed to decode (it is consumed)
    /// - `Err(NotAttached)` once detached
    pub fn take(&self) -> Result<Option<T>> {
        Ok(self.take_with_info()?.map(|(sample, _)| sample))
    }

    /// Take the oldest sample together with its metadata.
    pub fn take_with_info(&self) -> Result<Option<(T, SampleInfo)>> {
        let Some((data, info)) = self.next_dynamic()? else {
            return Ok(None);
        };

        match T::from_dynamic(&data) {
            Ok(sample) => {
                self.taken.fetch_add(1, Ordering::Relaxed);
                Ok(Some((sample, info)))
            }
            Err(e) => {
                self.reject(&info, &e);
                Err(Error::MalformedSample(e.to_string()))
            }
        }
    }

    /// Take up to `max` samples. Stops at the first malformed one.
    pub fn take_batch(&self, max: usize) -> Result<Vec<T>> {
        let mut samples = Vec::with_capacity(max.min(self.queue.depth()));
        for _ in 0..max {
            match self.take()? {
                Some(sample) => samples.push(sample),
                None => break,
            }
        }
        Ok(samples)
    }

    /// Pop and decode the next sample into its dynamic form.
    fn next_dynamic(&self) -> Result<Option<(DynamicData, SampleInfo)>> {
        if !self.token.is_attached() || self.queue.is_closed() {
            self.set_state(ReaderState::Detached);
            return Err(Error::NotAttached);
        }
        // Any take, even an empty one, settles a pending wait outcome.
        self.set_state(ReaderState::Idle);
        let Some(queued) = self.queue.pop() else {
            return Ok(None);
        };

        let info = SampleInfo::from(&queued);
        match self.sample_type.decode(&queued.sample.payload) {
            Ok(data) => Ok(Some((data, info))),
            Err(e) => {
                self.reject(&info, &e);
                Err(e)
            }
        }
    }

    fn reject(&self, info: &SampleInfo, err: &Error) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
        log::warn!(
            "[reader] Bad sample on '{}' from {} seq={}: {}",
            self.topic,
            info.writer,
            info.sequence,
            err
        );
    }

    /// Detach from the topic and wake every blocked `wait_for_sample`.
    ///
    /// Returns `true` on the first call. Dropping the reader does the same.
    pub fn detach(&self) -> bool {
        let first = self.token.detach();
        // Directory already gone: nobody else will close the history.
        self.queue.close();
        self.set_state(ReaderState::Detached);
        first
    }

    pub fn is_attached(&self) -> bool {
        self.token.is_attached()
    }

    pub fn state(&self) -> ReaderState {
        if !self.token.is_attached() {
            return ReaderState::Detached;
        }
        ReaderState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn stats(&self) -> ReaderStats {
        ReaderStats {
            received: self.queue.received(),
            taken: self.taken.load(Ordering::Relaxed),
            dropped: self.queue.dropped(),
            malformed: self.malformed.load(Ordering::Relaxed),
        }
    }

    /// Writers currently matched with this reader, sorted by id.
    pub fn matched_writers(&self) -> Vec<EndpointId> {
        self.token
            .directory()
            .map(|directory| directory.matched_writers(self.token.id()))
            .unwrap_or_default()
    }

    /// Samples waiting to be taken.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn id(&self) -> EndpointId {
        self.token.id()
    }

    #[must_use]
    pub fn topic_name(&self) -> &str {
        &self.topic
    }

    pub fn domain_id(&self) -> DomainId {
        self.domain_id
    }

    #[must_use]
    pub fn qos(&self) -> &QoS {
        &self.qos
    }

    pub fn sample_type(&self) -> &SampleTypeHandle {
        &self.sample_type
    }

    /// Participant that created this reader.
    pub fn participant(&self) -> &Arc<Participant> {
        &self.participant
    }

    fn set_state(&self, state: ReaderState) {
        if state == ReaderState::Detached {
            self.state.store(state as u8, Ordering::Release);
            return;
        }
        // Detached is terminal.
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != ReaderState::Detached as u8).then_some(state as u8)
            });
    }
}

impl<T: DDS> std::fmt::Debug for DataReader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataReader")
            .field("id", &self.token.id())
            .field("topic", &self.topic)
            .field("domain_id", &self.domain_id)
            .field("state", &self.state())
            .field("pending", &self.len())
            .finish()
    }
}
