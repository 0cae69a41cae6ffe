// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use crate::config::RuntimeConfig;
use crate::core::rt::{self, EncodedSample, TopicMerger};
use crate::dds::{
    AttachToken, DomainId, EndpointId, Error, Participant, QoS, Result, WriterAttachment, DDS,
};
use crate::dynamic::{DynamicData, SampleTypeHandle};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A typed DataWriter that publishes samples to a topic.
///
/// `DataWriter<T>` encodes samples of type `T` and delivers them to every
/// matching [`DataReader<T>`](crate::DataReader) attached at the time of the
/// write.
///
/// # Delivery Guarantees
///
/// - **Fire-and-forget**: `write` returns once the sample is queued at each
///   matched reader; it does not wait for anyone to take it
/// - **FIFO per writer**: sequence assignment and fan-out are serialized, so
///   each reader sees this writer's samples in publish order
/// - **Late joiners** see only samples published after they attached
///
/// # Thread Safety
///
/// `DataWriter<T>` is `Send + Sync`; concurrent `write` calls on the same
/// writer are serialized.
pub struct DataWriter<T: DDS> {
    topic: String,
    domain_id: DomainId,
    qos: QoS,
    sample_type: SampleTypeHandle,
    merger: Arc<TopicMerger>,
    /// Last assigned sequence number. Held across the fan-out.
    next_seq: Mutex<u64>,
    written: AtomicU64,
    config: RuntimeConfig,
    /// Detaches from the directory on drop
    token: AttachToken,
    _phantom: core::marker::PhantomData<T>,
    /// Keeps the directory alive for as long as the endpoint exists.
    /// Declared last so the token detaches before it is released.
    participant: Arc<Participant>,
}

impl<T: DDS> DataWriter<T> {
    pub(crate) fn new(
        topic: String,
        domain_id: DomainId,
        qos: QoS,
        sample_type: SampleTypeHandle,
        attachment: WriterAttachment,
        config: RuntimeConfig,
        participant: Arc<Participant>,
    ) -> Self {
        Self {
            topic,
            domain_id,
            qos,
            sample_type,
            merger: attachment.merger,
            next_seq: Mutex::new(0),
            written: AtomicU64::new(0),
            config,
            token: attachment.token,
            _phantom: core::marker::PhantomData,
            participant,
        }
    }

    /// Publish a sample to every currently matched reader.
    ///
    /// Succeeds with zero matched readers.
    ///
    /// # Errors
    ///
    /// - `NotAttached` after [`detach`](Self::detach)
    /// - `MalformedSample` / `Field` if `msg` does not convert to the topic type
    /// - `SampleTooLarge` if the encoded form exceeds the configured maximum
    pub fn write(&self, msg: &T) -> Result<()> {
        if !self.token.is_attached() {
            return Err(Error::NotAttached);
        }
        let data = msg.to_dynamic()?;
        self.write_dynamic(&data)
    }

    /// Alias of [`write`](Self::write).
    pub fn write_sample(&self, sample: &T) -> Result<()> {
        self.write(sample)
    }

    /// Publish a dynamic sample of the topic's type.
    pub fn write_dynamic(&self, data: &DynamicData) -> Result<()> {
        let payload = self.sample_type.encode(data)?;
        self.publish(payload)
    }

    /// Publish pre-encoded bytes without validating them.
    ///
    /// Readers reject undecodable payloads at take time.
    pub fn write_raw(&self, payload: &[u8]) -> Result<()> {
        self.publish(payload.to_vec())
    }

    fn publish(&self, payload: Vec<u8>) -> Result<()> {
        let max = self.config.max_sample_size();
        if payload.len() > max {
            return Err(Error::SampleTooLarge {
                size: payload.len(),
                max,
            });
        }
        let payload: Arc<[u8]> = Arc::from(payload);

        let mut next_seq = self.next_seq.lock();
        if !self.token.is_attached() || self.merger.is_closed() {
            return Err(Error::NotAttached);
        }
        *next_seq += 1;
        let sample = EncodedSample {
            writer: self.token.id(),
            sequence: *next_seq,
            source_timestamp_ns: rt::now_ns(),
            payload,
        };
        let fan_out = self.merger.push(&sample);
        drop(next_seq);

        self.written.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "[writer] topic='{}' seq={} len={} delivered={} evicted={}",
            self.topic,
            sample.sequence,
            sample.payload.len(),
            fan_out.delivered,
            fan_out.evicted
        );
        Ok(())
    }

    /// Detach from the topic. Later writes fail with `NotAttached`.
    ///
    /// Returns `true` on the first call. Dropping the writer does the same.
    pub fn detach(&self) -> bool {
        self.token.detach()
    }

    /// Whether the writer is still attached to a live directory.
    pub fn is_attached(&self) -> bool {
        self.token.is_attached()
    }

    /// Readers currently matched with this writer, sorted by id.
    pub fn matched_readers(&self) -> Vec<EndpointId> {
        self.token
            .directory()
            .map(|directory| directory.matched_readers(self.token.id()))
            .unwrap_or_default()
    }

    /// Samples successfully published since creation.
    pub fn samples_written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
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

    /// Sample type of the topic.
    pub fn sample_type(&self) -> &SampleTypeHandle {
        &self.sample_type
    }

    /// Participant that created this writer.
    pub fn participant(&self) -> &Arc<Participant> {
        &self.participant
    }
}

impl<T: DDS> std::fmt::Debug for DataWriter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataWriter")
            .field("id", &self.token.id())
            .field("topic", &self.topic)
            .field("domain_id", &self.domain_id)
            .field("written", &self.samples_written())
            .finish()
    }
}
