// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topic directory for intra-process endpoint matching.
//!
//! A writer and a reader are matched when they attach to the same topic name
//! in the same domain with the same sample type. Matching wires a
//! [`DeliveryChannel`] from the writer's [`TopicMerger`] into the reader's
//! [`HistoryQueue`].
//!
//! # Architecture
//!
//! ```text
//! TopicDirectory (explicit, shared through Arc)
//! +-- types: SampleTypeRegistry
//! +-- state: RwLock<DirectoryState>
//!     +-- domains: HashMap<DomainId, HashMap<topic, TopicEntry>>
//!     |   TopicEntry
//!     |   +-- sample_type: SampleTypeHandle
//!     |   +-- writers: Vec<(EndpointId, Arc<TopicMerger>)>
//!     |   +-- readers: Vec<(EndpointId, Arc<HistoryQueue>)>
//!     +-- endpoints: HashMap<EndpointId, (domain, topic, kind)>
//! ```
//!
//! # Lifecycle
//!
//! 1. First attach on a name creates the topic and pins its sample type
//! 2. Writer attach -> channels to every existing reader
//! 3. Reader attach -> a channel from every existing writer
//! 4. Detach -> channels removed, reader queue closed, topic removed when empty
//!
//! # Thread Safety
//!
//! Attach/detach hold the directory write lock, then a merger write lock.
//! Publishing never touches the directory: it holds its merger read lock and
//! then a queue mutex. Lock order is therefore directory -> merger -> queue.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use crate::config::{RuntimeConfig, MAX_DOMAIN_ID, MAX_TOPIC_NAME_LEN};
use crate::core::rt::{DeliveryChannel, HistoryQueue, TopicMerger};
use crate::dds::topic::TopicDescription;
use crate::dds::{Error, Result};
use crate::dynamic::{SampleTypeHandle, SampleTypeRegistry};

pub use crate::core::rt::EndpointId;

/// Domain ID type (0-232)
pub type DomainId = u32;

/// Kind of attached endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Reader,
    Writer,
}

struct WriterEntry {
    id: EndpointId,
    merger: Arc<TopicMerger>,
}

struct ReaderEntry {
    id: EndpointId,
    queue: Arc<HistoryQueue>,
}

struct TopicEntry {
    sample_type: SampleTypeHandle,
    writers: Vec<WriterEntry>,
    readers: Vec<ReaderEntry>,
}

impl TopicEntry {
    fn is_empty(&self) -> bool {
        self.writers.is_empty() && self.readers.is_empty()
    }
}

struct EndpointLocation {
    domain: DomainId,
    topic: Arc<str>,
    kind: EndpointKind,
}

#[derive(Default)]
struct DirectoryState {
    domains: HashMap<DomainId, HashMap<Arc<str>, TopicEntry>>,
    endpoints: HashMap<EndpointId, EndpointLocation>,
}

/// Token held by an attached endpoint.
///
/// When dropped, automatically detaches the endpoint from the directory.
/// This ensures cleanup even on panic/early return.
pub struct AttachToken {
    directory: Weak<TopicDirectory>,
    id: EndpointId,
    detached: AtomicBool,
}

impl AttachToken {
    fn new(directory: &Arc<TopicDirectory>, id: EndpointId) -> Self {
        Self {
            directory: Arc::downgrade(directory),
            id,
            detached: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> EndpointId {
        self.id
    }

    /// Whether this endpoint is still attached to a live directory.
    pub fn is_attached(&self) -> bool {
        !self.detached.load(Ordering::Acquire) && self.directory.strong_count() > 0
    }

    /// Live directory, if the endpoint is still attached.
    pub fn directory(&self) -> Option<Arc<TopicDirectory>> {
        if self.detached.load(Ordering::Acquire) {
            return None;
        }
        self.directory.upgrade()
    }

    /// Detach now. Returns `true` on the first call.
    pub fn detach(&self) -> bool {
        if self.detached.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(directory) = self.directory.upgrade() {
            directory.detach(self.id);
        }
        true
    }
}

impl Drop for AttachToken {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for AttachToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachToken")
            .field("id", &self.id)
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Result of attaching a writer.
#[derive(Debug)]
pub struct WriterAttachment {
    pub token: AttachToken,
    /// Fan-out set, kept up to date by the directory as readers come and go.
    pub merger: Arc<TopicMerger>,
}

/// Result of attaching a reader.
#[derive(Debug)]
pub struct ReaderAttachment {
    pub token: AttachToken,
}

/// Directory of topics, partitioned by domain.
pub struct TopicDirectory {
    state: RwLock<DirectoryState>,
    types: SampleTypeRegistry,
    config: RuntimeConfig,
    next_id: AtomicU64,
}

impl TopicDirectory {
    /// Create an empty directory configured from the environment.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Self::with_config(RuntimeConfig::from_env())
    }

    /// Create an empty directory with an explicit configuration.
    #[must_use]
    pub fn with_config(config: RuntimeConfig) -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(DirectoryState::default()),
            types: SampleTypeRegistry::new(),
            config,
            next_id: AtomicU64::new(1),
        })
    }

    /// Sample types known to this directory.
    pub fn types(&self) -> &SampleTypeRegistry {
        &self.types
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Attach a writer to `topic` in `domain`.
    ///
    /// Creates the topic if needed and wires a channel to every reader
    /// already attached.
    ///
    /// # Errors
    ///
    /// `InvalidDomainId`, `InvalidTopicName`, or `TypeConflict` if the topic
    /// exists with a different sample type. Nothing is attached on error.
    pub fn attach_writer(
        self: &Arc<Self>,
        domain: DomainId,
        topic: &str,
        sample_type: &SampleTypeHandle,
    ) -> Result<WriterAttachment> {
        validate_domain(domain)?;
        validate_topic_name(topic)?;

        let mut state = self.write_state();
        let id = self.allocate_id();
        let merger = Arc::new(TopicMerger::new());

        let (topic_name, entry) = Self::topic_entry(&mut state, domain, topic, sample_type)?;
        for reader in &entry.readers {
            log::debug!(
                "[TopicDirectory] Matching new writer {} with reader {} on '{}'",
                id,
                reader.id,
                topic
            );
            merger.add_channel(Arc::new(DeliveryChannel::new(
                id,
                reader.id,
                Arc::clone(&reader.queue),
            )));
        }
        entry.writers.push(WriterEntry {
            id,
            merger: Arc::clone(&merger),
        });
        state.endpoints.insert(
            id,
            EndpointLocation {
                domain,
                topic: topic_name,
                kind: EndpointKind::Writer,
            },
        );
        drop(state);

        log::debug!(
            "[TopicDirectory] Attached writer {} to '{}' (domain {})",
            id,
            topic,
            domain
        );
        Ok(WriterAttachment {
            token: AttachToken::new(self, id),
            merger,
        })
    }

    /// Attach a reader whose history is `queue` to `topic` in `domain`.
    ///
    /// Creates the topic if needed and wires a channel from every writer
    /// already attached.
    ///
    /// # Errors
    ///
    /// Same as [`attach_writer`](Self::attach_writer).
    pub fn attach_reader(
        self: &Arc<Self>,
        domain: DomainId,
        topic: &str,
        sample_type: &SampleTypeHandle,
        queue: Arc<HistoryQueue>,
    ) -> Result<ReaderAttachment> {
        validate_domain(domain)?;
        validate_topic_name(topic)?;

        let mut state = self.write_state();
        let id = self.allocate_id();

        let (topic_name, entry) = Self::topic_entry(&mut state, domain, topic, sample_type)?;
        for writer in &entry.writers {
            log::debug!(
                "[TopicDirectory] Matching new reader {} with writer {} on '{}'",
                id,
                writer.id,
                topic
            );
            writer.merger.add_channel(Arc::new(DeliveryChannel::new(
                writer.id,
                id,
                Arc::clone(&queue),
            )));
        }
        entry.readers.push(ReaderEntry { id, queue });
        state.endpoints.insert(
            id,
            EndpointLocation {
                domain,
                topic: topic_name,
                kind: EndpointKind::Reader,
            },
        );
        drop(state);

        log::debug!(
            "[TopicDirectory] Attached reader {} to '{}' (domain {})",
            id,
            topic,
            domain
        );
        Ok(ReaderAttachment {
            token: AttachToken::new(self, id),
        })
    }

    /// Detach an endpoint.
    ///
    /// A publish already in progress completes against the reader set it
    /// started with; once this returns, no further sample reaches a detached
    /// reader, and any `wait_for_sample` blocked on it returns. Removes the
    /// topic when its last endpoint leaves. Idempotent.
    pub fn detach(&self, id: EndpointId) -> bool {
        let mut state = self.write_state();
        let Some(location) = state.endpoints.remove(&id) else {
            return false;
        };

        let Some(topics) = state.domains.get_mut(&location.domain) else {
            return true;
        };
        let Some(entry) = topics.get_mut(&location.topic) else {
            return true;
        };

        match location.kind {
            EndpointKind::Writer => {
                if let Some(pos) = entry.writers.iter().position(|w| w.id == id) {
                    let writer = entry.writers.swap_remove(pos);
                    writer.merger.close();
                }
            }
            EndpointKind::Reader => {
                if let Some(pos) = entry.readers.iter().position(|r| r.id == id) {
                    let reader = entry.readers.swap_remove(pos);
                    for writer in &entry.writers {
                        writer.merger.remove_reader(id);
                    }
                    reader.queue.close();
                }
            }
        }

        log::debug!(
            "[TopicDirectory] Detached {:?} {} from '{}' (domain {})",
            location.kind,
            id,
            location.topic,
            location.domain
        );

        if entry.is_empty() {
            topics.remove(&location.topic);
            log::info!(
                "[TopicDirectory] Removed topic '{}' from domain {}",
                location.topic,
                location.domain
            );
            if topics.is_empty() {
                state.domains.remove(&location.domain);
            }
            drop(state);
            self.types.prune();
        }
        true
    }

    /// Whether `id` is currently attached.
    pub fn is_attached(&self, id: EndpointId) -> bool {
        self.read_state().endpoints.contains_key(&id)
    }

    /// Readers currently matched with writer `id`.
    pub fn matched_readers(&self, id: EndpointId) -> Vec<EndpointId> {
        self.matched(id, EndpointKind::Writer)
    }

    /// Writers currently matched with reader `id`.
    pub fn matched_writers(&self, id: EndpointId) -> Vec<EndpointId> {
        self.matched(id, EndpointKind::Reader)
    }

    fn matched(&self, id: EndpointId, kind: EndpointKind) -> Vec<EndpointId> {
        let state = self.read_state();
        let Some(location) = state.endpoints.get(&id) else {
            return Vec::new();
        };
        if location.kind != kind {
            return Vec::new();
        }
        let Some(entry) = state
            .domains
            .get(&location.domain)
            .and_then(|topics| topics.get(&location.topic))
        else {
            return Vec::new();
        };
        let mut ids: Vec<EndpointId> = match kind {
            EndpointKind::Writer => entry.readers.iter().map(|r| r.id).collect(),
            EndpointKind::Reader => entry.writers.iter().map(|w| w.id).collect(),
        };
        ids.sort_unstable();
        ids
    }

    /// Describe a topic, if it exists.
    pub fn describe(&self, domain: DomainId, topic: &str) -> Option<TopicDescription> {
        let state = self.read_state();
        let entry = state.domains.get(&domain)?.get(topic)?;
        Some(TopicDescription {
            domain_id: domain,
            name: topic.to_string(),
            sample_type: entry.sample_type.clone(),
            writer_count: entry.writers.len(),
            reader_count: entry.readers.len(),
        })
    }

    /// Topics in `domain`, sorted by name.
    pub fn topics(&self, domain: DomainId) -> Vec<String> {
        let state = self.read_state();
        let mut names: Vec<String> = state
            .domains
            .get(&domain)
            .map(|topics| topics.keys().map(|k| k.to_string()).collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Domains with at least one topic, sorted.
    pub fn domains(&self) -> Vec<DomainId> {
        let mut ids: Vec<DomainId> = self.read_state().domains.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Total number of topics across all domains.
    pub fn topic_count(&self) -> usize {
        self.read_state().domains.values().map(|t| t.len()).sum()
    }

    /// Total number of attached endpoints.
    pub fn endpoint_count(&self) -> usize {
        self.read_state().endpoints.len()
    }

    fn allocate_id(&self) -> EndpointId {
        EndpointId::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Find or create the topic entry, checking the sample type.
    fn topic_entry<'s>(
        state: &'s mut DirectoryState,
        domain: DomainId,
        topic: &str,
        sample_type: &SampleTypeHandle,
    ) -> Result<(Arc<str>, &'s mut TopicEntry)> {
        let topics = state.domains.entry(domain).or_default();

        if let Some((name, existing)) = topics.get_key_value(topic) {
            if !existing.sample_type.same_type(sample_type) {
                log::warn!(
                    "[TopicDirectory] Type conflict on '{}' (domain {}): {} vs {}",
                    topic,
                    domain,
                    existing.sample_type.name(),
                    sample_type.name()
                );
                return Err(Error::TypeConflict {
                    name: topic.to_string(),
                    existing: existing.sample_type.descriptor().canonical(),
                    requested: sample_type.descriptor().canonical(),
                });
            }
            let name = Arc::clone(name);
            let entry = topics
                .get_mut(topic)
                .ok_or_else(|| Error::InvalidTopicName(topic.to_string()))?;
            return Ok((name, entry));
        }

        let name: Arc<str> = Arc::from(topic);
        log::info!(
            "[TopicDirectory] Created topic '{}' ({}) in domain {}",
            topic,
            sample_type.name(),
            domain
        );
        let entry = topics.entry(Arc::clone(&name)).or_insert(TopicEntry {
            sample_type: sample_type.clone(),
            writers: Vec::new(),
            readers: Vec::new(),
        });
        Ok((name, entry))
    }

    fn read_state(&self) -> RwLockReadGuard<'_, DirectoryState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, DirectoryState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for TopicDirectory {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(|e| e.into_inner());
        for topics in state.domains.values() {
            for entry in topics.values() {
                for writer in &entry.writers {
                    writer.merger.close();
                }
                for reader in &entry.readers {
                    reader.queue.close();
                }
            }
        }
        state.domains.clear();
        state.endpoints.clear();
    }
}

impl std::fmt::Debug for TopicDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicDirectory")
            .field("topics", &self.topic_count())
            .field("endpoints", &self.endpoint_count())
            .finish()
    }
}

fn validate_domain(domain: DomainId) -> Result<()> {
    if domain > MAX_DOMAIN_ID {
        return Err(Error::InvalidDomainId(domain));
    }
    Ok(())
}

fn validate_topic_name(topic: &str) -> Result<()> {
    if topic.is_empty() {
        return Err(Error::InvalidTopicName("topic name is empty".into()));
    }
    if topic.len() > MAX_TOPIC_NAME_LEN {
        return Err(Error::InvalidTopicName(format!(
            "topic name is {} bytes (max {})",
            topic.len(),
            MAX_TOPIC_NAME_LEN
        )));
    }
    if topic.chars().any(char::is_control) {
        return Err(Error::InvalidTopicName(format!(
            "'{}' contains control characters",
            topic.escape_debug()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "domain_registry_tests.rs"]
mod tests;
