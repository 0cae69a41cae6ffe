// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Participant: factory for endpoints bound to one directory and domain.

use std::sync::Arc;

use crate::config::DEFAULT_DOMAIN_ID;
use crate::core::rt::HistoryQueue;
use crate::dds::{DataReader, DataWriter, DomainId, Error, QoS, Result, TopicDirectory, DDS};
use crate::dynamic::SampleTypeHandle;

/// Builder for [`Participant`].
pub struct ParticipantBuilder {
    name: String,
    domain_id: DomainId,
    directory: Option<Arc<TopicDirectory>>,
}

/// Entry point for creating writers and readers.
///
/// A participant binds a name, a domain id and a [`TopicDirectory`]. Two
/// participants only see each other's endpoints when they share the same
/// directory and domain.
///
/// Every writer and reader holds its participant, so a private directory
/// lives as long as any endpoint created on it.
pub struct Participant {
    name: String,
    domain_id: DomainId,
    directory: Arc<TopicDirectory>,
}

impl Participant {
    /// Create a participant on domain 0 with a private directory.
    ///
    /// # Example
    /// ```
    /// use minidds::Participant;
    /// let participant = Participant::new("my_app")?;
    /// assert_eq!(participant.domain_id(), 0);
    /// # Ok::<(), minidds::Error>(())
    /// ```
    pub fn new(name: &str) -> Result<Arc<Self>> {
        Self::builder(name).build()
    }

    /// Create a new participant builder.
    pub fn builder(name: &str) -> ParticipantBuilder {
        ParticipantBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain_id(&self) -> DomainId {
        self.domain_id
    }

    pub fn directory(&self) -> &Arc<TopicDirectory> {
        &self.directory
    }

    /// QoS with the directory's configured default history depth.
    pub fn default_qos(&self) -> QoS {
        let depth = self.directory.config().default_history_depth();
        QoS::keep_last(u32::try_from(depth).unwrap_or(u32::MAX))
    }

    /// Create a writer for `T` on `topic`.
    ///
    /// # Errors
    ///
    /// `InvalidQos`, `InvalidTopicName`, `InvalidType`, or `TypeConflict`
    /// when `T` differs from the type the topic (or the type name) is
    /// already bound to.
    pub fn create_writer<T: DDS>(
        self: &Arc<Self>,
        topic: &str,
        qos: QoS,
    ) -> Result<DataWriter<T>> {
        qos.validate()?;
        let sample_type = self.register_type::<T>()?;
        let attachment = self
            .directory
            .attach_writer(self.domain_id, topic, &sample_type)?;

        log::debug!(
            "[participant] '{}' created writer {} on '{}' ({})",
            self.name,
            attachment.token.id(),
            topic,
            sample_type.name()
        );
        Ok(DataWriter::new(
            topic.to_string(),
            self.domain_id,
            qos,
            sample_type,
            attachment,
            self.directory.config().clone(),
            Arc::clone(self),
        ))
    }

    /// Create a reader for `T` on `topic` with a history of `qos.depth()`.
    ///
    /// # Errors
    ///
    /// Same as [`create_writer`](Self::create_writer).
    pub fn create_reader<T: DDS>(
        self: &Arc<Self>,
        topic: &str,
        qos: QoS,
    ) -> Result<DataReader<T>> {
        qos.validate()?;
        let sample_type = self.register_type::<T>()?;
        let queue = Arc::new(HistoryQueue::new(qos.depth()));
        let attachment = self.directory.attach_reader(
            self.domain_id,
            topic,
            &sample_type,
            Arc::clone(&queue),
        )?;

        log::debug!(
            "[participant] '{}' created reader {} on '{}' ({}, depth {})",
            self.name,
            attachment.token.id(),
            topic,
            sample_type.name(),
            qos.depth()
        );
        Ok(DataReader::new(
            topic.to_string(),
            self.domain_id,
            qos,
            sample_type,
            queue,
            attachment,
            Arc::clone(self),
        ))
    }

    fn register_type<T: DDS>(&self) -> Result<SampleTypeHandle> {
        self.directory.types().register(T::type_descriptor())
    }
}

impl std::fmt::Debug for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Participant")
            .field("name", &self.name)
            .field("domain_id", &self.domain_id)
            .finish()
    }
}

impl ParticipantBuilder {
    pub(super) fn new(name: &str) -> Self {
        ParticipantBuilder {
            name: name.to_string(),
            domain_id: DEFAULT_DOMAIN_ID,
            directory: None,
        }
    }

    /// Set the DDS domain ID (default: 0).
    pub fn domain_id(mut self, domain_id: u32) -> Self {
        self.domain_id = domain_id;
        self
    }

    /// Share an existing directory (default: a fresh one).
    pub fn directory(mut self, directory: Arc<TopicDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Build the participant.
    ///
    /// # Errors
    ///
    /// `InvalidDomainId` if the domain id is above 232.
    pub fn build(self) -> Result<Arc<Participant>> {
        if self.domain_id > crate::config::MAX_DOMAIN_ID {
            return Err(Error::InvalidDomainId(self.domain_id));
        }
        let directory = self.directory.unwrap_or_else(TopicDirectory::new);

        log::debug!(
            "[participant] '{}' ready on domain {}",
            self.name,
            self.domain_id
        );
        Ok(Arc::new(Participant {
            name: self.name,
            domain_id: self.domain_id,
            directory,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::generated::HelloWorld;

    fn participant(domain: u32, directory: &Arc<TopicDirectory>) -> Arc<Participant> {
        Participant::builder("test")
            .directory(Arc::clone(directory))
            .domain_id(domain)
            .build()
            .expect("participant")
    }

    #[test]
    fn test_builder_rejects_bad_domain() {
        assert!(matches!(
            Participant::builder("bad").domain_id(233).build(),
            Err(Error::InvalidDomainId(233))
        ));
        assert!(Participant::builder("ok").domain_id(232).build().is_ok());
    }

    #[test]
    fn test_create_rejects_invalid_qos() {
        let participant = Participant::new("qos").expect("participant");
        assert!(matches!(
            participant.create_reader::<HelloWorld>("t", QoS::keep_last(0)),
            Err(Error::InvalidQos(_))
        ));
        assert_eq!(participant.directory().endpoint_count(), 0);
    }

    #[test]
    fn test_default_qos_follows_config() {
        let config = RuntimeConfig::new();
        config.set_default_history_depth(3);
        let directory = TopicDirectory::with_config(config);
        let participant = participant(0, &directory);

        assert_eq!(participant.default_qos(), QoS::keep_last(3));
    }

    #[test]
    fn test_participants_share_directory() {
        let directory = TopicDirectory::with_config(RuntimeConfig::new());
        let a = participant(7, &directory);
        let b = participant(7, &directory);

        let writer = a
            .create_writer::<HelloWorld>("HelloWorld", QoS::default())
            .expect("writer");
        let reader = b
            .create_reader::<HelloWorld>("HelloWorld", QoS::default())
            .expect("reader");

        assert_eq!(writer.matched_readers(), vec![reader.id()]);
        assert_eq!(directory.topics(7), vec!["HelloWorld".to_string()]);
    }
}
