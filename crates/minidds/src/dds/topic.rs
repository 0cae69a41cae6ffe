// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topic introspection.

use crate::dds::DomainId;
use crate::dynamic::SampleTypeHandle;

/// Snapshot of a topic as seen by the directory.
///
/// A topic exists while at least one endpoint is attached to it; its sample
/// type is fixed by the first attach.
#[derive(Debug, Clone)]
pub struct TopicDescription {
    pub domain_id: DomainId,
    pub name: String,
    pub sample_type: SampleTypeHandle,
    pub writer_count: usize,
    pub reader_count: usize,
}

impl TopicDescription {
    /// Type name carried by the topic.
    pub fn type_name(&self) -> &str {
        self.sample_type.name()
    }

    /// Whether at least one writer and one reader are attached.
    pub fn is_matched(&self) -> bool {
        self.writer_count > 0 && self.reader_count > 0
    }
}
