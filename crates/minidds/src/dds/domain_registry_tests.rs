// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::config::RuntimeConfig;
use crate::core::rt::{EncodedSample, WaitOutcome};
use crate::dynamic::{PrimitiveKind, TypeDescriptorBuilder};
use std::time::Duration;

fn directory() -> Arc<TopicDirectory> {
    TopicDirectory::with_config(RuntimeConfig::new())
}

fn temperature(dir: &TopicDirectory) -> SampleTypeHandle {
    dir.types()
        .register(Arc::new(
            TypeDescriptorBuilder::new("Temperature")
                .field("celsius", PrimitiveKind::F32)
                .build(),
        ))
        .expect("register Temperature")
}

fn humidity(dir: &TopicDirectory) -> SampleTypeHandle {
    dir.types()
        .register(Arc::new(
            TypeDescriptorBuilder::new("Humidity")
                .field("percent", PrimitiveKind::F32)
                .build(),
        ))
        .expect("register Humidity")
}

fn sample(writer: EndpointId, seq: u64) -> EncodedSample {
    EncodedSample {
        writer,
        sequence: seq,
        source_timestamp_ns: 0,
        payload: Arc::from(vec![0u8; 4]),
    }
}

#[test]
fn test_attach_writer_creates_topic() {
    let dir = directory();
    let ty = temperature(&dir);

    let writer = dir.attach_writer(0, "sensor/temp", &ty).expect("attach");

    assert_eq!(dir.endpoint_count(), 1);
    assert_eq!(dir.topic_count(), 1);
    let desc = dir.describe(0, "sensor/temp").expect("topic exists");
    assert_eq!(desc.writer_count, 1);
    assert_eq!(desc.reader_count, 0);
    assert_eq!(desc.sample_type.name(), "Temperature");

    drop(writer);

    assert_eq!(dir.endpoint_count(), 0);
    assert!(dir.describe(0, "sensor/temp").is_none());
    assert!(dir.domains().is_empty());
}

#[test]
fn test_auto_match_writer_first() {
    let dir = directory();
    let ty = temperature(&dir);

    let writer = dir.attach_writer(0, "t", &ty).expect("writer");
    let queue = Arc::new(HistoryQueue::new(4));
    let reader = dir
        .attach_reader(0, "t", &ty, Arc::clone(&queue))
        .expect("reader");

    assert_eq!(writer.merger.reader_count(), 1);
    assert_eq!(
        dir.matched_readers(writer.token.id()),
        vec![reader.token.id()]
    );
    assert_eq!(
        dir.matched_writers(reader.token.id()),
        vec![writer.token.id()]
    );

    writer.merger.push(&sample(writer.token.id(), 1));
    assert_eq!(queue.len(), 1);
}

#[test]
fn test_auto_match_reader_first() {
    let dir = directory();
    let ty = temperature(&dir);

    let queue = Arc::new(HistoryQueue::new(4));
    let _reader = dir
        .attach_reader(0, "t", &ty, Arc::clone(&queue))
        .expect("reader");
    let writer = dir.attach_writer(0, "t", &ty).expect("writer");

    assert_eq!(writer.merger.reader_count(), 1);
    writer.merger.push(&sample(writer.token.id(), 1));
    assert_eq!(queue.pop().map(|q| q.sample.sequence), Some(1));
}

#[test]
fn test_type_conflict_rejected() {
    let dir = directory();
    let temp = temperature(&dir);
    let hum = humidity(&dir);

    let _writer = dir.attach_writer(0, "shared", &temp).expect("writer");
    let queue = Arc::new(HistoryQueue::new(4));

    match dir.attach_reader(0, "shared", &hum, queue) {
        Err(Error::TypeConflict { name, .. }) => assert_eq!(name, "shared"),
        other => panic!("expected TypeConflict, got {:?}", other.map(|_| ())),
    }
    assert!(matches!(
        dir.attach_writer(0, "shared", &hum),
        Err(Error::TypeConflict { .. })
    ));
    // Nothing was admitted.
    assert_eq!(dir.endpoint_count(), 1);
    assert_eq!(dir.describe(0, "shared").map(|d| d.reader_count), Some(0));
}

#[test]
fn test_same_topic_different_type_in_other_domain() {
    let dir = directory();
    let temp = temperature(&dir);
    let hum = humidity(&dir);

    let _a = dir.attach_writer(0, "shared", &temp).expect("domain 0");
    let _b = dir.attach_writer(1, "shared", &hum).expect("domain 1");
    assert_eq!(dir.domains(), vec![0, 1]);
}

#[test]
fn test_domains_do_not_match() {
    let dir = directory();
    let ty = temperature(&dir);

    let writer = dir.attach_writer(0, "t", &ty).expect("writer");
    let queue = Arc::new(HistoryQueue::new(4));
    let _reader = dir
        .attach_reader(1, "t", &ty, Arc::clone(&queue))
        .expect("reader");

    assert_eq!(writer.merger.reader_count(), 0);
    writer.merger.push(&sample(writer.token.id(), 1));
    assert!(queue.is_empty());
}

#[test]
fn test_detach_reader_closes_queue_and_unmatches() {
    let dir = directory();
    let ty = temperature(&dir);

    let writer = dir.attach_writer(0, "t", &ty).expect("writer");
    let queue = Arc::new(HistoryQueue::new(4));
    let reader = dir
        .attach_reader(0, "t", &ty, Arc::clone(&queue))
        .expect("reader");

    assert!(reader.token.detach());
    assert!(!reader.token.detach(), "second detach is a no-op");
    assert!(!reader.token.is_attached());

    assert_eq!(writer.merger.reader_count(), 0);
    assert!(queue.is_closed());
    assert_eq!(queue.wait_nonempty(Duration::from_secs(1)), WaitOutcome::Closed);
    assert_eq!(dir.describe(0, "t").map(|d| d.reader_count), Some(0));
}

#[test]
fn test_detach_writer_closes_merger() {
    let dir = directory();
    let ty = temperature(&dir);

    let writer = dir.attach_writer(0, "t", &ty).expect("writer");
    let id = writer.token.id();
    assert!(dir.detach(id));
    assert!(!dir.detach(id));
    assert!(writer.merger.is_closed());
    assert!(!dir.is_attached(id));
}

#[test]
fn test_topic_type_released_with_topic() {
    let dir = directory();
    let ty = temperature(&dir);
    let writer = dir.attach_writer(0, "t", &ty).expect("writer");
    drop(ty);

    assert!(dir.types().get("Temperature").is_some(), "topic pins its type");
    assert_eq!(dir.types().slot_count(), 1);
    drop(writer);
    assert!(dir.types().get("Temperature").is_none());
    assert_eq!(dir.types().slot_count(), 0, "removing the topic prunes its type");
}

#[test]
fn test_invalid_domain_and_topic() {
    let dir = directory();
    let ty = temperature(&dir);

    assert!(matches!(
        dir.attach_writer(233, "t", &ty),
        Err(Error::InvalidDomainId(233))
    ));
    assert!(matches!(
        dir.attach_writer(0, "", &ty),
        Err(Error::InvalidTopicName(_))
    ));
    let long = "x".repeat(MAX_TOPIC_NAME_LEN + 1);
    assert!(matches!(
        dir.attach_writer(0, &long, &ty),
        Err(Error::InvalidTopicName(_))
    ));
    assert!(dir.attach_writer(0, "bad\nname", &ty).is_err());
    assert_eq!(dir.endpoint_count(), 0);
}

#[test]
fn test_dropping_directory_closes_endpoints() {
    let dir = directory();
    let ty = temperature(&dir);

    let writer = dir.attach_writer(0, "t", &ty).expect("writer");
    let queue = Arc::new(HistoryQueue::new(4));
    let reader = dir
        .attach_reader(0, "t", &ty, Arc::clone(&queue))
        .expect("reader");

    drop(dir);

    assert!(writer.merger.is_closed());
    assert!(queue.is_closed());
    assert!(!reader.token.is_attached());
    assert!(reader.token.directory().is_none());
}

#[test]
fn test_topics_listing() {
    let dir = directory();
    let ty = temperature(&dir);

    let _b = dir.attach_writer(3, "b", &ty).expect("b");
    let _a = dir.attach_writer(3, "a", &ty).expect("a");

    assert_eq!(dir.topics(3), vec!["a".to_string(), "b".to_string()]);
    assert!(dir.topics(4).is_empty());
    assert_eq!(dir.topic_count(), 2);
}
