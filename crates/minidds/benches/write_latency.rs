// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Write Latency Benchmark
//!
//! Measures the latency of DataWriter::write() with different:
//! - Message sizes (HelloWorld message length)
//! - Numbers of matched readers (fan-out cost)
//!
//! Readers are never drained, so every write past the history depth also
//! pays for one eviction per reader.

#![allow(clippy::uninlined_format_args)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use minidds::config::RuntimeConfig;
use minidds::{HelloWorld, Participant, QoS, TopicDirectory};
use std::hint::black_box as bb;
use std::sync::Arc;

fn participant(name: &str) -> Arc<Participant> {
    Participant::builder(name)
        .directory(TopicDirectory::with_config(RuntimeConfig::new()))
        .build()
        .expect("participant creation")
}

/// Benchmark write latency with different message sizes (no readers)
fn bench_write_message_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_latency_by_size");

    let participant = participant("bench_write");
    let writer = participant
        .create_writer::<HelloWorld>("bench/latency", QoS::default())
        .expect("writer creation");

    for size in [16, 256, 4096, 32768] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let msg = HelloWorld::new("x".repeat(size), 42);
            b.iter(|| {
                writer.write(bb(&msg)).expect("write should succeed");
            });
        });
    }

    group.finish();
}

/// Benchmark write latency with 0..16 matched readers
fn bench_write_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_latency_by_readers");

    for readers in [0usize, 1, 4, 16] {
        let participant = participant("bench_fan_out");
        let writer = participant
            .create_writer::<HelloWorld>("bench/fan_out", QoS::default())
            .expect("writer creation");
        let _readers: Vec<_> = (0..readers)
            .map(|_| {
                participant
                    .create_reader::<HelloWorld>("bench/fan_out", QoS::keep_last(1))
                    .expect("reader creation")
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(readers), &readers, |b, _| {
            let msg = HelloWorld::new("Hello world", 1);
            b.iter(|| {
                writer.write(bb(&msg)).expect("write should succeed");
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_write_message_sizes, bench_write_fan_out);
criterion_main!(benches);
