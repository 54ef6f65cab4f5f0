//! Performance benchmarks for the probe hot paths
//!
//! Encoding, decoding and tracker lookups run once per probe; the
//! statistics reduction runs once per run but over every observation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ping_probe::{
    executor::RequestTracker,
    models::{Observation, Probe, RunReport},
    stats::RunStatistics,
    transport::IcmpMessage,
    types::{IpVersion, ShutdownReason},
};
use std::net::IpAddr;
use std::time::Duration;
use tokio::time::Instant;

fn create_report(observations: usize) -> RunReport {
    let source: IpAddr = "192.0.2.1".parse().unwrap();
    RunReport {
        sent: observations as u64,
        received: observations as u64,
        started_at: Instant::now(),
        observations: (0..observations)
            .map(|i| Observation {
                sequence: i as u64,
                round_trip: Duration::from_micros(5_000 + (i as u64 * 37) % 20_000),
                ttl: Some(57),
                bytes: 64,
                source,
            })
            .collect(),
        reason: ShutdownReason::CountReached,
        receive_error: None,
    }
}

fn benchmark_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("icmp_codec");

    for payload_size in [0usize, 56, 1400] {
        let request = IcmpMessage::echo_request(0x4242, 7, payload_size);
        let encoded = request.encode(IpVersion::V4);

        group.bench_with_input(BenchmarkId::new("encode_v4", payload_size), &request, |b, request| {
            b.iter(|| black_box(request.encode(IpVersion::V4)))
        });

        group.bench_with_input(BenchmarkId::new("decode_v4", payload_size), &encoded, |b, bytes| {
            b.iter(|| black_box(IcmpMessage::decode(IpVersion::V4, bytes)))
        });
    }

    group.finish();
}

fn benchmark_tracker(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_tracker");

    group.bench_function("record_then_take", |b| {
        let tracker = RequestTracker::new();
        let now = Instant::now();
        let mut sequence = 0u64;
        b.iter(|| {
            let probe = Probe {
                sequence,
                sent_at: now,
                payload_size: 56,
            };
            let wire = probe.wire_sequence();
            tracker.record(probe);
            black_box(tracker.take_elapsed(wire, now));
            sequence += 1;
        })
    });

    group.bench_function("evict_full_window", |b| {
        let now = Instant::now();
        b.iter(|| {
            let tracker = RequestTracker::new();
            for sequence in 0..1024u64 {
                tracker.record(Probe {
                    sequence,
                    sent_at: now,
                    payload_size: 56,
                });
            }
            black_box(tracker.evict_older_than(now + Duration::from_secs(1)))
        })
    });

    group.finish();
}

fn benchmark_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistics");

    for size in [10usize, 1_000, 100_000] {
        let report = create_report(size);
        group.bench_with_input(BenchmarkId::new("reduce", size), &report, |b, report| {
            b.iter(|| black_box(RunStatistics::reduce(report, Instant::now())))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_codec, benchmark_tracker, benchmark_statistics);
criterion_main!(benches);
