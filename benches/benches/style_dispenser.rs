// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{
    BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main,
};
use understory_style_dispenser::{StyleDispenser, StyleEnumerator};

fn palette(len: u32) -> StyleDispenser<u32> {
    let dispenser = StyleDispenser::new();
    dispenser.set_styles(Some((0..len).collect()));
    dispenser
}

fn bench_broadcast(c: &mut Criterion) {
    let mut group = c.benchmark_group("style_dispenser/broadcast");

    // Every claim is observed by every live enumerator, so cost should grow
    // linearly with the number of live consumers.
    for live in [1usize, 16, 128, 1_024] {
        group.throughput(Throughput::Elements(live as u64));
        group.bench_with_input(BenchmarkId::new("round_robin", live), &live, |b, &live| {
            b.iter_batched(
                || {
                    let dispenser = palette(12);
                    let consumers: Vec<StyleEnumerator<u32>> =
                        (0..live).map(|_| dispenser.styles_where(|_| true)).collect();
                    (dispenser, consumers)
                },
                |(dispenser, mut consumers)| {
                    for consumer in &mut consumers {
                        black_box(consumer.next());
                    }
                    black_box(dispenser);
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_filtered_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("style_dispenser/filtered_scan");

    // Sparse predicates scan most of the palette on every claim.
    for len in [16u32, 256, 4_096] {
        group.throughput(Throughput::Elements(u64::from(len)));
        group.bench_with_input(BenchmarkId::new("one_in_eight", len), &len, |b, &len| {
            let dispenser = palette(len);
            let mut enumerator = dispenser.styles_where(|s| s % 8 == 7);
            b.iter(|| black_box(enumerator.next()));
        });
    }

    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("style_dispenser/replay");

    // A new enumerator replays the whole history, which holds at most one
    // entry per style.
    for len in [16u32, 256, 4_096] {
        let dispenser = palette(len);
        let mut warm = dispenser.styles_where(|_| true);
        for _ in 0..len {
            warm.move_next();
        }
        group.throughput(Throughput::Elements(u64::from(len)));
        group.bench_with_input(BenchmarkId::new("styles_where", len), &dispenser, |b, d| {
            b.iter(|| black_box(d.styles_where(|_| true)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_broadcast, bench_filtered_scan, bench_replay);
criterion_main!(benches);
