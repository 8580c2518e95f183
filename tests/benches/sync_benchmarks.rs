//! # Hash-Trend Sync Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | Store | merge into a full store at capacity 2000 |
//! | Sampling | alignment filter over a full snapshot |
//! | Bead plate | grid build for a sampled view |
//!
//! ```bash
//! cargo bench --package ht-tests --bench sync_benchmarks
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use ht_block_sync::{
    build_bead_grid, sample_view, BlockRecord, BlockStore, ClassificationAxis, MockChainSource,
    SamplingRule, DEFAULT_STORE_CAPACITY,
};

fn blocks(range: std::ops::RangeInclusive<u64>) -> Vec<BlockRecord> {
    range.map(MockChainSource::block_at).collect()
}

fn full_store() -> BlockStore {
    let store = BlockStore::new(DEFAULT_STORE_CAPACITY);
    store.merge(blocks(1..=DEFAULT_STORE_CAPACITY as u64));
    store
}

fn bench_store_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("store-merge");
    let top = DEFAULT_STORE_CAPACITY as u64;

    for batch in [1u64, 30, 500] {
        let incoming = blocks(top + 1..=top + batch);
        group.throughput(Throughput::Elements(batch));
        group.bench_with_input(BenchmarkId::new("new_heights", batch), &incoming, |b, incoming| {
            b.iter_batched(
                full_store,
                |store| black_box(store.merge(incoming.iter().cloned())),
                criterion::BatchSize::LargeInput,
            )
        });
    }

    let duplicates = blocks(1..=30);
    group.bench_function("duplicates", |b| {
        let store = full_store();
        b.iter(|| black_box(store.merge(duplicates.iter().cloned())))
    });

    group.finish();
}

fn bench_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampling");
    let snapshot = full_store().snapshot();

    for (stride, anchor) in [(1u64, 0u64), (20, 0), (20, 105), (100, 0)] {
        let Ok(rule) = SamplingRule::new("bench", "bench", stride, anchor) else {
            continue;
        };
        group.bench_function(format!("view/{}@{}", stride, anchor), |b| {
            b.iter(|| black_box(sample_view(&snapshot, &rule)))
        });
    }

    group.finish();
}

fn bench_bead_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("bead-grid");
    let mut view = full_store().snapshot();
    view.reverse();

    for axis in [ClassificationAxis::Parity, ClassificationAxis::Size] {
        group.bench_function(format!("{:?}", axis).to_lowercase(), |b| {
            b.iter(|| black_box(build_bead_grid(&view, axis, 6)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_store_merge, bench_sampling, bench_bead_grid);
criterion_main!(benches);
