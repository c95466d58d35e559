//! Criterion micro-benchmarks for raw region operations: carve
//! throughput and bulk-release cost by chunk count.

use std::alloc::Layout;

use billhook::Region;
use billhook_bench::small_region;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Carve 64-byte slots until a 1 MiB region is full, then bulk-release.
fn bench_carve_throughput(c: &mut Criterion) {
    let slot = Layout::from_size_align(64, 8).expect("valid layout");
    c.bench_function("region/carve_64b_to_capacity", |b| {
        b.iter(|| {
            let mut region = Region::new(small_region());
            while region.allocate(black_box(slot)).is_ok() {}
            region.close();
        })
    });
}

/// Bulk release alone, with the region pre-filled outside the timing
/// loop.
fn bench_bulk_release(c: &mut Criterion) {
    let slot = Layout::from_size_align(64, 8).expect("valid layout");
    c.bench_function("region/bulk_release_16_chunks", |b| {
        b.iter_batched(
            || {
                let mut region = Region::new(small_region());
                while region.allocate(slot).is_ok() {}
                region
            },
            |mut region| region.close(),
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_carve_throughput, bench_bulk_release);
criterion_main!(benches);
