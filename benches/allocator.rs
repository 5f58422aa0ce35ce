//! Temporary block allocator benchmarks.
//!
//! Measures allocate/free cycles over the free-range list at several live
//! working-set sizes; the list is a plain sorted vector, so these track the
//! cost of first-fit scans and coalescing as fragmentation grows.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nvmefs::TemporaryBlockManager;

fn bench_allocate_free_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate_free_cycle");

    for live_files in [4u64, 16, 64] {
        group.bench_with_input(
            BenchmarkId::new("live_files", live_files),
            &live_files,
            |b, &live_files| {
                b.iter(|| {
                    let mut mgr = TemporaryBlockManager::new(0, 1 << 20);
                    let mut ranges = Vec::with_capacity(live_files as usize);

                    for _ in 0..live_files {
                        ranges.push(mgr.allocate(black_box(64)).unwrap());
                    }
                    // Free every other range to fragment the list, then churn.
                    for range in ranges.iter().step_by(2) {
                        mgr.free(*range);
                    }
                    for _ in 0..live_files / 2 {
                        let churn = mgr.allocate(black_box(64)).unwrap();
                        mgr.free(churn);
                    }

                    black_box(mgr.available())
                });
            },
        );
    }

    group.finish();
}

fn bench_grow_pattern(c: &mut Criterion) {
    c.bench_function("doubling_grow_pattern", |b| {
        b.iter(|| {
            let mut mgr = TemporaryBlockManager::new(0, 1 << 20);
            let mut range = mgr.allocate(8).unwrap();

            // Emulates a spill file doubling from 8 blocks to 8192.
            let mut blocks = 8u64;
            while blocks < 8192 {
                blocks *= 2;
                let next = mgr.allocate(blocks).unwrap();
                mgr.free(range);
                range = next;
            }

            black_box(range.nr_blocks())
        });
    });
}

criterion_group!(benches, bench_allocate_free_cycle, bench_grow_pattern);
criterion_main!(benches);
