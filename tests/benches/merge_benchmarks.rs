//! # Live List Merge Benchmarks
//!
//! | Case | Shape |
//! |------|-------|
//! | live_head | new records arriving above everything listed |
//! | page_tail | a page of older records appended below |
//! | duplicates | a page that overlaps the list completely |
//! | full_discard | older records offered to a full list |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ex_02_live_list::ItemList;
use shared_types::entities::{BlockNumber, Extrinsic};
use shared_types::ordering::NewestFirst;
use std::time::Duration;

fn ext(block_number: BlockNumber, extrinsic_idx: u32) -> Extrinsic {
    Extrinsic {
        block_number,
        extrinsic_idx,
        ..Default::default()
    }
}

/// A list holding blocks `first..first + len`, one record per block.
fn filled(capacity: usize, first: BlockNumber, len: usize) -> ItemList<Extrinsic, NewestFirst> {
    let mut list = ItemList::new(capacity, NewestFirst);
    for offset in 0..len as BlockNumber {
        list.merge(ext(first + offset, 0));
    }
    list
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("live-list-merge");
    group.measurement_time(Duration::from_secs(5));

    for capacity in [100usize, 1_000] {
        group.throughput(Throughput::Elements(capacity as u64));

        group.bench_with_input(BenchmarkId::new("live_head", capacity), &capacity, |b, &capacity| {
            b.iter_batched(
                || filled(capacity, 1, capacity),
                |mut list| {
                    for offset in 0..capacity as BlockNumber {
                        black_box(list.merge(ext(10_000 + offset, 0)));
                    }
                    list
                },
                criterion::BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("page_tail", capacity), &capacity, |b, &capacity| {
            let page: Vec<Extrinsic> = (0..capacity as BlockNumber / 2)
                .rev()
                .map(|number| ext(number + 1, 0))
                .collect();
            b.iter_batched(
                || filled(capacity, 100_000, capacity / 2),
                |mut list| black_box(list.merge_all(page.clone())),
                criterion::BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("duplicates", capacity), &capacity, |b, &capacity| {
            let page: Vec<Extrinsic> = (0..capacity as BlockNumber).map(|n| ext(n + 1, 0)).collect();
            b.iter_batched(
                || filled(capacity, 1, capacity),
                |mut list| black_box(list.merge_all(page.clone())),
                criterion::BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("full_discard", capacity), &capacity, |b, &capacity| {
            let older: Vec<Extrinsic> = (0..capacity as u32).map(|idx| ext(1, idx)).collect();
            b.iter_batched(
                || filled(capacity, 10, capacity),
                |mut list| black_box(list.merge_all(older.clone())),
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_merge);
criterion_main!(benches);
