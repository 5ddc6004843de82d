// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use scrapbook_index::{Aabb2D, Indexed, SpatialIndex};

#[derive(Clone, Debug)]
struct Ink {
    id: u32,
    aabb: Aabb2D<f64>,
}

impl Indexed<f64> for Ink {
    type Id = u32;

    fn id(&self) -> u32 {
        self.id
    }

    fn aabb(&self) -> Aabb2D<f64> {
        self.aabb
    }
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1_u64 << 53) as f64)
    }
}

/// Short strokes scattered over a page, roughly what a busy sketch holds.
fn scatter(count: u32, extent: f64, seed: u64) -> Vec<Ink> {
    let mut rng = Rng(seed);
    (0..count)
        .map(|id| {
            let x = rng.next_f64() * extent;
            let y = rng.next_f64() * extent;
            let w = 4.0 + rng.next_f64() * 60.0;
            let h = 4.0 + rng.next_f64() * 60.0;
            Ink {
                id,
                aabb: Aabb2D::from_xywh(x, y, w, h),
            }
        })
        .collect()
}

fn filled(items: &[Ink]) -> SpatialIndex<f64, Ink> {
    let mut idx = SpatialIndex::new();
    idx.add_all(items.iter().cloned());
    let _ = idx.take_damage();
    idx
}

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep_index_add");
    for &n in &[1_000_u32, 10_000] {
        let items = scatter(n, 4_000.0, 0x5eed);
        group.throughput(Throughput::Elements(n.into()));
        group.bench_function(format!("add_all/{n}"), |b| {
            b.iter_batched(
                || items.clone(),
                |items| {
                    let mut idx = SpatialIndex::new();
                    idx.add_all(items);
                    black_box(idx.len())
                },
                BatchSize::SmallInput,
            );
        });
        group.bench_function(format!("add_one_by_one/{n}"), |b| {
            b.iter_batched(
                || items.clone(),
                |items| {
                    let mut idx = SpatialIndex::new();
                    for item in items {
                        idx.add(item);
                    }
                    black_box(idx.len())
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep_index_query");
    for &n in &[1_000_u32, 10_000] {
        let idx = filled(&scatter(n, 4_000.0, 0xfeed));
        let lasso = Aabb2D::from_xywh(1_500.0, 1_500.0, 400.0, 400.0);
        group.bench_function(format!("intersection_candidates/{n}"), |b| {
            b.iter(|| black_box(idx.intersection_candidates(black_box(lasso), None).len()));
        });
        group.bench_function(format!("container_candidates/{n}"), |b| {
            b.iter(|| black_box(idx.container_candidates(black_box(2_000.0), 2_000.0).len()));
        });
    }
    group.finish();
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep_index_update");
    let items = scatter(10_000, 4_000.0, 0xbeef);
    let ids: Vec<u32> = (0..10_000).step_by(97).collect();
    group.bench_function("translate_subset", |b| {
        b.iter_batched(
            || filled(&items),
            |mut idx| {
                for &id in &ids {
                    idx.modify(id, |ink| {
                        ink.aabb = Aabb2D::from_xywh(
                            ink.aabb.min_x + 25.0,
                            ink.aabb.min_y - 10.0,
                            ink.aabb.width(),
                            ink.aabb.height(),
                        );
                    });
                }
                black_box(idx.take_damage())
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_add, bench_query, bench_update);
criterion_main!(benches);
