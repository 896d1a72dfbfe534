//! # Evaluator Benchmark
//!
//! Per-tick cost of deciding visibility for a large object set.
//!
//! Run with: `cargo bench --package sightline_core`

#![allow(missing_docs)]

use std::sync::atomic::AtomicBool;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sightline_core::{
    decide, BatchEvaluator, CullingConfig, CullingParams, CullingTask, FrameSnapshot, Frustum,
    ObjectId, SpatialCache, Vec3,
};

/// Objects per tick.
const OBJECT_COUNT: usize = 10_000;

/// Half-width of the cube objects are scattered in.
const WORLD_HALF_SIZE: f32 = 1500.0;

fn scattered_tasks(count: usize) -> Vec<CullingTask> {
    let mut rng = StdRng::seed_from_u64(0x5167_4c1e);
    (0..count)
        .map(|i| {
            let position = Vec3::new(
                rng.gen_range(-WORLD_HALF_SIZE..WORLD_HALF_SIZE),
                rng.gen_range(-50.0..50.0),
                rng.gen_range(-WORLD_HALF_SIZE..WORLD_HALF_SIZE),
            );
            let spatial = SpatialCache {
                position,
                bounds_center: position,
                bounds_extents: Vec3::splat(rng.gen_range(0.5..4.0)),
            };
            CullingTask::new(ObjectId::new(i as u64 + 1), spatial)
        })
        .collect()
}

fn frame() -> FrameSnapshot {
    let frustum = Frustum::from_perspective(
        Vec3::ZERO,
        Vec3::Z,
        Vec3::Y,
        60f32.to_radians(),
        16.0 / 9.0,
        0.3,
        1000.0,
    );
    FrameSnapshot::new(Vec3::new(0.0, 1.0, 5.0), Vec3::ZERO, frustum.planes, 5.0)
}

/// Single-threaded baseline: the decision function alone.
fn bench_decide_sequential(c: &mut Criterion) {
    let tasks = scattered_tasks(OBJECT_COUNT);
    let snapshot = frame();
    let params = CullingParams::from(&CullingConfig::default());

    c.bench_function("decide_10k_sequential", |b| {
        b.iter(|| {
            let visible = tasks
                .iter()
                .filter(|task| decide(task, &snapshot, &params))
                .count();
            black_box(visible)
        });
    });
}

/// Full batched evaluation across batch sizes.
fn bench_batch_sizes(c: &mut Criterion) {
    let snapshot = frame();
    let params = CullingParams::from(&CullingConfig::default());
    let cancel = AtomicBool::new(false);

    let mut group = c.benchmark_group("evaluate_10k");
    for batch_size in [25usize, 100, 500, 2_500] {
        let evaluator = match BatchEvaluator::new(batch_size, 0) {
            Ok(evaluator) => evaluator,
            Err(e) => panic!("worker pool: {e}"),
        };
        let mut tasks = scattered_tasks(OBJECT_COUNT);

        group.bench_with_input(BenchmarkId::from_parameter(batch_size), &batch_size, |b, _| {
            b.iter(|| {
                let summary = evaluator.evaluate(&mut tasks, &snapshot, &params, &cancel);
                black_box(summary.ok())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decide_sequential, bench_batch_sizes);
criterion_main!(benches);
