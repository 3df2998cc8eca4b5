//! Bounds Benchmarks
//!
//! Cached versus recomputed AABB queries

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use glam::{Mat4, Quat, Vec3};
use polyview_core::primitives;

fn transform(step: u32) -> Mat4 {
    Mat4::from_scale_rotation_translation(
        Vec3::splat(1.5),
        Quat::from_rotation_y(step as f32 * 0.01),
        Vec3::new(1.0, 2.0, 3.0),
    )
}

fn bench_cached_bounds(c: &mut Criterion) {
    let mesh = primitives::prism(1024, 1.0, 2.0);
    let matrix = transform(0);
    mesh.bounds(matrix);

    c.bench_function("bounds_cached", |b| {
        b.iter(|| black_box(mesh.bounds(black_box(matrix))));
    });
}

fn bench_recomputed_bounds(c: &mut Criterion) {
    let mut group = c.benchmark_group("bounds_recompute");

    for sides in [16u32, 256, 4096].iter() {
        let mesh = primitives::prism(*sides, 1.0, 2.0);
        group.bench_with_input(BenchmarkId::from_parameter(sides), &mesh, |b, mesh| {
            let mut step = 0;
            b.iter(|| {
                step += 1;
                black_box(mesh.bounds(transform(step)))
            });
        });
    }

    group.finish();
}

fn bench_hull_shortcut(c: &mut Criterion) {
    let mut mesh = primitives::prism(4096, 1.0, 2.0);
    // Eight box corners stand in for a precomputed hull.
    let hull = (0..8)
        .map(|i| {
            Vec3::new(
                if i & 1 == 0 { -1.0 } else { 1.0 },
                if i & 2 == 0 { -1.0 } else { 1.0 },
                if i & 4 == 0 { -1.0 } else { 1.0 },
            )
        })
        .collect();
    mesh.set_convex_hull(Some(hull));

    c.bench_function("bounds_hull_4096", |b| {
        let mut step = 0;
        b.iter(|| {
            step += 1;
            black_box(mesh.bounds(transform(step)))
        });
    });
}

criterion_group!(
    benches,
    bench_cached_bounds,
    bench_recomputed_bounds,
    bench_hull_shortcut,
);

criterion_main!(benches);
