//! Viewport materialization benchmarks.
//!
//! A renderer asks the world for every visible cell on each viewport change.
//! These benchmarks measure that cost for a cold world (every cell decided by
//! the generator) and a warm one (every cell answered from mementos).
//!
//! Run with: `cargo bench --bench world_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use geomerge_world::prelude::*;

fn viewport(radius: i64) -> Vec<GridCoord> {
    (-radius..=radius)
        .flat_map(|row| (-radius..=radius).map(move |col| GridCoord::new(row, col)))
        .collect()
}

fn bench_cold_viewport(c: &mut Criterion) {
    let mut group = c.benchmark_group("cold_viewport");
    for radius in [8i64, 16, 32] {
        let cells = viewport(radius);
        group.bench_with_input(BenchmarkId::from_parameter(radius), &cells, |b, cells| {
            b.iter(|| {
                let mut world = World::new(WorldConfig::default()).unwrap();
                for &coord in cells {
                    black_box(world.query_or_spawn(coord));
                }
            });
        });
    }
    group.finish();
}

fn bench_warm_viewport(c: &mut Criterion) {
    let mut group = c.benchmark_group("warm_viewport");
    for radius in [8i64, 16, 32] {
        let cells = viewport(radius);
        let mut world = World::new(WorldConfig::default()).unwrap();
        for &coord in &cells {
            world.query_or_spawn(coord);
        }
        group.bench_with_input(BenchmarkId::from_parameter(radius), &cells, |b, cells| {
            b.iter(|| {
                for &coord in cells {
                    black_box(world.query_or_spawn(coord));
                }
            });
        });
    }
    group.finish();
}

fn bench_export_import(c: &mut Criterion) {
    let mut world = World::new(WorldConfig::default()).unwrap();
    for coord in viewport(32) {
        world.query_or_spawn(coord);
    }
    let records = world.export_mementos();

    c.bench_function("export_4225_mementos", |b| {
        b.iter(|| black_box(world.export_mementos()));
    });
    c.bench_function("import_4225_mementos", |b| {
        b.iter(|| black_box(World::from_mementos(WorldConfig::default(), &records).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_cold_viewport,
    bench_warm_viewport,
    bench_export_import
);
criterion_main!(benches);
