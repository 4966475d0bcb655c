use std::sync::Arc;
use std::time::Duration;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use delve_blocks::{Biome, Block};
use delve_cube::CubeBuf;
use delve_geom::CubeCoord;
use delve_world::{CaveGenerator, FeatureDriver, GenParams, WorldCtx, WorldId, WorldSeed};

fn world() -> WorldCtx {
    let mut params = GenParams::default();
    params.range = 4;
    WorldCtx::new(WorldId(0), WorldSeed(0xC0FFEE), Arc::new(params))
}

fn bench_cold_cube(c: &mut Criterion) {
    let mut group = c.benchmark_group("caves_cold");
    let w = world();
    group.bench_function("range4_single_cube", |b| {
        b.iter(|| {
            let mut d = FeatureDriver::from_params(CaveGenerator::from_params(&w.params), &w.params);
            let mut cube = CubeBuf::filled(CubeCoord::new(0, -2, 0), Block::STONE);
            black_box(d.generate(&w, &mut cube, &Biome::PLAINS));
        })
    });
    group.finish();
}

fn bench_warm_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("caves_warm");
    group.measurement_time(Duration::from_secs(10));
    let w = world();
    let mut d = FeatureDriver::from_params(CaveGenerator::from_params(&w.params), &w.params);
    let cubes: Vec<_> = CubeCoord::new(0, -2, 0).neighborhood(1).collect();
    // Prime caches so the loop measures lookup and replay only.
    for &coord in &cubes {
        d.generate(&w, &mut CubeBuf::filled(coord, Block::STONE), &Biome::PLAINS);
    }
    group.bench_function("range4_27_cubes", |b| {
        b.iter(|| {
            let mut total = 0;
            for &coord in &cubes {
                let mut cube = CubeBuf::filled(coord, Block::STONE);
                total += d.generate(&w, &mut cube, &Biome::PLAINS);
            }
            black_box(total);
        })
    });
    group.finish();
}

criterion_group!(benches, bench_cold_cube, bench_warm_sweep);
criterion_main!(benches);
