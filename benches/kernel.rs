//! Benchmarks for the CPU mirror of the simulation kernel and the seed setup.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Vec3, Vec4};

use swarmlight::config::SimulationParameters;
use swarmlight::kernel;
use swarmlight::seed::{seeded_rng, sphere_vertices, SeedData};
use swarmlight::uniforms::{SimulationUniforms, StepContext};

fn field(segments: u32) -> (Vec<Vec4>, SimulationUniforms) {
    let positions = sphere_vertices(3.0, segments, segments).expect("sphere");
    let seed = SeedData::tight(&positions, &mut seeded_rng(Some(3))).expect("seed layout");
    let state: Vec<Vec4> = seed.texels.iter().map(|t| Vec4::from_array(*t)).collect();
    let ctx = StepContext {
        time: 1.5,
        delta_time: 1.0 / 60.0,
        frame: 90,
        follow_position: Vec3::ZERO,
        radius: 0.58,
    };
    let uniforms = SimulationUniforms::new(
        &SimulationParameters::default(),
        &ctx,
        seed.layout.particle_count(),
        seed.layout.texture_size(),
    );
    (state, uniforms)
}

fn bench_noise(c: &mut Criterion) {
    let mut group = c.benchmark_group("noise");

    group.bench_function("simplex", |b| {
        let p = Vec3::new(0.3, 1.7, -2.2);
        b.iter(|| black_box(kernel::noise3(black_box(p))))
    });

    group.bench_function("curl", |b| {
        let p = Vec3::new(0.3, 1.7, -2.2);
        b.iter(|| black_box(kernel::curl_noise(black_box(p))))
    });

    group.finish();
}

fn bench_step_field(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_field");

    for segments in [15, 63, 127] {
        let (state, uniforms) = field(segments);
        group.bench_with_input(
            BenchmarkId::new("particles", state.len()),
            &state,
            |b, state| b.iter(|| black_box(kernel::step_field(state, state, &uniforms))),
        );
    }

    group.finish();
}

fn bench_seed(c: &mut Criterion) {
    let mut group = c.benchmark_group("seed");

    for segments in [64, 256] {
        group.bench_with_input(
            BenchmarkId::new("sphere", segments),
            &segments,
            |b, &segments| {
                b.iter(|| {
                    let positions = sphere_vertices(3.0, segments, segments).expect("sphere");
                    black_box(SeedData::tight(&positions, &mut seeded_rng(Some(3))))
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_noise, bench_step_field, bench_seed);
criterion_main!(benches);
