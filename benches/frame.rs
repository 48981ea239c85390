//! Benchmarks for the host-side frame loop.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use glam::Vec3;

use strange_attractor::{AttractorVariant, EngineConfig, Session, SoftwareDevice};

fn bench_solver_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("solver_step");

    for variant in AttractorVariant::ALL {
        group.bench_function(variant.name(), |b| {
            b.iter_batched(
                || Vec3::new(1.3, 1.7, 1.1),
                |p| variant.step(black_box(p)),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_session_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_frame");

    // Filling levels: right after a reset versus a store holding many points.
    for warmup in [0u32, 1000] {
        group.bench_with_input(BenchmarkId::new("warm_frames", warmup), &warmup, |b, &warmup| {
            let config = EngineConfig::new()
                .with_capacity(65_536)
                .with_iterations(20)
                .with_resolution(256)
                .with_rng_seed(1);
            let device = SoftwareDevice::new(config.resolution, config.capacity);
            let mut session = Session::new(&config, device).expect("valid bench config");
            for _ in 0..warmup {
                session.frame();
            }
            b.iter(|| black_box(session.frame().valid_count))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_solver_step, bench_session_frame);
criterion_main!(benches);
