//! Benchmarks for the CPU side of a frame.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec2;

use metaballs::config::Falloff;
use metaballs::ramp::ThresholdRamp;
use metaballs::{shaders, Settings, Simulator, Viewport};

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");
    let viewport = Viewport::new(800.0, 600.0, 1.0);
    let pointer = Vec2::new(400.0, 300.0);

    for (name, settings) in [
        ("rain", Settings::rain()),
        ("fountain", Settings::fountain()),
        ("label", Settings::label()),
        ("tilted_line", Settings::tilted_line()),
    ] {
        let mut sim = settings.sim;
        sim.particle_count = 500;
        let mut simulator = Simulator::new(sim, viewport, 42);
        simulator.set_label_size(Some(Vec2::new(400.0, 60.0)));

        group.bench_with_input(BenchmarkId::new(name, 500), &500, |b, _| {
            b.iter(|| simulator.step(black_box(16.0), black_box(pointer)))
        });
    }

    group.finish();
}

fn bench_shader_gen(c: &mut Criterion) {
    let mut group = c.benchmark_group("shader_gen");

    group.bench_function("sprite", |b| b.iter(|| black_box(shaders::sprite_shader(Falloff::Clamped))));
    group.bench_function("composite", |b| b.iter(|| black_box(shaders::composite_shader())));

    group.finish();
}

fn bench_ramp(c: &mut Criterion) {
    let ramp = Settings::label().look.ramp;
    let empty = ThresholdRamp::default();

    c.bench_function("ramp_shade_256", |b| {
        b.iter(|| {
            for i in 0..256 {
                black_box(ramp.shade(i as f32 / 255.0));
            }
        })
    });
    c.bench_function("ramp_to_uniform", |b| b.iter(|| black_box(empty.to_uniform())));
}

criterion_group!(benches, bench_step, bench_shader_gen, bench_ramp);
criterion_main!(benches);
