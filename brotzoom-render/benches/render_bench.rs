use criterion::{criterion_group, criterion_main, Criterion};

use brotzoom_core::Viewport;
use brotzoom_render::{sample_pass, RenderCancel, RenderConfig, RenderEngine};

fn bench_full_frame_render(c: &mut Criterion) {
    let mut engine = RenderEngine::new(RenderConfig {
        width: 640,
        height: 480,
        ..RenderConfig::default()
    })
    .unwrap();
    let viewport = Viewport::default();

    c.bench_function("full_frame_640x480", |b| {
        b.iter(|| {
            engine.render(&viewport).unwrap();
        });
    });
}

fn bench_worker_scaling(c: &mut Criterion) {
    let viewport = Viewport::new(-0.8, -0.7, 0.05, 0.125).unwrap();
    let cancel = RenderCancel::new();
    let many = num_cpus_hint();

    c.bench_function("sample_256x256_1_worker", |b| {
        b.iter(|| sample_pass(&viewport, 256, 256, 1000, 1, &cancel).unwrap());
    });
    c.bench_function("sample_256x256_all_workers", |b| {
        b.iter(|| sample_pass(&viewport, 256, 256, 1000, many, &cancel).unwrap());
    });
}

fn bench_colorize(c: &mut Criterion) {
    let mut engine = RenderEngine::new(RenderConfig {
        width: 640,
        height: 480,
        ..RenderConfig::default()
    })
    .unwrap();
    let frame = engine.render(&Viewport::default()).unwrap().clone();
    let palette = engine.palette().clone();

    c.bench_function("colorize_640x480", |b| {
        b.iter(|| palette.colorize(&frame.grid, &frame.histogram));
    });
}

fn num_cpus_hint() -> usize {
    RenderConfig::default().workers
}

criterion_group!(
    benches,
    bench_full_frame_render,
    bench_worker_scaling,
    bench_colorize
);
criterion_main!(benches);
