//! Criterion benchmarks for cantus-core DSP primitives
//!
//! Run with: cargo bench -p cantus-core

use cantus_core::filter::{FilterKernel, FilterKind, FilterParams, FilterStage};
use cantus_core::{Echo, EchoParams, Ramp};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const BLOCK_SIZES: &[usize] = &[64, 256, 1024];

fn test_signal(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| (2.0 * std::f64::consts::PI * 440.0 * i as f64 / 48_000.0).sin() * 0.5)
        .collect()
}

fn bench_kernel(c: &mut Criterion) {
    let mut group = c.benchmark_group("FilterKernel");

    for &block_size in BLOCK_SIZES {
        let input = test_signal(block_size);
        group.bench_with_input(
            BenchmarkId::new("biquad_process", block_size),
            &block_size,
            |b, _| {
                let mut kernel = FilterKernel::new();
                kernel.design(FilterKind::LowPass, 0, 1000.0, 0.707, 0.0);
                b.iter(|| {
                    for &sample in &input {
                        black_box(kernel.process(black_box(sample)));
                    }
                });
            },
        );
    }

    group.bench_function("biquad_design", |b| {
        let mut kernel = FilterKernel::new();
        b.iter(|| {
            kernel.design(
                FilterKind::LowPass,
                0,
                black_box(1000.0),
                black_box(0.707),
                0.0,
            )
        });
    });

    group.bench_function("fir50_design", |b| {
        let mut kernel = FilterKernel::new();
        b.iter(|| {
            kernel.design(FilterKind::LowPassFir, 50, black_box(1000.0), 1.0, 0.0)
        });
    });

    group.finish();
}

fn bench_stage_per_sample_redesign(c: &mut Criterion) {
    // The voice chain rebuilds coefficients every sample; this is that
    // worst case.
    let mut group = c.benchmark_group("FilterStage");
    let input = test_signal(1024);

    group.bench_function("biquad_redesign_per_sample", |b| {
        let mut stage = FilterStage::new();
        stage.apply_params(&FilterParams {
            enabled: true,
            kind: FilterKind::LowPass,
            ..FilterParams::default()
        });
        b.iter(|| {
            for &sample in &input {
                black_box(stage.process(black_box(sample), 1.001, 1.0, 1.0));
            }
        });
    });

    group.finish();
}

fn bench_echo_and_ramp(c: &mut Criterion) {
    let mut group = c.benchmark_group("Primitives");
    let input = test_signal(1024);

    group.bench_function("echo_1024", |b| {
        let mut echo = Echo::new();
        echo.apply_params(&EchoParams {
            enabled: true,
            delay: 250.0,
            feedback_gain: 0.4,
            mix: 0.3,
        });
        b.iter(|| {
            for &sample in &input {
                black_box(echo.process(black_box(sample)));
            }
        });
    });

    group.bench_function("ramp_1024", |b| {
        let mut ramp = Ramp::new();
        b.iter(|| {
            ramp.init(0.0);
            ramp.exponential(100.0, 1.0, 0.001);
            for _ in 0..1024 {
                black_box(ramp.step());
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_kernel, bench_stage_per_sample_redesign, bench_echo_and_ramp);
criterion_main!(benches);
