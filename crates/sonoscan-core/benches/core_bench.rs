//! Criterion benchmarks for sonoscan-core primitives
//!
//! Run with: cargo bench -p sonoscan-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sonoscan_core::acoustics::smooth_across_bands;
use sonoscan_core::{BandMap, NoiseTable, Resonator, ShapeId, coefficient_for};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

fn bench_resonators(c: &mut Criterion) {
    let mut group = c.benchmark_group("Resonator");

    for shape in ShapeId::FAMILIES {
        for &block_size in BLOCK_SIZES {
            let mut noise = NoiseTable::default();
            let mut input = vec![0.0f32; block_size];
            noise.fill(&mut input);

            group.bench_with_input(
                BenchmarkId::new(shape.name(), block_size),
                &block_size,
                |b, _| {
                    let mut res = Resonator::for_shape(shape, 2048);
                    res.tune(SAMPLE_RATE, 330.0, coefficient_for(shape, 0.4));
                    b.iter(|| {
                        for &sample in &input {
                            black_box(res.process(black_box(sample)));
                        }
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_band_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("BandMap");

    group.bench_function("reconfigure_1024_40", |b| {
        let mut map = BandMap::new(SAMPLE_RATE, 1024, 40, 50.0, 10050.0);
        let mut toggle = false;
        b.iter(|| {
            toggle = !toggle;
            let max = if toggle { 8000.0 } else { 10050.0 };
            map.reconfigure(black_box(50.0), black_box(max));
        });
    });

    group.bench_function("apply_weights_513", |b| {
        let map = BandMap::new(SAMPLE_RATE, 1024, 40, 50.0, 10050.0);
        let gains: Vec<f32> = (0..40).map(|i| i as f32 / 40.0).collect();
        b.iter(|| {
            let sum: f32 = map.bin_weights().iter().map(|w| w.apply(&gains)).sum();
            black_box(sum)
        });
    });

    group.finish();
}

fn bench_noise(c: &mut Criterion) {
    c.bench_function("NoiseTable/fill_1024", |b| {
        let mut noise = NoiseTable::default();
        let mut block = vec![0.0f32; 1024];
        b.iter(|| {
            noise.fill(black_box(&mut block));
        });
    });
}

fn bench_band_smoothing(c: &mut Criterion) {
    c.bench_function("smooth_across_bands/40", |b| {
        let template: Vec<f32> = (0..40).map(|i| (i % 7) as f32 / 7.0).collect();
        let mut values = template.clone();
        b.iter(|| {
            values.copy_from_slice(&template);
            smooth_across_bands(black_box(&mut values), 0.5);
        });
    });
}

criterion_group!(
    benches,
    bench_resonators,
    bench_band_map,
    bench_noise,
    bench_band_smoothing
);
criterion_main!(benches);
