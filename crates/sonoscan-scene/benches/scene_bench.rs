//! Criterion benchmarks for grid fusion and column acoustics
//!
//! Run with: cargo bench -p sonoscan-scene
#![allow(missing_docs)]

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use sonoscan_scene::{
    FusionSettings, GridStore, Orientation, ScanSettings, SyntheticScene,
    compute_column_acoustics, downsample_depth, vote_classes,
};

fn bench_fusion(c: &mut Criterion) {
    let mut group = c.benchmark_group("Fusion");
    let scene = SyntheticScene::demo(640, 480);
    let mut depth = Vec::new();
    scene.render_depth_into(0.0, &mut depth);
    let classes = scene.render_classes(0.0);

    group.bench_function("downsample_depth_640x480", |b| {
        let image = scene.depth_image(&depth);
        b.iter(|| black_box(downsample_depth(black_box(&image), 60, 40)));
    });

    group.bench_function("vote_classes_640x480", |b| {
        let image = classes.as_image();
        b.iter(|| black_box(vote_classes(black_box(&image), 60, 40, Orientation::IDENTITY)));
    });

    group.finish();
}

fn bench_column(c: &mut Criterion) {
    let store = GridStore::new(FusionSettings::default());
    let scene = SyntheticScene::demo(640, 480);
    let mut depth = Vec::new();
    scene.render_depth_into(0.0, &mut depth);
    store.ingest_depth_frame(&scene.depth_image(&depth));
    store.ingest_classification_frame(&scene.render_classes(0.0).as_image());
    let settings = ScanSettings::default();

    c.bench_function("Scan/snapshot_and_compute", |b| {
        let mut column = 0;
        b.iter(|| {
            column = (column + 1) % 60;
            let snap = store.read_snapshot(column);
            black_box(compute_column_acoustics(&snap, 60, &settings))
        });
    });
}

criterion_group!(benches, bench_fusion, bench_column);
criterion_main!(benches);
