//! Integration tests for sonoscan-core.
//!
//! Exercises the reference band scenario, the depth envelope for a uniform
//! column, and resonator pitch against the band map.

use sonoscan_core::acoustics::{closeness, depth_to_gain, smooth_across_bands};
use sonoscan_core::{BandMap, NoiseTable, Resonator, ShapeId, db_to_linear};

const SAMPLE_RATE: f32 = 48000.0;

// ============================================================================
// Band map
// ============================================================================

#[test]
fn band_scenario_50_to_10050() {
    let map = BandMap::new(SAMPLE_RATE, 1024, 40, 50.0, 10050.0);
    let r = (10050.0f64 / 50.0).powf(1.0 / 40.0) as f32;

    let (lo0, hi0) = map.band_range(0);
    assert_eq!(lo0, 50.0);
    assert!((hi0 - 50.0 * r).abs() < 1e-2, "band 0 upper {hi0}");

    let (lo39, hi39) = map.band_range(39);
    assert!((lo39 - 10050.0 / r).abs() < 0.5, "band 39 lower {lo39}");
    assert_eq!(hi39, 10050.0);

    assert!((map.ratio() - r).abs() < 1e-5);
}

#[test]
fn band_lookup_covers_every_bin() {
    let map = BandMap::new(SAMPLE_RATE, 1024, 40, 50.0, 10050.0);
    let mut last = 0;
    for k in 0..map.num_bins() {
        let band = map.band_of_bin(k);
        assert!(band < 40);
        assert!(band >= last, "band lookup must be monotonic in frequency");
        last = band;
    }
    assert_eq!(map.band_of_bin(0), 0);
    assert_eq!(map.band_of_bin(512), 39);
}

#[test]
fn reconfigure_matches_fresh_map() {
    let mut map = BandMap::new(SAMPLE_RATE, 1024, 40, 50.0, 10050.0);
    map.reconfigure(120.0, 6000.0);
    let fresh = BandMap::new(SAMPLE_RATE, 1024, 40, 120.0, 6000.0);
    assert_eq!(map.edges(), fresh.edges());
    assert_eq!(map.bin_weights(), fresh.bin_weights());
}

// ============================================================================
// Depth envelope
// ============================================================================

#[test]
fn uniform_column_envelope() {
    let (near, far, range_db) = (0.3, 4.0, 30.0);
    let t = closeness(1.0, near, far);
    assert!((t - 0.811).abs() < 1e-3);

    let gain = depth_to_gain(1.0, near, far, range_db);
    assert!((gain - db_to_linear(-range_db * (1.0 - t))).abs() < 1e-6);

    let mut envelope = vec![gain; 40];
    smooth_across_bands(&mut envelope, 0.5);
    for v in envelope {
        assert!((v - gain).abs() < 1e-5, "smoothed {v} vs {gain}");
    }
}

// ============================================================================
// Resonators
// ============================================================================

/// Estimate the period of a signal from its autocorrelation peak.
fn autocorrelation_peak(signal: &[f32], min_lag: usize, max_lag: usize) -> usize {
    let mut best = (min_lag, f32::MIN);
    for lag in min_lag..max_lag {
        let score: f32 = signal[lag..]
            .iter()
            .zip(signal.iter())
            .map(|(a, b)| a * b)
            .sum();
        if score > best.1 {
            best = (lag, score);
        }
    }
    best.0
}

#[test]
fn sphere_rings_at_band_center() {
    let map = BandMap::new(SAMPLE_RATE, 1024, 40, 50.0, 10050.0);
    let f0 = map.center(12);
    let mut res = Resonator::for_shape(ShapeId::Sphere, 2048);
    res.tune(SAMPLE_RATE, f0, 0.95);

    let mut noise = NoiseTable::default();
    let output: Vec<f32> = (0..8192)
        .map(|_| res.process(noise.next_sample() * 0.1).unwrap_or(0.0))
        .collect();

    let expected = libm::roundf(SAMPLE_RATE / f0) as usize;
    let found = autocorrelation_peak(&output[2048..], 8, expected + expected / 2);
    assert_eq!(found, expected, "period {found} vs delay {expected}");
}

#[test]
fn every_family_is_audible() {
    let mut noise = NoiseTable::default();
    for shape in ShapeId::FAMILIES {
        let mut res = Resonator::for_shape(shape, 2048);
        res.tune(SAMPLE_RATE, 440.0, sonoscan_core::coefficient_for(shape, 0.5));
        let energy: f32 = (0..4096)
            .map(|_| res.process(noise.next_sample()).unwrap_or(0.0).powi(2))
            .sum();
        assert!(energy > 1.0, "{} produced too little energy: {energy}", shape.name());
    }
}
