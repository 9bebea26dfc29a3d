//! Property-based tests for sonoscan-core primitives.
//!
//! Covers the pan law, band-edge geometry, depth-to-gain monotonicity,
//! resonator stability and delay-line index safety using proptest for
//! randomized input generation.

use proptest::prelude::*;
use sonoscan_core::acoustics::{closeness, depth_to_gain, smooth_across_bands};
use sonoscan_core::{
    BandMap, DelayLine, MIN_DELAY, Resonator, ShapeId, coefficient_for, constant_power_pan,
    delay_for_frequency,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// gL² + gR² = 1 for every pan in [-1, 1].
    #[test]
    fn pan_is_constant_power(pan in -1.0f32..=1.0f32) {
        let (l, r) = constant_power_pan(pan);
        prop_assert!((l * l + r * r - 1.0).abs() < 1e-5, "pan {} gave {} / {}", pan, l, r);
        prop_assert!(l >= 0.0 && r >= 0.0);
    }

    /// Edges are strictly increasing and geometrically spaced.
    #[test]
    fn band_edges_geometric(
        min_hz in 20.0f32..500.0f32,
        octaves in 1.0f32..9.0f32,
        bands in 1usize..64,
    ) {
        let max_hz = (min_hz * 2f32.powf(octaves)).min(23_000.0);
        let map = BandMap::new(48000.0, 1024, bands, min_hz, max_hz);
        let edges = map.edges();
        prop_assert_eq!(edges.len(), bands + 1);

        let expected = map.ratio();
        for pair in edges.windows(2) {
            prop_assert!(pair[1] > pair[0]);
            let ratio = pair[1] / pair[0];
            prop_assert!(
                (ratio - expected).abs() / expected < 1e-4,
                "ratio {} differs from {}", ratio, expected
            );
        }
    }

    /// Every bin maps to exactly one band in range and weights sum to one.
    #[test]
    fn every_bin_in_range(
        min_hz in 1.0f32..2000.0f32,
        max_hz in 1.0f32..30000.0f32,
        bands in 1usize..80,
    ) {
        let map = BandMap::new(44100.0, 512, bands, min_hz, max_hz);
        let ones = vec![1.0f32; bands];
        for k in 0..map.num_bins() {
            prop_assert!(map.band_of_bin(k) < bands);
            prop_assert!((map.bin_weight(k).apply(&ones) - 1.0).abs() < 1e-5);
        }
    }

    /// Decreasing distance never decreases gain.
    #[test]
    fn depth_to_gain_monotonic(
        a in 0.3f32..4.0f32,
        b in 0.3f32..4.0f32,
        range_db in 0.0f32..60.0f32,
    ) {
        let (near_d, far_d) = if a <= b { (a, b) } else { (b, a) };
        let g_near = depth_to_gain(near_d, 0.3, 4.0, range_db);
        let g_far = depth_to_gain(far_d, 0.3, 4.0, range_db);
        prop_assert!(g_near >= g_far, "gain({}) = {} < gain({}) = {}", near_d, g_near, far_d, g_far);
        prop_assert!((0.0..=1.0).contains(&closeness(near_d, 0.3, 4.0)));
    }

    /// Smoothing keeps values within the input's bounds.
    #[test]
    fn band_smoothing_bounded(
        values in prop::collection::vec(0.0f32..1.0f32, 2..64),
        decay in 0.0f32..0.99f32,
    ) {
        let lo = values.iter().copied().fold(f32::INFINITY, f32::min);
        let hi = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mut smoothed = values.clone();
        smooth_across_bands(&mut smoothed, decay);
        for v in smoothed {
            prop_assert!(v >= lo - 1e-5 && v <= hi + 1e-5);
        }
    }

    /// Tuned delays stay in [MIN_DELAY, max].
    #[test]
    fn delay_length_in_range(freq in prop::num::f32::ANY, max_len in 0usize..4096) {
        let m = delay_for_frequency(48000.0, freq, max_len);
        prop_assert!(m >= MIN_DELAY);
        prop_assert!(m <= max_len.max(MIN_DELAY));
    }

    /// Retuning a delay line mid-stream never indexes out of range.
    #[test]
    fn delay_line_retune_is_safe(
        lengths in prop::collection::vec(0usize..600, 1..20),
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut line = DelayLine::new(512);
        for len in lengths {
            line.set_len(len);
            prop_assert!(line.len() >= 1 && line.len() <= 512);
            for &x in &input {
                let y = line.tick(x);
                prop_assert!(y.is_finite());
            }
        }
    }

    /// Every resonator family stays finite for bounded input at any tuning.
    #[test]
    fn resonators_stay_finite(
        shape in 0u8..4,
        f0 in 20.0f32..8000.0f32,
        z01 in 0.0f32..=1.0f32,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let shape = ShapeId::from_id(shape);
        let mut res = Resonator::for_shape(shape, 2048);
        res.tune(48000.0, f0, coefficient_for(shape, z01));
        for _ in 0..32 {
            for &x in &input {
                let y = res.process(x);
                prop_assert!(matches!(y, Some(v) if v.is_finite()));
            }
        }
    }
}
