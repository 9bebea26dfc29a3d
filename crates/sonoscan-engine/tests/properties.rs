//! Property-based tests for the render path.

use proptest::prelude::*;
use sonoscan_core::{ColumnAcoustics, ShapeId};
use sonoscan_engine::{EngineSettings, SonificationEngine};

fn shape_strategy() -> impl Strategy<Value = ShapeId> {
    prop_oneof![
        Just(ShapeId::None),
        Just(ShapeId::Sphere),
        Just(ShapeId::Triangle),
        Just(ShapeId::Cube),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    /// Any sequence of columns yields finite audio under the ceiling.
    #[test]
    fn any_columns_stay_bounded(
        envelope in prop::collection::vec(0.0f32..=1.0, 40),
        mask_start in 0usize..40,
        mask_len in 0usize..40,
        shape in shape_strategy(),
        pan in -1.0f32..=1.0,
        proximity in 0.0f32..=1.0,
        edge in 0.0f32..=1.0,
        gain_db in -20.0f32..24.0,
    ) {
        let (mut engine, control) = SonificationEngine::new(EngineSettings::default());
        control.start();
        control.set_master_gain_db(gain_db);

        let mut column = ColumnAcoustics::silent(0, 40);
        column.envelope = envelope;
        let end = (mask_start + mask_len).min(40);
        column.target_mask[mask_start..end].fill(1.0);
        column.shape = shape;
        column.pan = pan;
        column.proximity = proximity;
        column.edge = edge;

        let mut l = vec![0.0f32; 1024];
        let mut r = vec![0.0f32; 1024];
        for _ in 0..6 {
            control.apply_column(&column);
            engine.render(&mut l, &mut r);
            let ceiling = engine.settings().limiter_ceiling + 1e-5;
            prop_assert!(l.iter().chain(&r).all(|s| s.is_finite() && s.abs() <= ceiling));
        }
    }

    /// Every request length is filled exactly.
    #[test]
    fn any_length_is_filled(len in 0usize..3000) {
        let (mut engine, control) = SonificationEngine::new(EngineSettings::default());
        control.start();
        control.update_envelope(&[1.0; 40]);
        let mut l = vec![f32::NAN; len];
        let mut r = vec![f32::NAN; len];
        engine.render(&mut l, &mut r);
        prop_assert!(l.iter().chain(&r).all(|s| s.is_finite()));
        let expected_blocks = len.div_ceil(engine.hop()) as u64;
        prop_assert_eq!(engine.stats().blocks_rendered, expected_blocks);
    }
}
