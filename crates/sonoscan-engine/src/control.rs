//! Non-real-time control surface.
//!
//! [`ControlSurface`] is the only way other threads talk to the engine.
//! Every method stages values into [`PendingParams`](crate::staging) and
//! returns immediately; the render thread picks them up at its next block.
//! The surface is cheap to clone and may be shared across threads.
//!
//! Resonator tuning is derived here, not on the render thread: the target
//! mask's mean band gives the fundamental `f0`, which becomes the delay
//! `M = round(sample_rate / f0)`; the coefficient and level follow the
//! current distance.

use std::sync::Arc;

use parking_lot::Mutex;
use sonoscan_core::{
    BandMap, ColumnAcoustics, ShapeId, clamp01, coefficient_for, delay_for_frequency,
};

use crate::engine::Shared;
use crate::settings::EngineSettings;
use crate::stats::EngineStats;
use crate::staging::FamilyParams;

/// Mask entries above this count as target bands.
const MASK_ON: f32 = 0.5;
/// Target boost limit in dB, either direction.
pub const MAX_BOOST_DB: f32 = 24.0;

/// Settings the surface needs, copied out of [`EngineSettings`].
#[derive(Debug, Clone, Copy)]
struct ControlConfig {
    sample_rate: f32,
    resonator_capacity: usize,
    foreground_level: f32,
    boost_db: f32,
    edge_threshold: f32,
}

#[derive(Debug, Clone, Copy)]
struct Target {
    shape: ShapeId,
    /// Mean index of the masked bands.
    band: f32,
}

#[derive(Debug)]
struct ControlState {
    band_map: BandMap,
    target: Option<Target>,
    distance: f32,
    last_edge: f32,
}

/// Handle for steering a [`SonificationEngine`](crate::SonificationEngine)
/// from non-real-time threads.
#[derive(Clone)]
pub struct ControlSurface {
    shared: Arc<Shared>,
    state: Arc<Mutex<ControlState>>,
    config: ControlConfig,
}

impl std::fmt::Debug for ControlSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlSurface")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl ControlSurface {
    pub(crate) fn new(shared: Arc<Shared>, band_map: BandMap, settings: &EngineSettings) -> Self {
        Self {
            shared,
            state: Arc::new(Mutex::new(ControlState {
                band_map,
                target: None,
                distance: 0.0,
                last_edge: 0.0,
            })),
            config: ControlConfig {
                sample_rate: settings.sample_rate,
                resonator_capacity: settings.resonator_capacity,
                foreground_level: settings.foreground_level,
                boost_db: settings.boost_db,
                edge_threshold: settings.edge_threshold,
            },
        }
    }

    /// Set the band map's frequency range.
    ///
    /// Reversed bounds are swapped, the top is capped at Nyquist and a
    /// degenerate range is widened. An active target is retuned.
    pub fn configure_bands(&self, min_hz: f32, max_hz: f32) {
        let mut state = self.state.lock();
        state.band_map.reconfigure(min_hz, max_hz);
        let (lo, hi) = (state.band_map.min_hz(), state.band_map.max_hz());
        self.shared.pending.range.stage(lo, hi);
        tracing::debug!(min_hz = lo, max_hz = hi, "band range staged");
        self.stage_families(&state);
    }

    /// Current band range as applied (after normalization).
    pub fn band_range(&self) -> (f32, f32) {
        let state = self.state.lock();
        (state.band_map.min_hz(), state.band_map.max_hz())
    }

    /// Stage per-band envelope gains, band 0 lowest.
    pub fn update_envelope(&self, gains: &[f32]) {
        self.shared.pending.spectrum.stage_envelope(gains);
    }

    /// Emphasize the masked bands by `boost_db` and voice `shape`'s
    /// resonator at the masked bands' mean frequency.
    ///
    /// The boost is clamped to ±[`MAX_BOOST_DB`]; a non-finite boost falls
    /// back to the configured default.
    ///
    /// A shape without a resonator family, or a mask with no set band,
    /// clears the target instead.
    pub fn set_target_bands(&self, mask: &[f32], shape: ShapeId, boost_db: f32) {
        let band = match (shape.family_index(), mean_masked_band(mask)) {
            (Some(_), Some(band)) => band,
            _ => {
                self.clear_target();
                return;
            }
        };
        let boost_db = if boost_db.is_finite() {
            boost_db.clamp(-MAX_BOOST_DB, MAX_BOOST_DB)
        } else {
            self.config.boost_db
        };
        {
            let mut state = self.state.lock();
            state.target = Some(Target { shape, band });
            self.stage_families(&state);
        }
        self.shared.pending.spectrum.stage_mask(mask, boost_db);
    }

    /// Release the target: every family ramps to silence and the mask
    /// decays to zero.
    pub fn clear_target(&self) {
        {
            let mut state = self.state.lock();
            state.target = None;
            self.stage_families(&state);
        }
        self.shared.pending.spectrum.clear_mask();
    }

    /// Stage the column proximity `z01` (0 = near). Non-finite values are
    /// ignored.
    pub fn update_distance(&self, z01: f32) {
        if !z01.is_finite() {
            return;
        }
        let z01 = clamp01(z01);
        self.shared.pending.scalars.stage_distance(z01);
        let mut state = self.state.lock();
        state.distance = z01;
        self.stage_families(&state);
    }

    /// Arm an edge click of `strength` in `[0, 1]`.
    pub fn trigger_edge(&self, strength: f32) {
        let strength = clamp01(strength);
        if strength > 0.0 {
            self.shared.pending.edge.trigger(strength);
        }
    }

    /// Stage the stereo position in `[-1, 1]`. Non-finite values are ignored.
    pub fn set_pan(&self, pan: f32) {
        if pan.is_finite() {
            self.shared.pending.scalars.stage_pan(pan.clamp(-1.0, 1.0));
        }
    }

    /// Stage the master makeup gain, clamped to `[-60, 24]` dB.
    pub fn set_master_gain_db(&self, db: f32) {
        if db.is_finite() {
            self.shared
                .pending
                .scalars
                .stage_master_gain_db(db.clamp(-60.0, 24.0));
        }
    }

    /// Let the engine produce sound.
    pub fn start(&self) {
        self.shared.pending.set_running(true);
        tracing::info!("engine started");
    }

    /// Silence the engine; the render callback keeps returning zeros.
    pub fn stop(&self) {
        self.shared.pending.set_running(false);
        tracing::info!("engine stopped");
    }

    /// Whether [`start`](Self::start) is in effect.
    pub fn is_running(&self) -> bool {
        self.shared.pending.is_running()
    }

    /// Engine counters.
    pub fn stats(&self) -> EngineStats {
        self.shared.stats.snapshot()
    }

    /// Map one scan tick onto the controls.
    ///
    /// Envelope, distance, target and pan are staged every call; a click
    /// fires only when the edge strength crosses the threshold upward.
    pub fn apply_column(&self, acoustics: &ColumnAcoustics) {
        self.update_envelope(&acoustics.envelope);
        self.update_distance(acoustics.proximity);
        if acoustics.shape == ShapeId::None {
            self.clear_target();
        } else {
            self.set_target_bands(&acoustics.target_mask, acoustics.shape, self.config.boost_db);
        }
        self.set_pan(acoustics.pan);

        let edge = if acoustics.edge.is_finite() { acoustics.edge } else { 0.0 };
        let previous = {
            let mut state = self.state.lock();
            std::mem::replace(&mut state.last_edge, edge)
        };
        let threshold = self.config.edge_threshold;
        if edge >= threshold && previous < threshold {
            self.trigger_edge(edge);
        }
    }

    /// Stage every family: the target's family active, the others released.
    fn stage_families(&self, state: &ControlState) {
        for shape in ShapeId::FAMILIES {
            let Some(index) = shape.family_index() else {
                continue;
            };
            let slot = &self.shared.pending.families[index];
            match state.target {
                Some(target) if target.shape == shape => {
                    slot.stage(self.family_params(state, target));
                }
                _ => {
                    let current = slot.peek();
                    if current.active {
                        slot.stage(FamilyParams {
                            active: false,
                            level: 0.0,
                            ..current
                        });
                    }
                }
            }
        }
    }

    fn family_params(&self, state: &ControlState, target: Target) -> FamilyParams {
        let map = &state.band_map;
        let f0 = map.min_hz() * map.ratio().powf(target.band + 0.5);
        let max_len = self.config.resonator_capacity.saturating_sub(1);
        FamilyParams {
            coefficient: coefficient_for(target.shape, state.distance),
            delay: delay_for_frequency(self.config.sample_rate, f0, max_len),
            active: true,
            level: self.config.foreground_level * (1.0 - 0.5 * state.distance),
        }
    }
}

/// Mean index of mask entries above 0.5, `None` when there are none.
fn mean_masked_band(mask: &[f32]) -> Option<f32> {
    let (sum, count) = mask
        .iter()
        .enumerate()
        .filter(|&(_, &m)| m > MASK_ON)
        .fold((0usize, 0usize), |(sum, count), (i, _)| (sum + i, count + 1));
    (count > 0).then(|| sum as f32 / count as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SonificationEngine;

    fn surface() -> ControlSurface {
        let (_engine, control) = SonificationEngine::new(EngineSettings::default());
        control
    }

    fn family(control: &ControlSurface, shape: ShapeId) -> FamilyParams {
        let index = shape.family_index().unwrap();
        control.shared.pending.families[index].peek()
    }

    #[test]
    fn mean_band_of_mask() {
        assert_eq!(mean_masked_band(&[0.0, 1.0, 0.0, 1.0]), Some(2.0));
        assert_eq!(mean_masked_band(&[0.2, 0.4]), None);
        assert_eq!(mean_masked_band(&[]), None);
    }

    #[test]
    fn target_tunes_its_family() {
        let control = surface();
        let mut mask = vec![0.0; 40];
        mask[20] = 1.0;
        control.set_target_bands(&mask, ShapeId::Sphere, 6.0);

        let p = family(&control, ShapeId::Sphere);
        assert!(p.active);
        // band 20 of 100..8000 Hz over 40 bands
        let ratio = (8000.0f32 / 100.0).powf(1.0 / 40.0);
        let f0 = 100.0 * ratio.powf(20.5);
        assert_eq!(p.delay, (48000.0 / f0).round() as usize);
        assert!(!family(&control, ShapeId::Cube).active);
    }

    #[test]
    fn switching_shape_releases_the_previous_family() {
        let control = surface();
        let mask = vec![1.0; 40];
        control.set_target_bands(&mask, ShapeId::Cube, 6.0);
        assert!(family(&control, ShapeId::Cube).active);
        control.set_target_bands(&mask, ShapeId::Triangle, 6.0);
        assert!(!family(&control, ShapeId::Cube).active);
        assert_eq!(family(&control, ShapeId::Cube).level, 0.0);
        assert!(family(&control, ShapeId::Triangle).active);
    }

    #[test]
    fn empty_mask_or_background_clears() {
        let control = surface();
        let mut mask = vec![0.0; 40];
        mask[3] = 1.0;
        control.set_target_bands(&mask, ShapeId::Sphere, 6.0);
        control.set_target_bands(&[0.0; 40], ShapeId::Sphere, 6.0);
        assert!(!family(&control, ShapeId::Sphere).active);

        control.set_target_bands(&mask, ShapeId::Sphere, 6.0);
        control.set_target_bands(&mask, ShapeId::None, 6.0);
        assert!(!family(&control, ShapeId::Sphere).active);
    }

    #[test]
    fn distance_scales_level_and_feedback() {
        let control = surface();
        let mask = vec![1.0; 40];
        control.update_distance(0.0);
        control.set_target_bands(&mask, ShapeId::Sphere, 6.0);
        let near = family(&control, ShapeId::Sphere);

        control.update_distance(1.0);
        let far = family(&control, ShapeId::Sphere);
        assert!(far.level < near.level);
        assert!((far.level - 0.5 * near.level).abs() < 1e-6);
        assert!(far.coefficient < near.coefficient);

        control.update_distance(f32::NAN);
        assert_eq!(family(&control, ShapeId::Sphere), far);
    }

    #[test]
    fn retune_on_band_change() {
        let control = surface();
        let mask = vec![1.0; 40];
        control.set_target_bands(&mask, ShapeId::Triangle, 6.0);
        let before = family(&control, ShapeId::Triangle).delay;
        control.configure_bands(1000.0, 4000.0);
        let after = family(&control, ShapeId::Triangle).delay;
        assert!(after < before);
        assert_eq!(control.band_range(), (1000.0, 4000.0));
    }

    #[test]
    fn reversed_range_is_swapped() {
        let control = surface();
        control.configure_bands(5000.0, 200.0);
        assert_eq!(control.band_range(), (200.0, 5000.0));
        assert_eq!(control.shared.pending.range.take(), Some((200.0, 5000.0)));
    }

    #[test]
    fn edge_clicks_on_rising_crossing_only() {
        let control = surface();
        let mut column = ColumnAcoustics::silent(0, 40);
        let edge = &control.shared.pending.edge;

        column.edge = 0.6;
        control.apply_column(&column);
        assert_eq!(edge.take(), 0.6);

        control.apply_column(&column);
        assert_eq!(edge.take(), 0.0);

        column.edge = 0.0;
        control.apply_column(&column);
        column.edge = 0.9;
        control.apply_column(&column);
        assert_eq!(edge.take(), 0.9);
    }

    #[test]
    fn boost_is_clamped() {
        let control = surface();
        let mut out = vec![0.0; 40];
        control.set_target_bands(&[1.0; 40], ShapeId::Cube, 1e9);
        assert_eq!(control.shared.pending.spectrum.take_mask(&mut out), Some(MAX_BOOST_DB));
        control.set_target_bands(&[1.0; 40], ShapeId::Cube, f32::NAN);
        assert_eq!(control.shared.pending.spectrum.take_mask(&mut out), Some(9.0));
    }

    #[test]
    fn pan_and_gain_are_clamped() {
        let control = surface();
        control.set_pan(3.0);
        control.set_master_gain_db(100.0);
        let s = control.shared.pending.scalars.take().unwrap();
        assert_eq!(s.pan, 1.0);
        assert_eq!(s.master_gain_db, 24.0);
        control.set_pan(f32::NAN);
        assert!(control.shared.pending.scalars.take().is_none());
    }

    #[test]
    fn start_stop() {
        let control = surface();
        assert!(!control.is_running());
        control.start();
        assert!(control.is_running());
        control.clone().stop();
        assert!(!control.is_running());
    }
}
