//! Block-level loudness control: edge clicks, AGC and the peak limiter.

use sonoscan_core::{db_to_linear, peak, rms};

/// Length of one edge click in samples.
pub const CLICK_LEN: usize = 24;
/// Decay constant of the click envelope, in samples.
pub const CLICK_DECAY_SAMPLES: f32 = 6.0;
/// Per-block decay of a pending click trigger.
pub const CLICK_BLOCK_DECAY: f32 = 0.4;
/// Click trigger level below which nothing is injected.
pub const CLICK_FLOOR: f32 = 1e-3;

/// Lower bound of the AGC gain.
pub const AGC_MIN_GAIN: f32 = 0.25;
/// Upper bound of the AGC gain.
pub const AGC_MAX_GAIN: f32 = 4.0;
/// Fraction of the previous AGC gain kept per block.
pub const AGC_SMOOTHING: f32 = 0.97;
/// Block RMS below which the AGC holds its gain.
pub const AGC_SILENCE: f32 = 1e-5;

/// Short decaying noise burst marking a depth edge.
#[derive(Debug, Clone)]
pub struct ClickBurst {
    envelope: [f32; CLICK_LEN],
    level: f32,
}

impl Default for ClickBurst {
    fn default() -> Self {
        Self::new()
    }
}

impl ClickBurst {
    /// Idle burst generator.
    pub fn new() -> Self {
        let mut envelope = [0.0; CLICK_LEN];
        for (i, e) in envelope.iter_mut().enumerate() {
            *e = (-(i as f32) / CLICK_DECAY_SAMPLES).exp();
        }
        Self {
            envelope,
            level: 0.0,
        }
    }

    /// Arm with `strength`; a stronger pending trigger is kept.
    pub fn trigger(&mut self, strength: f32) {
        if strength.is_finite() && strength > self.level {
            self.level = strength.min(1.0);
        }
    }

    /// Current trigger level.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Whether a click will be injected on the next block.
    pub fn is_pending(&self) -> bool {
        self.level > CLICK_FLOOR
    }

    /// Add the burst to the start of `block`, shaped by `excitation`, then
    /// decay the trigger.
    pub fn inject(&mut self, block: &mut [f32], excitation: &[f32]) {
        if !self.is_pending() {
            self.level = 0.0;
            return;
        }
        for ((s, &e), &x) in block.iter_mut().zip(&self.envelope).zip(excitation) {
            *s += self.level * e * x.signum();
        }
        self.level *= CLICK_BLOCK_DECAY;
    }

    /// Drop any pending trigger.
    pub fn reset(&mut self) {
        self.level = 0.0;
    }
}

/// Automatic gain control toward a target RMS.
///
/// The correction `target / rms` is bounded to
/// `[AGC_MIN_GAIN, AGC_MAX_GAIN]` and smoothed across blocks with
/// [`AGC_SMOOTHING`]. Within a block the gain is ramped linearly from the
/// previous block's value.
#[derive(Debug, Clone)]
pub struct Agc {
    target_rms: f32,
    gain: f32,
    enabled: bool,
}

impl Agc {
    /// AGC toward `target_rms`; disabled AGC applies unity gain.
    pub fn new(target_rms: f32, enabled: bool) -> Self {
        let target_rms = if target_rms.is_finite() && target_rms > 0.0 {
            target_rms
        } else {
            0.1
        };
        Self {
            target_rms,
            gain: 1.0,
            enabled,
        }
    }

    /// Current smoothed gain.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Target RMS.
    pub fn target_rms(&self) -> f32 {
        self.target_rms
    }

    /// Measure `block`, update the gain and apply it.
    pub fn process(&mut self, block: &mut [f32]) {
        if !self.enabled || block.is_empty() {
            return;
        }
        let previous = self.gain;
        let level = rms(block);
        if level > AGC_SILENCE && level.is_finite() {
            let desired = (self.target_rms / level).clamp(AGC_MIN_GAIN, AGC_MAX_GAIN);
            self.gain = AGC_SMOOTHING * self.gain + (1.0 - AGC_SMOOTHING) * desired;
        }
        if !self.gain.is_finite() {
            self.gain = 1.0;
        }
        apply_ramp(block, previous, self.gain);
    }

    /// Return to unity gain.
    pub fn reset(&mut self) {
        self.gain = 1.0;
    }
}

/// Makeup gain followed by a block peak limiter.
#[derive(Debug, Clone, Copy)]
pub struct Limiter {
    ceiling: f32,
}

impl Limiter {
    /// Limiter with a linear `ceiling` (clamped to `(0, 1]`).
    pub fn new(ceiling: f32) -> Self {
        let ceiling = if ceiling.is_finite() && ceiling > 0.0 {
            ceiling.min(1.0)
        } else {
            1.0
        };
        Self { ceiling }
    }

    /// Linear ceiling.
    pub fn ceiling(&self) -> f32 {
        self.ceiling
    }

    /// Apply `makeup_db`, then scale the whole block down if its peak
    /// exceeds the ceiling. Returns the limiter's scale factor.
    pub fn process(&self, block: &mut [f32], makeup_db: f32) -> f32 {
        let makeup = db_to_linear(makeup_db);
        if makeup != 1.0 && makeup.is_finite() {
            for s in block.iter_mut() {
                *s *= makeup;
            }
        }
        let p = peak(block);
        if !p.is_finite() {
            block.fill(0.0);
            return 0.0;
        }
        if p > self.ceiling {
            let scale = self.ceiling / p;
            for s in block.iter_mut() {
                *s *= scale;
            }
            scale
        } else {
            1.0
        }
    }
}

/// Multiply `block` by a gain ramped linearly from `from` to `to`.
#[inline]
pub fn apply_ramp(block: &mut [f32], from: f32, to: f32) {
    let n = block.len();
    if n == 0 {
        return;
    }
    let step = (to - from) / n as f32;
    for (i, s) in block.iter_mut().enumerate() {
        *s *= from + step * (i + 1) as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_decays_per_block() {
        let mut click = ClickBurst::new();
        click.trigger(1.0);
        let excitation = [1.0f32; 64];
        let mut block = [0.0f32; 64];
        click.inject(&mut block, &excitation);

        assert!((block[0] - 1.0).abs() < 1e-6);
        assert!(block[CLICK_LEN - 1] < 0.03);
        assert_eq!(block[CLICK_LEN], 0.0);
        assert!((click.level() - CLICK_BLOCK_DECAY).abs() < 1e-6);

        for _ in 0..10 {
            click.inject(&mut [0.0; 64], &excitation);
        }
        assert!(!click.is_pending());
    }

    #[test]
    fn click_envelope_is_exponential() {
        let mut click = ClickBurst::new();
        click.trigger(1.0);
        let mut block = [0.0f32; CLICK_LEN];
        click.inject(&mut block, &[1.0; CLICK_LEN]);
        let one_tau = CLICK_DECAY_SAMPLES as usize;
        assert!((block[one_tau] - (-1.0f32).exp()).abs() < 1e-5);
        assert!(block.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn weaker_trigger_does_not_cut_a_stronger_one() {
        let mut click = ClickBurst::new();
        click.trigger(0.8);
        click.trigger(0.2);
        assert_eq!(click.level(), 0.8);
        click.trigger(f32::NAN);
        assert_eq!(click.level(), 0.8);
    }

    #[test]
    fn agc_moves_toward_target() {
        let mut agc = Agc::new(0.1, true);
        let mut last_rms = 0.0;
        for _ in 0..200 {
            let mut block = vec![0.5f32; 256];
            agc.process(&mut block);
            last_rms = rms(&block);
        }
        assert!(agc.gain() < 0.3);
        assert!(agc.gain() >= AGC_MIN_GAIN);
        assert!(last_rms < 0.15);
    }

    #[test]
    fn agc_correction_is_bounded() {
        let mut agc = Agc::new(0.1, true);
        for _ in 0..2000 {
            let mut block = vec![1e-4f32; 256];
            agc.process(&mut block);
        }
        assert!(agc.gain() <= AGC_MAX_GAIN + 1e-4);
    }

    #[test]
    fn agc_holds_on_silence() {
        let mut agc = Agc::new(0.1, true);
        let mut block = vec![0.0f32; 256];
        agc.process(&mut block);
        assert_eq!(agc.gain(), 1.0);
    }

    #[test]
    fn disabled_agc_is_transparent() {
        let mut agc = Agc::new(0.1, false);
        let mut block = vec![0.5f32; 16];
        agc.process(&mut block);
        assert!(block.iter().all(|&s| s == 0.5));
    }

    #[test]
    fn limiter_scales_whole_block() {
        let limiter = Limiter::new(0.5);
        let mut block = [0.25, -1.0, 0.5];
        let scale = limiter.process(&mut block, 0.0);
        assert!((scale - 0.5).abs() < 1e-6);
        assert_eq!(block, [0.125, -0.5, 0.25]);
    }

    #[test]
    fn limiter_applies_makeup_first() {
        let limiter = Limiter::new(1.0);
        let mut block = [0.1f32; 4];
        limiter.process(&mut block, 6.0206);
        assert!((block[0] - 0.2).abs() < 1e-4);
    }

    #[test]
    fn limiter_silences_non_finite_blocks() {
        let limiter = Limiter::new(0.9);
        let mut block = [0.1, f32::INFINITY, 0.2];
        assert_eq!(limiter.process(&mut block, 0.0), 0.0);
        assert_eq!(block, [0.0; 3]);
    }

    #[test]
    fn ramp_ends_on_target() {
        let mut block = [1.0f32; 4];
        apply_ramp(&mut block, 0.0, 1.0);
        assert_eq!(block, [0.25, 0.5, 0.75, 1.0]);
    }
}
