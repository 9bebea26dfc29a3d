//! The real-time render loop.
//!
//! One analysis block per hop:
//!
//! ```text
//! pending ─► noise ─► Hann · FFT ─► band gains ─► IFFT ─► mono OLA ─┐
//!                                                                   │ hop
//!            resonators (fresh noise, ramped levels) ──────────────►+
//!                                            click ─► AGC ─► makeup/limit ─► pan ─► stereo ring
//! ```
//!
//! The background is overlap-added before the block-level gains run, so the
//! AGC, the limiter and the pan see finished samples and the limiter's
//! ceiling holds on the output. [`SonificationEngine::render`] pulls from the
//! stereo ring and renders blocks on demand until the request is filled.
//!
//! Nothing here locks, allocates or logs once construction is done.

use std::sync::Arc;

use sonoscan_core::{
    BandMap, NoiseTable, Resonator, ShapeId, SmoothedParam, clamp01, constant_power_pan,
    db_to_linear,
};

use crate::control::ControlSurface;
use crate::dynamics::{Agc, CLICK_LEN, ClickBurst, Limiter, apply_ramp};
use crate::ola::{OlaRing, StereoOla};
use crate::settings::EngineSettings;
use crate::spectral::SpectralShaper;
use crate::staging::{PendingParams, Scalars};
use crate::stats::{EngineStats, StatsCounters};

/// Per-block retain factor of the band envelope and target mask.
pub const SPECTRUM_SMOOTHING: f32 = 0.85;
/// Per-block retain factor of resonator levels.
pub const LEVEL_RAMP: f32 = 0.92;
/// Level below which a released family is cleared.
pub const LEVEL_FLOOR: f32 = 1e-4;
/// Per-block retain factor of pan, background and duck gains.
pub const GAIN_SMOOTHING: f32 = 0.85;
/// Scale of the noise driving the resonators.
pub const FOREGROUND_DRIVE: f32 = 0.3;

/// State shared between the engine and its control surfaces.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) pending: PendingParams,
    pub(crate) stats: StatsCounters,
}

#[derive(Debug, Clone)]
struct Voice {
    resonator: Resonator,
    level: SmoothedParam,
    active: bool,
}

impl Voice {
    fn new(shape: ShapeId, capacity: usize) -> Self {
        Self {
            resonator: Resonator::for_shape(shape, capacity),
            level: SmoothedParam::with_factor(0.0, LEVEL_RAMP),
            active: false,
        }
    }

    fn silence(&mut self) {
        self.resonator.clear();
        self.level.set_immediate(0.0);
    }
}

/// Spectral resynthesis engine.
///
/// Owned by the audio thread. Create with [`new`](Self::new), hand the
/// returned [`ControlSurface`] to the scan side, call
/// [`render`](Self::render) or [`render_interleaved`](Self::render_interleaved)
/// from the audio callback.
///
/// ```rust
/// use sonoscan_engine::{EngineSettings, SonificationEngine};
///
/// let (mut engine, control) = SonificationEngine::new(EngineSettings::default());
/// control.update_envelope(&[1.0; 40]);
/// control.start();
///
/// let mut left = [0.0f32; 512];
/// let mut right = [0.0f32; 512];
/// engine.render(&mut left, &mut right);
/// assert!(left.iter().chain(&right).all(|s| s.is_finite()));
/// ```
pub struct SonificationEngine {
    settings: EngineSettings,
    shared: Arc<Shared>,
    band_map: BandMap,
    shaper: SpectralShaper,
    noise: NoiseTable,

    excitation: Vec<f32>,
    frame: Vec<f32>,
    band_gains: Vec<f32>,
    bin_gains: Vec<f32>,
    staged: Vec<f32>,
    envelope: Vec<SmoothedParam>,
    mask: Vec<SmoothedParam>,
    boost: f32,

    voices: [Voice; 3],
    background: OlaRing,
    block: Vec<f32>,
    foreground: Vec<f32>,
    click_noise: [f32; CLICK_LEN],

    background_gain: SmoothedParam,
    duck: SmoothedParam,
    pan: SmoothedParam,
    master_gain_db: f32,
    agc: Agc,
    limiter: Limiter,
    click: ClickBurst,

    output: StereoOla,
    left: Vec<f32>,
    right: Vec<f32>,
    scratch_left: Vec<f32>,
    scratch_right: Vec<f32>,
    was_running: bool,
    control: ControlSurface,
}

impl SonificationEngine {
    /// Build an engine and its control surface.
    ///
    /// Settings are [sanitized](EngineSettings::sanitized) first. The
    /// engine starts stopped.
    pub fn new(settings: EngineSettings) -> (Self, ControlSurface) {
        let settings = settings.sanitized();
        let shaper = SpectralShaper::new(settings.fft_size);
        let n = shaper.fft_size();
        let hop = shaper.hop();
        let bands = settings.num_bands;
        let band_map = BandMap::new(
            settings.sample_rate,
            n,
            bands,
            settings.min_hz,
            settings.max_hz,
        );

        let initial = Scalars {
            pan: 0.0,
            distance: 0.0,
            master_gain_db: settings.master_gain_db,
        };
        let shared = Arc::new(Shared {
            pending: PendingParams::new(bands, initial, (band_map.min_hz(), band_map.max_hz())),
            stats: StatsCounters::default(),
        });
        let control = ControlSurface::new(Arc::clone(&shared), band_map.clone(), &settings);

        let capacity = settings.resonator_capacity;
        let voices = [
            Voice::new(ShapeId::Sphere, capacity),
            Voice::new(ShapeId::Triangle, capacity),
            Voice::new(ShapeId::Cube, capacity),
        ];

        tracing::info!(
            sample_rate = settings.sample_rate,
            fft_size = n,
            hop,
            bands,
            min_hz = band_map.min_hz(),
            max_hz = band_map.max_hz(),
            "sonification engine ready"
        );

        let engine = Self {
            noise: NoiseTable::new(settings.noise_len, settings.seed),
            excitation: vec![0.0; n],
            frame: vec![0.0; n],
            band_gains: vec![0.0; bands],
            bin_gains: vec![0.0; shaper.num_bins()],
            staged: vec![0.0; bands],
            envelope: vec![SmoothedParam::with_factor(0.0, SPECTRUM_SMOOTHING); bands],
            mask: vec![SmoothedParam::with_factor(0.0, SPECTRUM_SMOOTHING); bands],
            boost: 1.0,
            voices,
            background: OlaRing::new(2 * n),
            block: vec![0.0; hop],
            foreground: vec![0.0; hop],
            click_noise: [0.0; CLICK_LEN],
            background_gain: SmoothedParam::with_factor(1.0, GAIN_SMOOTHING),
            duck: SmoothedParam::with_factor(1.0, GAIN_SMOOTHING),
            pan: SmoothedParam::with_factor(0.0, GAIN_SMOOTHING),
            master_gain_db: settings.master_gain_db,
            agc: Agc::new(settings.target_rms, settings.agc),
            limiter: Limiter::new(settings.limiter_ceiling),
            click: ClickBurst::new(),
            output: StereoOla::new(2 * n, hop),
            left: vec![0.0; hop],
            right: vec![0.0; hop],
            scratch_left: vec![0.0; hop],
            scratch_right: vec![0.0; hop],
            was_running: false,
            control: control.clone(),
            band_map,
            shaper,
            shared,
            settings,
        };
        (engine, control)
    }

    /// Another handle to this engine's control surface.
    pub fn control(&self) -> ControlSurface {
        self.control.clone()
    }

    /// Effective (sanitized) settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Render-side band map.
    pub fn band_map(&self) -> &BandMap {
        &self.band_map
    }

    /// Frame length `N`.
    pub fn fft_size(&self) -> usize {
        self.shaper.fft_size()
    }

    /// Samples produced per analysis block.
    pub fn hop(&self) -> usize {
        self.shaper.hop()
    }

    /// Whether the engine is started.
    pub fn is_running(&self) -> bool {
        self.shared.pending.is_running()
    }

    /// Engine counters.
    pub fn stats(&self) -> EngineStats {
        self.shared.stats.snapshot()
    }

    /// Current ramped level of each family (sphere, triangle, cube).
    pub fn family_levels(&self) -> [f32; 3] {
        [
            self.voices[0].level.get(),
            self.voices[1].level.get(),
            self.voices[2].level.get(),
        ]
    }

    /// Largest smoothed target-mask value across bands.
    pub fn mask_peak(&self) -> f32 {
        self.mask.iter().fold(0.0f32, |acc, m| acc.max(m.get()))
    }

    /// Fill `left` and `right` completely.
    ///
    /// Renders `min(left.len(), right.len())` stereo frames; any excess in
    /// the longer slice is zeroed. Outputs silence while stopped.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        let n = left.len().min(right.len());
        left[n..].fill(0.0);
        right[n..].fill(0.0);

        if !self.shared.pending.is_running() {
            if self.was_running {
                self.reset();
                self.was_running = false;
            }
            left[..n].fill(0.0);
            right[..n].fill(0.0);
            self.shared.stats.silent_call();
            return;
        }
        self.was_running = true;

        let mut filled = 0;
        while filled < n {
            if self.output.ready() == 0 {
                self.render_block();
            }
            filled += self
                .output
                .pull(&mut left[filled..n], &mut right[filled..n]);
        }
    }

    /// Fill an interleaved buffer of `channels` channels.
    ///
    /// Channel 0 is left and channel 1 right; further channels are zeroed.
    /// A mono buffer receives the average of left and right. A trailing
    /// partial frame is zeroed.
    pub fn render_interleaved(&mut self, out: &mut [f32], channels: usize) {
        if channels == 0 {
            out.fill(0.0);
            return;
        }
        let frames = out.len() / channels;
        out[frames * channels..].fill(0.0);

        let mut left = std::mem::take(&mut self.scratch_left);
        let mut right = std::mem::take(&mut self.scratch_right);
        let chunk = left.len().max(1);
        let mut done = 0;
        while done < frames {
            let n = (frames - done).min(chunk);
            self.render(&mut left[..n], &mut right[..n]);
            let dest = &mut out[done * channels..(done + n) * channels];
            for (frame, (&l, &r)) in dest.chunks_exact_mut(channels).zip(left.iter().zip(&right)) {
                if channels == 1 {
                    frame[0] = 0.5 * (l + r);
                } else {
                    frame[0] = l;
                    frame[1] = r;
                    frame[2..].fill(0.0);
                }
            }
            done += n;
        }
        self.scratch_left = left;
        self.scratch_right = right;
    }

    /// Clear all audio state: rings, resonators, AGC, pending click.
    pub fn reset(&mut self) {
        self.background.clear();
        self.output.clear();
        for voice in &mut self.voices {
            voice.silence();
        }
        self.agc.reset();
        self.click.reset();
    }

    fn drain_pending(&mut self) {
        let pending = &self.shared.pending;

        if let Some((lo, hi)) = pending.range.take() {
            self.band_map.reconfigure(lo, hi);
        }
        if pending.spectrum.take_envelope(&mut self.staged) {
            for (param, &g) in self.envelope.iter_mut().zip(&self.staged) {
                param.set_target(g);
            }
        }
        if let Some(boost_db) = pending.spectrum.take_mask(&mut self.staged) {
            for (param, &m) in self.mask.iter_mut().zip(&self.staged) {
                param.set_target(m);
            }
            self.boost = db_to_linear(boost_db);
        }
        if let Some(scalars) = pending.scalars.take() {
            self.pan.set_target(scalars.pan);
            let distance = clamp01(scalars.distance);
            self.background_gain
                .set_target(db_to_linear(-self.settings.distance_range_db * distance));
            self.master_gain_db = scalars.master_gain_db;
        }
        for (voice, slot) in self.voices.iter_mut().zip(&pending.families) {
            if let Some(params) = slot.take() {
                if params.active {
                    voice.resonator.configure(params.delay, params.coefficient);
                    voice.level.set_target(params.level);
                } else {
                    voice.level.set_target(0.0);
                }
                voice.active = params.active;
            }
        }
    }

    fn render_block(&mut self) {
        self.drain_pending();
        let hop = self.block.len();

        // Background: shaped noise, overlap-added.
        self.noise.fill(&mut self.excitation);
        for (b, gain) in self.band_gains.iter_mut().enumerate() {
            let env = self.envelope[b].advance();
            let mask = self.mask[b].advance();
            *gain = env * (1.0 + (self.boost - 1.0) * mask);
        }
        for (g, w) in self.bin_gains.iter_mut().zip(self.band_map.bin_weights()) {
            *g = w.apply(&self.band_gains);
        }
        self.shaper
            .shape(&self.excitation, &self.bin_gains, &mut self.frame);
        self.background.add(&self.frame);
        self.background.commit(hop);
        self.background.pull(&mut self.block);

        // Foreground: resonators on fresh excitation.
        let present = self.render_foreground();
        self.duck
            .set_target(if present { self.settings.duck } else { 1.0 });
        let from = self.background_gain.get() * self.duck.get();
        let to = self.background_gain.advance() * self.duck.advance();
        apply_ramp(&mut self.block, from, to);
        for (s, &f) in self.block.iter_mut().zip(&self.foreground) {
            *s += f;
        }

        let strength = self.shared.pending.edge.take();
        if strength > 0.0 {
            self.click.trigger(strength);
        }
        if self.click.is_pending() {
            self.noise.fill(&mut self.click_noise);
        }
        self.click.inject(&mut self.block, &self.click_noise);

        self.agc.process(&mut self.block);
        self.limiter.process(&mut self.block, self.master_gain_db);

        let (l0, r0) = constant_power_pan(self.pan.get());
        let (l1, r1) = constant_power_pan(self.pan.advance());
        let step = 1.0 / hop as f32;
        for (i, &s) in self.block.iter().enumerate() {
            let t = (i + 1) as f32 * step;
            self.left[i] = s * (l0 + (l1 - l0) * t);
            self.right[i] = s * (r0 + (r1 - r0) * t);
        }
        self.output.add(&self.left, &self.right);
        self.shared.stats.block_rendered();
    }

    /// Mix every sounding family into `self.foreground`. Returns whether
    /// any family sounded.
    fn render_foreground(&mut self) -> bool {
        self.foreground.fill(0.0);
        let hop = self.foreground.len();
        let step = 1.0 / hop as f32;
        let mut present = false;

        for voice in &mut self.voices {
            let from = voice.level.get();
            let to = voice.level.advance();
            if !voice.active && to < LEVEL_FLOOR {
                if from > 0.0 {
                    voice.silence();
                }
                continue;
            }
            present = true;
            for (i, out) in self.foreground.iter_mut().enumerate() {
                let x = self.noise.next_sample() * FOREGROUND_DRIVE;
                let level = from + (to - from) * (i + 1) as f32 * step;
                match voice.resonator.process(x) {
                    Some(y) => *out += level * y,
                    None => self.shared.stats.instability_healed(),
                }
            }
        }
        present
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running() -> (SonificationEngine, ControlSurface) {
        let (engine, control) = SonificationEngine::new(EngineSettings::default());
        control.start();
        (engine, control)
    }

    #[test]
    fn silent_when_stopped() {
        let (mut engine, control) = SonificationEngine::new(EngineSettings::default());
        control.update_envelope(&[1.0; 40]);
        let mut l = [1.0f32; 300];
        let mut r = [1.0f32; 300];
        engine.render(&mut l, &mut r);
        assert!(l.iter().chain(&r).all(|&s| s == 0.0));
        assert_eq!(engine.stats().blocks_rendered, 0);
        assert_eq!(engine.stats().silent_calls, 1);
    }

    #[test]
    fn fills_exactly_the_requested_count() {
        let (mut engine, control) = running();
        control.update_envelope(&[1.0; 40]);
        for len in [1usize, 7, 255, 256, 257, 1000] {
            let mut l = vec![f32::NAN; len];
            let mut r = vec![f32::NAN; len];
            engine.render(&mut l, &mut r);
            assert!(l.iter().chain(&r).all(|s| s.is_finite()), "len {}", len);
        }
    }

    #[test]
    fn mismatched_slices_zero_the_excess() {
        let (mut engine, control) = running();
        control.update_envelope(&[1.0; 40]);
        let mut l = vec![f32::NAN; 100];
        let mut r = vec![f32::NAN; 60];
        engine.render(&mut l, &mut r);
        assert!(l[60..].iter().all(|&s| s == 0.0));
        assert!(l[..60].iter().all(|s| s.is_finite()));
    }

    #[test]
    fn envelope_produces_sound() {
        let (mut engine, control) = running();
        control.update_envelope(&[1.0; 40]);
        let mut l = vec![0.0f32; 4096];
        let mut r = vec![0.0f32; 4096];
        engine.render(&mut l, &mut r);
        let energy: f32 = l[2048..].iter().map(|s| s * s).sum();
        assert!(energy > 1e-3);
        assert!(engine.stats().blocks_rendered >= 16);
    }

    #[test]
    fn output_respects_the_ceiling() {
        let (mut engine, control) = running();
        control.update_envelope(&[1.0; 40]);
        control.set_master_gain_db(24.0);
        let mut mask = vec![0.0; 40];
        mask[10..20].fill(1.0);
        control.set_target_bands(&mask, ShapeId::Sphere, 12.0);
        let mut l = vec![0.0f32; 8192];
        let mut r = vec![0.0f32; 8192];
        engine.render(&mut l, &mut r);
        let ceiling = engine.settings().limiter_ceiling;
        assert!(l.iter().chain(&r).all(|s| s.abs() <= ceiling + 1e-5));
    }

    #[test]
    fn pan_hard_left_value_silences_left() {
        // pan = -1 gives θ = 0: gL = sin 0 = 0
        let (mut engine, control) = running();
        control.update_envelope(&[1.0; 40]);
        control.set_pan(-1.0);
        let mut l = vec![0.0f32; 16384];
        let mut r = vec![0.0f32; 16384];
        engine.render(&mut l, &mut r);
        let tail = 12288..;
        let el: f32 = l[tail.clone()].iter().map(|s| s * s).sum();
        let er: f32 = r[tail].iter().map(|s| s * s).sum();
        assert!(el < er * 1e-3, "left {} right {}", el, er);
    }

    #[test]
    fn interleaved_layouts() {
        let (mut engine, control) = running();
        control.update_envelope(&[1.0; 40]);
        control.set_pan(0.5);

        let mut stereo = vec![f32::NAN; 1001];
        engine.render_interleaved(&mut stereo, 2);
        assert_eq!(stereo[1000], 0.0);
        assert!(stereo.iter().all(|s| s.is_finite()));

        let mut quad = vec![f32::NAN; 400];
        engine.render_interleaved(&mut quad, 4);
        assert!(quad.chunks(4).all(|f| f[2] == 0.0 && f[3] == 0.0));

        let mut mono = vec![f32::NAN; 300];
        engine.render_interleaved(&mut mono, 1);
        assert!(mono.iter().all(|s| s.is_finite()));

        let mut none = vec![1.0f32; 8];
        engine.render_interleaved(&mut none, 0);
        assert!(none.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn stop_resets_audio_state() {
        let (mut engine, control) = running();
        control.update_envelope(&[1.0; 40]);
        control.set_target_bands(&[1.0; 40], ShapeId::Cube, 6.0);
        let mut l = vec![0.0f32; 4096];
        let mut r = vec![0.0f32; 4096];
        engine.render(&mut l, &mut r);
        assert!(engine.family_levels()[2] > 0.0);

        control.stop();
        engine.render(&mut l, &mut r);
        assert_eq!(engine.family_levels(), [0.0; 3]);
        assert!(l.iter().all(|&s| s == 0.0));
    }
}
