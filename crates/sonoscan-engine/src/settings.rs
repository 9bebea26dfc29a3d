//! Engine construction parameters.

use sonoscan_core::DEFAULT_GRID_HEIGHT;
use sonoscan_core::noise::DEFAULT_TABLE_LEN;

/// Shortest excitation table, in analysis frames.
pub const MIN_NOISE_FRAMES: usize = 8;

/// Static engine configuration, fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Output sample rate in Hz.
    pub sample_rate: f32,
    /// Analysis frame length `N`; the hop is `N / 4`.
    pub fft_size: usize,
    /// Number of frequency bands (one per grid row).
    pub num_bands: usize,
    /// Lowest band edge in Hz.
    pub min_hz: f32,
    /// Highest band edge in Hz.
    pub max_hz: f32,
    /// Default target boost used by [`apply_column`](crate::ControlSurface::apply_column).
    pub boost_db: f32,
    /// Background attenuation at full distance (`z01 = 1`), in dB.
    pub distance_range_db: f32,
    /// Initial master makeup gain in dB.
    pub master_gain_db: f32,
    /// Whether automatic gain control is applied.
    pub agc: bool,
    /// AGC target RMS.
    pub target_rms: f32,
    /// Linear peak ceiling of the output limiter.
    pub limiter_ceiling: f32,
    /// Resonator level at zero distance.
    pub foreground_level: f32,
    /// Background gain while a foreground resonator sounds.
    pub duck: f32,
    /// Edge strength at which [`apply_column`](crate::ControlSurface::apply_column) fires a click.
    pub edge_threshold: f32,
    /// Delay-line capacity per resonator, in samples.
    pub resonator_capacity: usize,
    /// Excitation noise table length.
    pub noise_len: usize,
    /// Excitation noise seed.
    pub seed: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            fft_size: 1024,
            num_bands: DEFAULT_GRID_HEIGHT,
            min_hz: 100.0,
            max_hz: 8000.0,
            boost_db: 9.0,
            distance_range_db: 12.0,
            master_gain_db: 0.0,
            agc: true,
            target_rms: 0.12,
            limiter_ceiling: 0.89,
            foreground_level: 0.6,
            duck: 0.5,
            edge_threshold: 0.25,
            resonator_capacity: 4096,
            noise_len: DEFAULT_TABLE_LEN,
            seed: 0x5EED_1234,
        }
    }
}

impl EngineSettings {
    /// Copy with out-of-range values pulled back into working ranges.
    pub fn sanitized(&self) -> Self {
        let finite_or = |v: f32, d: f32| if v.is_finite() { v } else { d };
        let defaults = Self::default();
        let fft_size = self.fft_size.max(crate::spectral::MIN_FFT_SIZE);
        Self {
            sample_rate: if self.sample_rate.is_finite() && self.sample_rate >= 1000.0 {
                self.sample_rate
            } else {
                defaults.sample_rate
            },
            fft_size,
            num_bands: self.num_bands.max(1),
            min_hz: finite_or(self.min_hz, defaults.min_hz),
            max_hz: finite_or(self.max_hz, defaults.max_hz),
            boost_db: finite_or(self.boost_db, defaults.boost_db).clamp(0.0, 24.0),
            distance_range_db: finite_or(self.distance_range_db, defaults.distance_range_db)
                .clamp(0.0, 60.0),
            master_gain_db: finite_or(self.master_gain_db, 0.0).clamp(-60.0, 24.0),
            agc: self.agc,
            target_rms: finite_or(self.target_rms, defaults.target_rms).clamp(1e-3, 1.0),
            limiter_ceiling: finite_or(self.limiter_ceiling, defaults.limiter_ceiling)
                .clamp(0.01, 1.0),
            foreground_level: finite_or(self.foreground_level, defaults.foreground_level)
                .clamp(0.0, 1.0),
            duck: finite_or(self.duck, defaults.duck).clamp(0.0, 1.0),
            edge_threshold: finite_or(self.edge_threshold, defaults.edge_threshold)
                .clamp(0.0, 1.0),
            resonator_capacity: self.resonator_capacity.max(sonoscan_core::MIN_DELAY + 2),
            noise_len: self.noise_len.max(MIN_NOISE_FRAMES * fft_size),
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_already_sane() {
        let s = EngineSettings::default();
        assert_eq!(s.sanitized(), s);
    }

    #[test]
    fn sanitize_repairs_garbage() {
        let s = EngineSettings {
            sample_rate: f32::NAN,
            fft_size: 0,
            num_bands: 0,
            boost_db: 100.0,
            limiter_ceiling: -1.0,
            resonator_capacity: 0,
            ..EngineSettings::default()
        }
        .sanitized();
        assert_eq!(s.sample_rate, 48000.0);
        assert!(s.fft_size >= 16);
        assert_eq!(s.num_bands, 1);
        assert_eq!(s.boost_db, 24.0);
        assert_eq!(s.limiter_ceiling, 0.01);
        assert!(s.resonator_capacity > sonoscan_core::MIN_DELAY);
    }

    #[test]
    fn noise_table_spans_several_frames() {
        let s = EngineSettings {
            noise_len: 1,
            fft_size: 2048,
            ..EngineSettings::default()
        }
        .sanitized();
        assert_eq!(s.noise_len, MIN_NOISE_FRAMES * 2048);
        assert!(EngineSettings::default().noise_len >= MIN_NOISE_FRAMES * 1024);
    }
}
