//! The configuration document.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sonoscan_engine::EngineSettings;
use sonoscan_scene::{FusionSettings, Orientation, ScanSettings};

use crate::error::{ConfigError, Result};
use crate::validation::{Checker, ValidationResult};

/// Grid geometry and classifier alignment (`[grid]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSection {
    /// Columns (scan positions).
    pub width: usize,
    /// Rows (one frequency band each).
    pub height: usize,
    /// Flip classifier columns.
    pub mirror_x: bool,
    /// Flip classifier rows.
    pub mirror_y: bool,
    /// Quarter-turn the classifier image clockwise.
    pub rotate_cw: bool,
}

impl Default for GridSection {
    fn default() -> Self {
        let fusion = FusionSettings::default();
        Self {
            width: fusion.width,
            height: fusion.height,
            mirror_x: fusion.orientation.mirror_x,
            mirror_y: fusion.orientation.mirror_y,
            rotate_cw: fusion.orientation.rotate_cw,
        }
    }
}

/// Sweep timing and depth mapping (`[scan]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSection {
    /// One left-to-right sweep, milliseconds.
    pub period_ms: u64,
    /// Scan thread tick rate.
    pub tick_rate_hz: f32,
    /// Depth heard at full level, meters.
    pub near_m: f32,
    /// Depth heard at minimum level, meters.
    pub far_m: f32,
    /// Attenuation at `far_m`, dB.
    pub gain_range_db: f32,
    /// Across-band smoothing decay.
    pub band_smoothing: f32,
}

impl Default for ScanSection {
    fn default() -> Self {
        let scan = ScanSettings::default();
        Self {
            period_ms: scan.period.as_millis() as u64,
            tick_rate_hz: scan.tick_rate_hz,
            near_m: scan.near_m,
            far_m: scan.far_m,
            gain_range_db: scan.gain_range_db,
            band_smoothing: scan.band_smoothing,
        }
    }
}

/// Synthesis and output stage (`[audio]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSection {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Analysis frame length, a power of two.
    pub fft_size: usize,
    /// Makeup gain in dB.
    pub master_gain_db: f32,
    /// Automatic gain control on/off.
    pub agc: bool,
    /// AGC target RMS.
    pub target_rms: f32,
    /// Limiter peak ceiling, linear.
    pub limiter_ceiling: f32,
    /// Boost of the target bands, dB.
    pub boost_db: f32,
    /// Background attenuation at full distance, dB.
    pub distance_range_db: f32,
    /// Resonator level at zero distance.
    pub foreground_level: f32,
    /// Background gain under a sounding resonator.
    pub duck: f32,
    /// Edge strength that fires a click.
    pub edge_threshold: f32,
}

impl Default for AudioSection {
    fn default() -> Self {
        let e = EngineSettings::default();
        Self {
            sample_rate: e.sample_rate as u32,
            fft_size: e.fft_size,
            master_gain_db: e.master_gain_db,
            agc: e.agc,
            target_rms: e.target_rms,
            limiter_ceiling: e.limiter_ceiling,
            boost_db: e.boost_db,
            distance_range_db: e.distance_range_db,
            foreground_level: e.foreground_level,
            duck: e.duck,
            edge_threshold: e.edge_threshold,
        }
    }
}

/// Frequency range of the band map (`[bands]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandsSection {
    /// Lowest band edge, Hz.
    pub min_hz: f32,
    /// Highest band edge, Hz.
    pub max_hz: f32,
}

impl Default for BandsSection {
    fn default() -> Self {
        let e = EngineSettings::default();
        Self {
            min_hz: e.min_hz,
            max_hz: e.max_hz,
        }
    }
}

/// Segmentation scheduling (`[classifier]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSection {
    /// Minimum spacing between classification passes, milliseconds.
    pub min_interval_ms: u64,
}

impl Default for ClassifierSection {
    fn default() -> Self {
        Self {
            min_interval_ms: 200,
        }
    }
}

/// Complete sonoscan configuration.
///
/// Every section and field has a default, so a file only needs to name
/// what it changes:
///
/// ```rust
/// use sonoscan_config::SonoscanConfig;
///
/// let config = SonoscanConfig::from_toml("[scan]\nperiod_ms = 1500\n").unwrap();
/// assert_eq!(config.scan.period_ms, 1500);
/// assert_eq!(config.grid.width, 60);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SonoscanConfig {
    /// `[grid]`
    pub grid: GridSection,
    /// `[scan]`
    pub scan: ScanSection,
    /// `[audio]`
    pub audio: AudioSection,
    /// `[bands]`
    pub bands: BandsSection,
    /// `[classifier]`
    pub classifier: ClassifierSection,
}

impl SonoscanConfig {
    /// Load from a TOML file. The result is not validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load from `path` if it exists, otherwise the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save as TOML, creating the parent directory when needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Serialize to pretty TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every field, reporting all problems.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut c = Checker::new();
        let grid = &self.grid;
        c.range("grid.width", grid.width as f64, 2.0, 1024.0);
        c.range("grid.height", grid.height as f64, 1.0, 256.0);

        let scan = &self.scan;
        c.range("scan.period_ms", scan.period_ms as f64, 100.0, 60_000.0);
        c.range("scan.tick_rate_hz", f64::from(scan.tick_rate_hz), 1.0, 1000.0);
        c.range("scan.near_m", f64::from(scan.near_m), 0.0, 100.0);
        c.range("scan.far_m", f64::from(scan.far_m), 0.0, 100.0);
        c.ordered("scan.near_m", f64::from(scan.near_m), "scan.far_m", f64::from(scan.far_m));
        c.range("scan.gain_range_db", f64::from(scan.gain_range_db), 0.0, 120.0);
        c.range("scan.band_smoothing", f64::from(scan.band_smoothing), 0.0, 0.99);

        let audio = &self.audio;
        c.range("audio.sample_rate", f64::from(audio.sample_rate), 8000.0, 192_000.0);
        c.range("audio.fft_size", audio.fft_size as f64, 64.0, 16384.0);
        c.require(
            audio.fft_size.is_power_of_two(),
            "audio.fft_size",
            "must be a power of two",
        );
        c.range("audio.master_gain_db", f64::from(audio.master_gain_db), -60.0, 24.0);
        c.range("audio.target_rms", f64::from(audio.target_rms), 0.001, 1.0);
        c.range("audio.limiter_ceiling", f64::from(audio.limiter_ceiling), 0.01, 1.0);
        c.range("audio.boost_db", f64::from(audio.boost_db), 0.0, 24.0);
        c.range("audio.distance_range_db", f64::from(audio.distance_range_db), 0.0, 60.0);
        c.range("audio.foreground_level", f64::from(audio.foreground_level), 0.0, 1.0);
        c.range("audio.duck", f64::from(audio.duck), 0.0, 1.0);
        c.range("audio.edge_threshold", f64::from(audio.edge_threshold), 0.0, 1.0);

        let bands = &self.bands;
        let nyquist = f64::from(audio.sample_rate) / 2.0;
        c.range("bands.min_hz", f64::from(bands.min_hz), 1.0, 96_000.0);
        c.range("bands.max_hz", f64::from(bands.max_hz), 1.0, 96_000.0);
        c.ordered("bands.min_hz", f64::from(bands.min_hz), "bands.max_hz", f64::from(bands.max_hz));
        c.ordered("bands.max_hz", f64::from(bands.max_hz), "nyquist", nyquist + 1e-3);

        c.range(
            "classifier.min_interval_ms",
            self.classifier.min_interval_ms as f64,
            0.0,
            10_000.0,
        );
        c.finish()
    }

    /// Grid store settings.
    pub fn fusion_settings(&self) -> FusionSettings {
        FusionSettings {
            width: self.grid.width,
            height: self.grid.height,
            orientation: Orientation {
                mirror_x: self.grid.mirror_x,
                mirror_y: self.grid.mirror_y,
                rotate_cw: self.grid.rotate_cw,
            },
        }
    }

    /// Scan controller settings.
    pub fn scan_settings(&self) -> ScanSettings {
        ScanSettings {
            period: Duration::from_millis(self.scan.period_ms),
            tick_rate_hz: self.scan.tick_rate_hz,
            near_m: self.scan.near_m,
            far_m: self.scan.far_m,
            gain_range_db: self.scan.gain_range_db,
            band_smoothing: self.scan.band_smoothing,
        }
    }

    /// Engine settings. One band per grid row.
    pub fn engine_settings(&self) -> EngineSettings {
        let audio = &self.audio;
        EngineSettings {
            sample_rate: audio.sample_rate as f32,
            fft_size: audio.fft_size,
            num_bands: self.grid.height,
            min_hz: self.bands.min_hz,
            max_hz: self.bands.max_hz,
            boost_db: audio.boost_db,
            distance_range_db: audio.distance_range_db,
            master_gain_db: audio.master_gain_db,
            agc: audio.agc,
            target_rms: audio.target_rms,
            limiter_ceiling: audio.limiter_ceiling,
            foreground_level: audio.foreground_level,
            duck: audio.duck,
            edge_threshold: audio.edge_threshold,
            ..EngineSettings::default()
        }
    }

    /// Minimum spacing between classification passes.
    pub fn classify_interval(&self) -> Duration {
        Duration::from_millis(self.classifier.min_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;

    #[test]
    fn defaults_validate() {
        SonoscanConfig::default().validate().unwrap();
    }

    #[test]
    fn defaults_match_the_crates() {
        let config = SonoscanConfig::default();
        assert_eq!(config.fusion_settings(), FusionSettings::default());
        assert_eq!(config.scan_settings(), ScanSettings::default());
        assert_eq!(config.engine_settings(), EngineSettings::default());
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(SonoscanConfig::from_toml("").unwrap(), SonoscanConfig::default());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = SonoscanConfig::from_toml(
            r#"
[grid]
height = 24
mirror_x = true

[bands]
max_hz = 6000.0
"#,
        )
        .unwrap();
        assert_eq!(config.grid.height, 24);
        assert_eq!(config.grid.width, 60);
        assert!(config.fusion_settings().orientation.mirror_x);
        assert_eq!(config.engine_settings().num_bands, 24);
        assert_eq!(config.engine_settings().max_hz, 6000.0);
        assert_eq!(config.bands.min_hz, 100.0);
    }

    #[test]
    fn wrong_type_is_a_parse_error() {
        let err = SonoscanConfig::from_toml("[scan]\nperiod_ms = \"slow\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn toml_round_trip() {
        let mut config = SonoscanConfig::default();
        config.scan.period_ms = 1234;
        config.audio.agc = false;
        let text = config.to_toml().unwrap();
        assert!(text.contains("[classifier]"));
        assert_eq!(SonoscanConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn validate_reports_every_problem() {
        let mut config = SonoscanConfig::default();
        config.scan.period_ms = 10;
        config.scan.near_m = 5.0;
        config.audio.fft_size = 1000;
        config.bands.min_hz = 9000.0;
        let Err(ValidationError::Multiple(errors)) = config.validate() else {
            panic!("expected several errors");
        };
        let text: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert!(text.iter().any(|e| e.contains("scan.period_ms")), "{text:?}");
        assert!(text.iter().any(|e| e.contains("scan.near_m")), "{text:?}");
        assert!(text.iter().any(|e| e.contains("power of two")), "{text:?}");
        assert!(text.iter().any(|e| e.contains("bands.min_hz")), "{text:?}");
    }

    #[test]
    fn band_range_must_fit_below_nyquist() {
        let mut config = SonoscanConfig::default();
        config.audio.sample_rate = 16000;
        config.bands.max_hz = 12000.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ValidationError::Unordered { ref high, .. } if high == "nyquist"));
    }

    #[test]
    fn nan_fields_are_rejected() {
        let mut config = SonoscanConfig::default();
        config.audio.duck = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn classify_interval_in_millis() {
        let mut config = SonoscanConfig::default();
        config.classifier.min_interval_ms = 350;
        assert_eq!(config.classify_interval(), Duration::from_millis(350));
    }
}
