//! Shared command helpers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use sonoscan_config::{SonoscanConfig, config_path, profile};
use sonoscan_engine::{ControlSurface, SonificationEngine};
use sonoscan_scene::{ColumnAcoustics, GridStore, ScanController, SyntheticScene};

/// Where the configuration comes from, as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    /// Explicit `--config` file.
    pub path: Option<PathBuf>,
    /// Explicit `--profile`.
    pub profile: Option<String>,
}

impl ConfigSource {
    /// Resolve without validating.
    ///
    /// `--config` and `--profile` are exclusive; with neither, the user
    /// config file is used when present, otherwise the defaults.
    pub fn resolve(&self) -> anyhow::Result<SonoscanConfig> {
        match (&self.path, &self.profile) {
            (Some(_), Some(_)) => anyhow::bail!("Use either --config or --profile, not both"),
            (Some(path), None) => SonoscanConfig::load(path)
                .with_context(|| format!("loading {}", path.display())),
            (None, Some(name)) => Ok(profile(name)?),
            (None, None) => {
                let path = config_path();
                let config = SonoscanConfig::load_or_default(&path)
                    .with_context(|| format!("loading {}", path.display()))?;
                tracing::debug!(path = %path.display(), exists = path.exists(), "user config");
                Ok(config)
            }
        }
    }

    /// Resolve and validate.
    pub fn load(&self) -> anyhow::Result<SonoscanConfig> {
        let config = self.resolve()?;
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

/// Scene, grid store, scan controller and control surface wired together.
///
/// The engine is returned separately so it can move to the audio thread.
pub struct Pipeline {
    /// The scene standing in for the sensors.
    pub scene: SyntheticScene,
    /// Fused depth and class grids.
    pub store: Arc<GridStore>,
    /// Sweep driver; its sink applies columns to `control`.
    pub scan: ScanController,
    /// Engine control handle.
    pub control: ControlSurface,
    depth: Vec<f32>,
}

impl Pipeline {
    /// Build from a validated config.
    pub fn build(config: &SonoscanConfig, scene: SyntheticScene) -> (Self, SonificationEngine) {
        let store = Arc::new(GridStore::new(config.fusion_settings()));
        let (engine, control) = SonificationEngine::new(config.engine_settings());
        let sink = control.clone();
        let scan = ScanController::new(
            Arc::clone(&store),
            config.scan_settings(),
            move |acoustics: &ColumnAcoustics| sink.apply_column(acoustics),
        );
        let pipeline = Self {
            scene,
            store,
            scan,
            control,
            depth: Vec::new(),
        };
        (pipeline, engine)
    }

    /// Render the scene's depth frame at `t` and hand it to the store.
    pub fn ingest_depth(&mut self, t: f64) {
        self.scene.render_depth_into(t, &mut self.depth);
        self.store
            .ingest_depth_frame(&self.scene.depth_image(&self.depth));
    }

    /// Classify the scene at `t` synchronously.
    pub fn ingest_classes(&self, t: f64) {
        self.store
            .ingest_classification_frame(&self.scene.render_classes(t).as_image());
    }
}

/// Retune the config to the rate the output device actually runs at.
///
/// Band edges and resonator delays are derived from the sample rate, so the
/// engine must be built at the device rate. Returns whether it changed.
pub fn match_device_rate(config: &mut SonoscanConfig, actual_rate: u32) -> bool {
    if actual_rate == 0 || actual_rate == config.audio.sample_rate {
        return false;
    }
    tracing::warn!(
        requested = config.audio.sample_rate,
        actual = actual_rate,
        "device sample rate differs from config, using the device rate"
    );
    config.audio.sample_rate = actual_rate;
    true
}

/// Level in dBFS, floored at -120.
pub fn dbfs(linear: f32) -> f32 {
    if linear > 0.0 {
        (20.0 * linear.log10()).max(-120.0)
    } else {
        -120.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_and_profile_are_exclusive() {
        let source = ConfigSource {
            path: Some(PathBuf::from("x.toml")),
            profile: Some("indoor".into()),
        };
        assert!(source.resolve().is_err());
    }

    #[test]
    fn profile_source_resolves() {
        let source = ConfigSource {
            path: None,
            profile: Some("outdoor".into()),
        };
        assert_eq!(source.load().unwrap().scan.far_m, 8.0);
    }

    #[test]
    fn unknown_profile_fails() {
        let source = ConfigSource {
            path: None,
            profile: Some("cave".into()),
        };
        assert!(source.load().is_err());
    }

    #[test]
    fn pipeline_feeds_the_engine() {
        let config = SonoscanConfig::default();
        let (mut pipeline, mut engine) =
            Pipeline::build(&config, SyntheticScene::demo(64, 48));
        pipeline.ingest_depth(0.0);
        pipeline.ingest_classes(0.0);
        // halfway through the default two second sweep
        let column = pipeline.scan.tick_at(1.0);
        assert!((29..=30).contains(&column), "column {column}");
        pipeline.control.start();
        let mut left = vec![0.0; 1024];
        let mut right = vec![0.0; 1024];
        engine.render(&mut left, &mut right);
        assert!(left.iter().chain(&right).any(|&s| s != 0.0));
    }

    #[test]
    fn engine_follows_the_device_rate() {
        let mut config = SonoscanConfig::default();
        let current_rate = config.audio.sample_rate;
        assert!(!match_device_rate(&mut config, current_rate));
        assert!(!match_device_rate(&mut config, 0));

        assert!(match_device_rate(&mut config, 44100));
        assert_eq!(config.engine_settings().sample_rate, 44100.0);
        let (_, engine) = Pipeline::build(&config, SyntheticScene::demo(16, 12));
        assert_eq!(engine.settings().sample_rate, 44100.0);
    }

    #[test]
    fn dbfs_floor() {
        assert_eq!(dbfs(0.0), -120.0);
        assert!((dbfs(1.0)).abs() < 1e-6);
    }
}
