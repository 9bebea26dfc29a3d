//! Configuration for sonoscan.
//!
//! A single TOML document describes the grid, the sweep, the synthesis
//! stage, the band range and the classifier schedule:
//!
//! ```toml
//! [grid]
//! width = 60
//! height = 40
//! mirror_x = false
//!
//! [scan]
//! period_ms = 2000
//! near_m = 0.3
//! far_m = 4.0
//!
//! [audio]
//! sample_rate = 48000
//! fft_size = 1024
//!
//! [bands]
//! min_hz = 100.0
//! max_hz = 8000.0
//!
//! [classifier]
//! min_interval_ms = 200
//! ```
//!
//! # Features
//!
//! - **Loading and saving**: [`SonoscanConfig::load`], [`SonoscanConfig::save`]
//! - **Validation**: [`SonoscanConfig::validate`] reports every problem at once
//! - **Profiles**: built-in `default`, `indoor` and `outdoor` starting points
//! - **Paths**: platform config directory (`std` feature)
//!
//! # Example
//!
//! ```rust
//! use sonoscan_config::{SonoscanConfig, get_profile};
//!
//! let config = get_profile("indoor").unwrap();
//! config.validate().unwrap();
//! let engine = config.engine_settings();
//! assert_eq!(engine.num_bands, config.grid.height);
//! ```

mod config;
mod error;

/// Platform-specific configuration paths.
#[cfg(feature = "std")]
pub mod paths;

/// Built-in profiles.
pub mod profiles;

/// Field validation.
pub mod validation;

pub use config::{
    AudioSection, BandsSection, ClassifierSection, GridSection, ScanSection, SonoscanConfig,
};
pub use error::{ConfigError, Result};
#[cfg(feature = "std")]
pub use paths::{config_path, ensure_user_config_dir, user_config_dir};
pub use profiles::{PROFILE_NAMES, get_profile, profile, profile_names};
pub use validation::{Checker, ValidationError, ValidationResult};
