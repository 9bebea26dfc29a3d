//! Built-in configuration profiles.
//!
//! Profiles are partial TOML documents embedded at compile time; anything
//! they leave out keeps its default.

use crate::SonoscanConfig;
use crate::error::{ConfigError, Result};

/// Names of the built-in profiles.
pub static PROFILE_NAMES: &[&str] = &["default", "indoor", "outdoor"];

static PROFILES_TOML: &[(&str, &str)] = &[
    ("default", DEFAULT_PROFILE),
    ("indoor", INDOOR_PROFILE),
    ("outdoor", OUTDOOR_PROFILE),
];

/// Stock settings.
const DEFAULT_PROFILE: &str = "";

/// Rooms and corridors: short range, faster sweep.
const INDOOR_PROFILE: &str = r#"
[scan]
period_ms = 1500
near_m = 0.3
far_m = 3.0
gain_range_db = 30.0

[audio]
distance_range_db = 12.0
foreground_level = 0.6

[classifier]
min_interval_ms = 150
"#;

/// Open space: long range, slower sweep, more distance contrast.
const OUTDOOR_PROFILE: &str = r#"
[scan]
period_ms = 2500
near_m = 0.5
far_m = 8.0
gain_range_db = 36.0
band_smoothing = 0.45

[audio]
master_gain_db = 3.0
distance_range_db = 18.0
foreground_level = 0.7
edge_threshold = 0.3

[classifier]
min_interval_ms = 250
"#;

/// Look up a profile by name (case-insensitive).
pub fn get_profile(name: &str) -> Option<SonoscanConfig> {
    PROFILES_TOML
        .iter()
        .find(|(profile, _)| profile.eq_ignore_ascii_case(name))
        .and_then(|(_, toml)| SonoscanConfig::from_toml(toml).ok())
}

/// Like [`get_profile`] but an unknown name is an error.
pub fn profile(name: &str) -> Result<SonoscanConfig> {
    get_profile(name).ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))
}

/// Names of all profiles.
pub fn profile_names() -> Vec<&'static str> {
    PROFILES_TOML.iter().map(|(name, _)| *name).collect()
}
