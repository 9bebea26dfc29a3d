//! Integration tests for sonoscan-config.

use std::sync::Arc;

use sonoscan_config::{ConfigError, SonoscanConfig, get_profile, profile_names};
use sonoscan_engine::SonificationEngine;
use sonoscan_scene::{ColumnAcoustics, GridStore, ScanController};
use tempfile::TempDir;

#[test]
fn save_load_roundtrip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("config.toml");

    let mut config = get_profile("outdoor").unwrap();
    config.grid.mirror_y = true;
    config.save(&path).unwrap();
    assert!(path.exists());

    let loaded = SonoscanConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn load_missing_file_reports_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("absent.toml");
    let err = SonoscanConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
    assert!(err.to_string().contains("absent.toml"));

    assert_eq!(
        SonoscanConfig::load_or_default(&path).unwrap(),
        SonoscanConfig::default()
    );
}

#[test]
fn hand_edited_file_loads() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(
        &path,
        "# tuned for the hallway\n[scan]\nfar_m = 2.5\n\n[audio]\nagc = false\n",
    )
    .unwrap();
    let config = SonoscanConfig::load(&path).unwrap();
    config.validate().unwrap();
    assert_eq!(config.scan.far_m, 2.5);
    assert!(!config.engine_settings().agc);
}

#[test]
fn profiles_drive_scene_and_engine() {
    for name in profile_names() {
        let config = get_profile(name).unwrap();
        let store = Arc::new(GridStore::new(config.fusion_settings()));
        let (mut engine, control) = SonificationEngine::new(config.engine_settings());
        assert_eq!(engine.band_map().num_bands(), store.height());

        let scan = ScanController::new(
            Arc::clone(&store),
            config.scan_settings(),
            move |a: &ColumnAcoustics| control.apply_column(a),
        );
        scan.tick_at(0.0);

        engine.control().start();
        let mut left = vec![0.0; 512];
        let mut right = vec![0.0; 512];
        engine.render(&mut left, &mut right);
        assert!(left.iter().chain(&right).all(|s| s.is_finite()), "profile {name}");
    }
}
