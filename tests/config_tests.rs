// SPDX-License-Identifier: GPL-3.0-only

//! Configuration loading tests

use rollcall::config::PipelineConfig;
use rollcall::constants::defaults;
use rollcall::errors::ConfigError;

#[test]
fn test_default_values() {
    let config = PipelineConfig::default();
    assert_eq!(config.sample_interval, 100);
    assert_eq!(config.resize_divisor, 2);
    assert_eq!(config.fill_threshold, 30);
    assert_eq!(config.label_plate_char_width_px, 10.0);
    assert_eq!(config.display_tick_ms, defaults::DISPLAY_TICK_MS);
}

#[test]
fn test_saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    let config = PipelineConfig {
        sample_interval: 7,
        fill_threshold: 0,
        ..Default::default()
    };
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    let loaded = PipelineConfig::load_or_default(Some(&path)).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = PipelineConfig::load_or_default(Some(&dir.path().join("absent.json")));
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_malformed_json_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ sample_interval: ").unwrap();
    assert!(matches!(PipelineConfig::load(&path), Err(ConfigError::Parse(_))));
}

#[test]
fn test_zero_divisor_rejected() {
    let config = PipelineConfig {
        resize_divisor: 0,
        ..Default::default()
    };
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("resize_divisor"));
}
