// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use snapfeed::backends::camera::FacingMode;
use snapfeed::pipelines::photo::EncodingQuality;
use snapfeed::{AppError, Config};
use std::path::PathBuf;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.facing_mode, FacingMode::Environment);
    assert_eq!((config.ideal_width, config.ideal_height), (640, 480));
    assert_eq!(config.jpeg_quality, EncodingQuality::Medium);
    assert_eq!(config.jpeg_quality.jpeg_quality(), 80);
    assert!(config.photo_dir.is_none());
}

#[test]
fn test_missing_file_gives_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let config = Config::load_from(&tmp.path().join("absent.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_save_and_load() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("snapfeed").join("config.json");

    let config = Config {
        facing_mode: FacingMode::User,
        ideal_width: 1280,
        ideal_height: 720,
        jpeg_quality: EncodingQuality::High,
        photo_dir: Some(PathBuf::from("/srv/photos")),
    };
    config.save_to(&path).unwrap();

    assert_eq!(Config::load_from(&path).unwrap(), config);
}

#[test]
fn test_partial_file_fills_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.json");
    std::fs::write(&path, r#"{ "facing_mode": "User" }"#).unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.facing_mode, FacingMode::User);
    assert_eq!(config.ideal_width, 640);
    assert_eq!(config.jpeg_quality, EncodingQuality::Medium);
}

#[test]
fn test_malformed_file_is_config_error() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    match Config::load_from(&path) {
        Err(AppError::Config(msg)) => assert!(msg.contains("config.json")),
        other => panic!("expected a config error, got {:?}", other),
    }
}

#[test]
fn test_constraints_match_ideal_resolution() {
    let constraints = Config::default().constraints();
    assert_eq!(constraints.facing_mode, FacingMode::Environment);
    assert_eq!((constraints.ideal_width, constraints.ideal_height), (640, 480));
}
