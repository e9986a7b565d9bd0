//! Unit tests for the SettingsEngine public API.
//!
//! Exercises default loading, dotted-key reads and writes, persistence,
//! validation and reset through the trait interface.

use std::fs;

use rstest::rstest;
use steprecorder::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use steprecorder::types::errors::SettingsError;
use steprecorder::types::settings::RecorderSettings;
use tempfile::TempDir;

/// Engine backed by `settings.json` inside a temp directory held by the caller.
fn engine_in_temp(dir: &TempDir) -> SettingsEngine {
    let path = dir.path().join("settings.json").to_string_lossy().to_string();
    SettingsEngine::new(Some(path))
}

#[test]
fn test_load_defaults_when_no_config_file_exists() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);

    let settings = engine.load().unwrap();

    assert_eq!(settings, RecorderSettings::default());
    assert!(!dir.path().join("settings.json").exists(), "load must not create the file");
}

#[test]
fn test_set_value_persists_changes() {
    let dir = TempDir::new().unwrap();

    {
        let mut engine = engine_in_temp(&dir);
        engine.load().unwrap();
        engine
            .set_value("export.base_name", serde_json::json!("checkout_flow"))
            .unwrap();
    }

    let mut engine2 = engine_in_temp(&dir);
    let loaded = engine2.load().unwrap();
    assert_eq!(loaded.export.base_name, "checkout_flow");
}

#[test]
fn test_get_value_by_dotted_key() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    assert_eq!(engine.get_value("timing.sanitize_window_ms").unwrap(), serde_json::json!(5000));
    assert_eq!(engine.get_value("annotation.highlight_color").unwrap(), serde_json::json!("#ff0000"));
    assert!(engine.get_value("page").unwrap().is_object());
}

#[test]
fn test_unknown_and_malformed_keys_are_rejected() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    assert!(matches!(engine.get_value("page.colour"), Err(SettingsError::InvalidKey(_))));
    assert!(matches!(
        engine.set_value("timing.nope", serde_json::json!(1)),
        Err(SettingsError::InvalidKey(_))
    ));
    assert!(matches!(
        engine.set_value("page.margin.inner", serde_json::json!(1)),
        Err(SettingsError::InvalidKey(_))
    ));
    assert!(matches!(engine.set_value("", serde_json::json!(1)), Err(SettingsError::InvalidKey(_))));
}

#[test]
fn test_invalid_values_leave_settings_untouched() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    let wrong_type = engine.set_value("page.font_size", serde_json::json!("large"));
    assert!(matches!(wrong_type, Err(SettingsError::InvalidValue(_))));

    let zero_interval = engine.set_value("timing.screenshot_interval_ms", serde_json::json!(0));
    assert!(matches!(zero_interval, Err(SettingsError::InvalidValue(_))));

    let huge_margin = engine.set_value("page.margin", serde_json::json!(400.0));
    assert!(matches!(huge_margin, Err(SettingsError::InvalidValue(_))));

    assert_eq!(*engine.get_settings(), RecorderSettings::default());
    assert!(!dir.path().join("settings.json").exists());
}

#[rstest]
#[case("page.padding", -32.0)]
#[case("page.margin", -1.0)]
#[case("page.image_max_height", -0.5)]
fn test_negative_page_geometry_is_rejected(#[case] key: &str, #[case] value: f64) {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    let result = engine.set_value(key, serde_json::json!(value));

    assert!(matches!(result, Err(SettingsError::InvalidValue(ref msg)) if msg.contains("cannot be negative")));
    assert_eq!(*engine.get_settings(), RecorderSettings::default());
}

#[test]
fn test_zero_padding_and_image_height_are_allowed() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    engine.set_value("page.padding", serde_json::json!(0.0)).unwrap();
    engine.set_value("page.image_max_height", serde_json::json!(0.0)).unwrap();

    assert_eq!(engine.get_settings().page.padding, 0.0);
    assert_eq!(engine.get_settings().page.image_max_height, 0.0);
}

#[test]
fn test_malformed_file_is_a_serialization_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("settings.json"), "{ not json").unwrap();
    let mut engine = engine_in_temp(&dir);

    assert!(matches!(engine.load(), Err(SettingsError::SerializationError(_))));
}

#[test]
fn test_partial_file_fills_in_defaults() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("settings.json"),
        r#"{ "timing": { "screenshot_interval_ms": 1000 } }"#,
    )
    .unwrap();
    let mut engine = engine_in_temp(&dir);

    let loaded = engine.load().unwrap();
    assert_eq!(loaded.timing.screenshot_interval_ms, 1000);
    assert_eq!(loaded.timing.sanitize_window_ms, 5000);
    assert_eq!(loaded.page, RecorderSettings::default().page);
}

#[test]
fn test_reset_restores_defaults() {
    let dir = TempDir::new().unwrap();

    {
        let mut engine = engine_in_temp(&dir);
        engine.load().unwrap();
        engine.set_value("page.font_size", serde_json::json!(14.0)).unwrap();
        engine.set_value("export.document_title", serde_json::json!("Guide")).unwrap();
        assert_eq!(engine.get_settings().page.font_size, 14.0);

        engine.reset().unwrap();
        assert_eq!(*engine.get_settings(), RecorderSettings::default());
    }

    let mut engine2 = engine_in_temp(&dir);
    assert_eq!(engine2.load().unwrap(), RecorderSettings::default());
}
