//! E2E tests for persistent configuration
//!
//! Tests the JSON file round-trip and that the configured extension and
//! store file name steer an import cycle.

use chrono::{TimeZone, Utc};
use vibdose::config::AppConfig;
use vibdose::ingest::source::collect_log_files;
use vibdose::{ImportSession, SqliteStore};

#[test]
fn test_config_json_contract() {
    let json = serde_json::to_value(AppConfig::default()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "store_file_name": "Exclude.sqlite",
            "windowed_max": true,
            "extension": "csv"
        })
    );
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"extension": "log"}"#).unwrap();

    let config = AppConfig::load_from(&path);
    assert_eq!(config.extension, "log");
    assert_eq!(config.store_file_name, "Exclude.sqlite");
    assert!(config.windowed_max);
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::load_from(&dir.path().join("absent.json"));
    assert_eq!(config, AppConfig::default());
}

#[test]
fn test_configured_extension_and_store_drive_import() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        store_file_name: "site.sqlite".to_string(),
        windowed_max: false,
        extension: "log".to_string(),
    };
    config.save(&dir.path().join("config.json")).unwrap();
    let config = AppConfig::load_from(&dir.path().join("config.json"));

    std::fs::write(dir.path().join("a.log"), "1,2,3\n").unwrap();
    std::fs::write(dir.path().join("b.csv"), "1,2,3\n").unwrap();

    let files = collect_log_files(dir.path(), &config.extension).unwrap();
    let mut session = ImportSession::new();
    session.begin_import_at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    session.import_files(&files);
    assert_eq!(session.traces().len(), 1);
    assert_eq!(session.traces()[0].file_name, "a.log");

    let mut store = SqliteStore::open_in(dir.path(), &config.store_file_name).unwrap();
    session.set_exclusion(0, 1, &mut store).unwrap();
    assert!(dir.path().join("site.sqlite").is_file());
}
