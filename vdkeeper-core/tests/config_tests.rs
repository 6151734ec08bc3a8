//! Desired-state file: error messages, tolerant load, atomic save.

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use vdkeeper_core::{
    config::{config_path, ConfigStore, LoadOutcome},
    ConfigError, DisplayName, DisplaySpec,
};

fn spec(name: &str, connect: bool) -> DisplaySpec {
    DisplaySpec {
        name: DisplayName::from(name),
        width: 1920,
        height: 1080,
        refresh_rate: 60.0,
        hidpi: false,
        connect_on_startup: connect,
    }
}

// ---------------------------------------------------------------------------
// 1. Strict read
// ---------------------------------------------------------------------------

#[test]
fn read_missing_file_returns_not_found() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let store = ConfigStore::new(config_path(dir.path()));
    let err = store.read().unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("virtual-displays.json"));
}

#[test]
fn read_corrupt_json_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("virtual-displays.json");
    file.write_str("[{\"name\": \"A\", \"width\": ").expect("write");

    let err = ConfigStore::new(file.path()).read().unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("virtual-displays.json"));
}

#[test]
fn one_malformed_entry_fails_the_whole_read() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("virtual-displays.json");
    file.write_str(
        r#"[
            {"name":"A","width":1920,"height":1080,"refreshRate":60,"hiDPI":false,"connectOnStartup":true},
            {"name":"B","width":"wide","height":1080,"refreshRate":60,"hiDPI":false,"connectOnStartup":true}
        ]"#,
    )
    .expect("write");

    let store = ConfigStore::new(file.path());
    assert!(matches!(store.read(), Err(ConfigError::Parse { .. })));
    assert_eq!(store.load(), LoadOutcome::Unchanged);
}

#[test]
fn read_rejects_zero_sized_entry() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("virtual-displays.json");
    file.write_str(
        r#"[{"name":"A","width":0,"height":1080,"refreshRate":60,"hiDPI":false,"connectOnStartup":true}]"#,
    )
    .expect("write");

    let err = ConfigStore::new(file.path()).read().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Tolerant load
// ---------------------------------------------------------------------------

#[test]
fn load_missing_file_is_unchanged() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let store = ConfigStore::new(config_path(dir.path()));
    assert_eq!(store.load(), LoadOutcome::Unchanged);
}

#[test]
fn load_filters_and_keeps_order() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let store = ConfigStore::new(config_path(dir.path()));
    store
        .save(&[spec("C", true), spec("hidden", false), spec("A", true)])
        .expect("save");

    let LoadOutcome::Desired(desired) = store.load() else {
        panic!("expected a desired state");
    };
    let names: Vec<_> = desired.specs().iter().map(|s| s.name.0.clone()).collect();
    assert_eq!(names, vec!["C".to_string(), "A".to_string()]);
}

#[test]
fn empty_array_is_an_empty_desired_state_not_unchanged() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("virtual-displays.json");
    file.write_str("[]").expect("write");

    match ConfigStore::new(file.path()).load() {
        LoadOutcome::Desired(desired) => assert!(desired.is_empty()),
        LoadOutcome::Unchanged => panic!("empty list must clear the desired state"),
    }
}

// ---------------------------------------------------------------------------
// 3. Save
// ---------------------------------------------------------------------------

#[test]
fn save_creates_parent_directory() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let nested = dir.child("nested").child("vdkeeper");
    let store = ConfigStore::new(config_path(nested.path()));
    store.save(&[spec("A", true)]).expect("save");

    nested
        .child("virtual-displays.json")
        .assert(predicate::path::exists());
    nested
        .child("virtual-displays.json")
        .assert(predicate::str::contains("\"connectOnStartup\": true"));
}
