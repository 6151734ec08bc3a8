use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn vdkeeper_cmd(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("vdkeeper"));
    cmd.env("VDKEEPER_DATA_DIR", data_dir).env("NO_COLOR", "1");
    cmd
}

fn write_config(data_dir: &Path, json: &str) {
    fs::write(data_dir.join("virtual-displays.json"), json).expect("write config");
}

const TWO_DISPLAYS: &str = r#"[
  {"name": "Sidecar", "width": 1920, "height": 1080, "refreshRate": 60, "hiDPI": true, "connectOnStartup": true},
  {"name": "Parked", "width": 1280, "height": 720, "refreshRate": 30, "hiDPI": false, "connectOnStartup": false}
]"#;

#[test]
fn check_lists_declared_displays() {
    let data = TempDir::new().expect("data dir");
    write_config(data.path(), TWO_DISPLAYS);

    vdkeeper_cmd(data.path())
        .arg("check")
        .assert()
        .success()
        .stdout(contains("Sidecar"))
        .stdout(contains("1920x1080"))
        .stdout(contains("2 displays, 1 created on startup"));
}

#[test]
fn check_rejects_zero_sized_display() {
    let data = TempDir::new().expect("data dir");
    write_config(
        data.path(),
        r#"[{"name": "Bad", "width": 0, "height": 1080, "refreshRate": 60, "hiDPI": false, "connectOnStartup": true}]"#,
    );

    vdkeeper_cmd(data.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(contains("not usable"));
}

#[test]
fn check_reports_missing_file_given_with_config_flag() {
    let data = TempDir::new().expect("data dir");
    let elsewhere = data.path().join("nope.json");

    vdkeeper_cmd(data.path())
        .args(["check", "--config"])
        .arg(&elsewhere)
        .assert()
        .failure()
        .stderr(contains("nope.json"));
}

#[test]
fn status_json_without_daemon_reports_not_running() {
    let data = TempDir::new().expect("data dir");

    let output = vdkeeper_cmd(data.path())
        .args(["status", "--json"])
        .output()
        .expect("run status");
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("status JSON");
    assert_eq!(value["running"], false);
    assert_eq!(value["pid"], serde_json::Value::Null);
    assert_eq!(value["config_state"], "missing");
}

#[test]
fn status_counts_declared_displays() {
    let data = TempDir::new().expect("data dir");
    write_config(data.path(), TWO_DISPLAYS);

    let output = vdkeeper_cmd(data.path())
        .args(["status", "--json"])
        .output()
        .expect("run status");
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("status JSON");
    assert_eq!(value["config_state"], "ok");
    assert_eq!(value["declared"], 2);
    assert_eq!(value["on_startup"], 1);
}

#[test]
fn status_treats_live_marker_as_running() {
    let data = TempDir::new().expect("data dir");
    let me = std::process::id();
    fs::write(data.path().join("daemon.pid"), me.to_string()).expect("write marker");

    vdkeeper_cmd(data.path())
        .arg("status")
        .assert()
        .success()
        .stdout(contains(format!("running (pid {me})")));
}

#[test]
fn reload_without_daemon_fails() {
    let data = TempDir::new().expect("data dir");

    vdkeeper_cmd(data.path())
        .arg("reload")
        .assert()
        .failure()
        .stderr(contains("not running"));
}

#[test]
fn data_dir_flag_overrides_environment() {
    let data = TempDir::new().expect("data dir");
    let other = TempDir::new().expect("other dir");
    write_config(other.path(), TWO_DISPLAYS);

    vdkeeper_cmd(data.path())
        .arg("--data-dir")
        .arg(other.path())
        .arg("check")
        .assert()
        .success()
        .stdout(contains("Parked"));
}

#[test]
fn status_reads_the_config_given_with_config_flag() {
    let data = TempDir::new().expect("data dir");
    let custom = data.path().join("custom.json");
    fs::write(&custom, TWO_DISPLAYS).expect("write custom config");

    let output = vdkeeper_cmd(data.path())
        .args(["status", "--json", "--config"])
        .arg(&custom)
        .output()
        .expect("run status");
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("status JSON");
    assert_eq!(value["config"], custom.display().to_string());
    assert_eq!(value["config_state"], "ok");
    assert_eq!(value["declared"], 2);
}
