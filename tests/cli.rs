//! End-to-end checks of the `hp` binary.

use assert_cmd::Command;
use std::path::Path;
use tempfile::TempDir;

fn hp(db: &Path) -> Command {
    let mut cmd = Command::cargo_bin("hp").unwrap();
    cmd.env_remove("HP_PROFILE_DIR")
        .env_remove("RUST_LOG")
        .arg("--db")
        .arg(db)
        .arg("--json");
    cmd
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_missing_database_reports_not_initialized() {
    let temp = TempDir::new().unwrap();
    let output = hp(&temp.path().join("health.db"))
        .arg("status")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let error: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(error["error"]["code"], "NOT_INITIALIZED");
}

#[test]
fn test_generate_export_import_flow() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("health.db");
    let profiles = temp.path().join("profiles");

    hp(&db).arg("init").assert().success();
    hp(&db)
        .args(["generate", "--days", "3", "--seed", "5"])
        .assert()
        .success();

    let output = hp(&db)
        .args(["export", "Three Days", "--dir"])
        .arg(&profiles)
        .output()
        .unwrap();
    assert!(output.status.success());
    let exported = stdout_json(&output);
    let count = exported["summary"]["records_exported"].as_u64().unwrap();
    assert!(count > 0);
    assert!(profiles.join("Three_Days.json.hsg").exists());

    let output = hp(&db)
        .args(["profile", "show", "Three Days", "--dir"])
        .arg(&profiles)
        .output()
        .unwrap();
    assert!(output.status.success());
    let shown = stdout_json(&output);
    assert_eq!(shown["meta_data"]["profileName"], "Three Days");

    let fresh = temp.path().join("fresh.db");
    hp(&fresh).arg("init").assert().success();
    let output = hp(&fresh)
        .arg("import")
        .arg(profiles.join("Three_Days.json.hsg"))
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output)["summary"]["records_written"].as_u64(),
        Some(count)
    );

    let output = hp(&fresh).arg("status").output().unwrap();
    assert_eq!(stdout_json(&output)["total"].as_u64(), Some(count));
}

#[test]
fn test_export_refuses_to_overwrite() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("health.db");
    let profiles = temp.path().join("profiles");
    hp(&db).arg("init").assert().success();

    let export = |extra: &[&str]| {
        hp(&db)
            .args(["export", "me", "--dir"])
            .arg(&profiles)
            .args(extra)
            .output()
            .unwrap()
    };

    assert!(export(&[]).status.success());
    let second = export(&[]);
    assert_eq!(second.status.code(), Some(4));
    assert!(export(&["--overwrite"]).status.success());
}

#[test]
fn test_import_unknown_profile() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("health.db");
    hp(&db).arg("init").assert().success();

    let output = hp(&db)
        .args(["import", "nobody", "--dir"])
        .arg(temp.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_profile_list_empty_directory() {
    let temp = TempDir::new().unwrap();
    let output = hp(&temp.path().join("health.db"))
        .args(["profile", "list", "--dir"])
        .arg(temp.path().join("none"))
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["count"], 0);
}
