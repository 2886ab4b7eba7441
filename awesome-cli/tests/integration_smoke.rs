//! Smoke tests for command wiring and an end-to-end run on SQLite

use assert_cmd::Command;
use predicates::prelude::*;

fn write_config(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("awesome.toml");
    let db = dir.path().join("awesome.db");
    std::fs::write(
        &path,
        format!(
            "backend = \"sqlite\"\nuser = \"\"\npassword = \"\"\ndb = \"{}\"\nmaxsize = 2\n",
            db.display()
        ),
    )
    .unwrap();
    path
}

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("awesome").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("add-user"))
        .stdout(predicate::str::contains("count"));
}

#[test]
fn test_list_help() {
    let mut cmd = Command::cargo_bin("awesome").unwrap();
    cmd.arg("list").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Rows to skip"));
}

#[test]
fn test_missing_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("awesome").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("AWESOME_CONFIG")
        .arg("init");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Config not found"));
}

#[test]
fn test_init_add_and_count() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir);

    Command::cargo_bin("awesome")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .arg("init")
        .assert()
        .success();

    Command::cargo_bin("awesome")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .args(["add-user", "--name", "test20", "--email", "test20@test.com", "--passwd", "test"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"admin\": false"));

    Command::cargo_bin("awesome")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .arg("count")
        .assert()
        .success()
        .stdout(predicate::str::diff("1\n"));

    Command::cargo_bin("awesome")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .args(["list", "--limit", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("test20@test.com"));
}
