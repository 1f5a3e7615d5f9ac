//! Black-box tests for the `coveriq` binary.
//!
//! None of these reach a backend: each command fails or finishes before
//! the first request.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn coveriq(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("coveriq").expect("binary should build");
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .env("COVERIQ_BACKEND_URL", "http://127.0.0.1:9")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    coveriq(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("download"))
        .stdout(predicate::str::contains("keys"))
        .stdout(predicate::str::contains("automate"));
}

#[test]
fn test_run_rejects_invalid_url_before_any_request() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    coveriq(&dir)
        .args(["run", "--url", "https://example.com/not-figma"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid Figma URL format"));

    assert!(
        std::fs::read_dir(dir.path())
            .expect("read dir")
            .all(|entry| entry.expect("entry").file_name() != "test-cases.zip"),
        "nothing should be downloaded"
    );
}

#[test]
fn test_unknown_artifact_is_a_usage_error() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    coveriq(&dir)
        .args(["download", "slides"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown artifact 'slides'"));
}

#[test]
fn test_invalid_config_file_is_reported() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config_dir = dir.path().join(".coveriq");
    std::fs::create_dir_all(&config_dir).expect("Failed to create .coveriq");
    std::fs::write(config_dir.join("config.toml"), "request-timeout-secs = 0\n")
        .expect("Failed to write config");

    coveriq(&dir)
        .args(["download", "plan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("request-timeout-secs must be greater than zero"));
}

#[test]
fn test_automate_rejects_non_feature_files() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, "hello").expect("Failed to write file");

    coveriq(&dir)
        .args(["automate", "notes.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a .feature file"));
}
