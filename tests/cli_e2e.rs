//! End-to-end CLI tests for the subgrab binary.

use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("subgrab").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Download and organize subtitles"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("subgrab").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("subgrab"));
}

/// Test that invoking without the required flags fails with usage help.
#[test]
fn test_binary_missing_required_args_fails() {
    let mut cmd = Command::cargo_bin("subgrab").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let mut cmd = Command::cargo_bin("subgrab").unwrap();
    cmd.arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// Test that passing neither --episode nor --episodes is rejected.
#[test]
fn test_binary_requires_a_mode() {
    let mut cmd = Command::cargo_bin("subgrab").unwrap();
    cmd.args(["--show", "Show", "--season", "1", "-q"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to do"));
}

/// Test that --episode and --episodes conflict.
#[test]
fn test_binary_rejects_both_modes() {
    let mut cmd = Command::cargo_bin("subgrab").unwrap();
    cmd.args([
        "--show", "Show", "--season", "1", "-e", "1", "--episodes", "8",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("cannot be used with"));
}

/// Test that an unusable downloads directory fails fast with a clear error.
#[test]
fn test_binary_unusable_directory_fails() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let file_path = temp_dir.path().join("file-not-dir");
    std::fs::write(&file_path, b"plain file").expect("should create file");

    let mut cmd = Command::cargo_bin("subgrab").unwrap();
    cmd.args(["--show", "Show", "--season", "1", "-e", "1", "-q", "--dir"])
        .arg(&file_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unusable"));
}

/// Test the full single-episode flow: the binary polls while a download
/// lands, then renames it and prints the canonical path.
#[test]
fn test_binary_single_episode_picks_up_download() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let landing = temp_dir.path().join("subs-he.srt");
    let writer = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(300));
        std::fs::write(&landing, vec![b'a'; 12_000]).expect("writer should create the file");
    });

    let mut cmd = Command::cargo_bin("subgrab").unwrap();
    cmd.args(["--show", "Show", "--season", "1", "-e", "3", "-r", "1", "-q", "--dir"])
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Show.S01E03.srt"));
    writer.join().expect("writer thread should finish");

    assert!(
        temp_dir.path().join("Show.S01E03.srt").exists(),
        "Canonical file should exist after the run"
    );
    assert!(
        !temp_dir.path().join("subs-he.srt").exists(),
        "Original download name should be gone"
    );
}

/// Test single-episode mode with --json: the outcome object lands on stdout.
#[test]
fn test_binary_single_episode_json_outcome() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let landing = temp_dir.path().join("subs-he.srt");
    let writer = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(300));
        std::fs::write(&landing, vec![b'a'; 12_000]).expect("writer should create the file");
    });

    let mut cmd = Command::cargo_bin("subgrab").unwrap();
    cmd.args([
        "--show", "Show", "--season", "1", "-e", "3", "-r", "1", "--json", "-q", "--dir",
    ])
    .arg(temp_dir.path())
    .assert()
    .success()
    .stdout(predicate::str::contains("\"episode\": 3"))
    .stdout(predicate::str::contains("\"status\": \"downloaded\""))
    .stdout(predicate::str::contains("Show.S01E03.srt"));
    writer.join().expect("writer thread should finish");
}

/// Test the season sweep with --json: the report lands on stdout.
#[test]
fn test_binary_season_sweep_emits_json_report() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let landing = temp_dir.path().join("served.srt");
    let writer = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(300));
        std::fs::write(&landing, vec![b'a'; 12_000]).expect("writer should create the file");
    });

    let mut cmd = Command::cargo_bin("subgrab").unwrap();
    cmd.args([
        "--show", "Show", "--season", "2", "--episodes", "1", "-r", "1", "--json", "-q", "--dir",
    ])
    .arg(temp_dir.path())
    .assert()
    .success()
    .stdout(predicate::str::contains("\"status\": \"downloaded\""))
    .stdout(predicate::str::contains("Show.S02E01.srt"));
    writer.join().expect("writer thread should finish");
}
