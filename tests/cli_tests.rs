//! End-to-end checks of the command line surface that need no Docker,
//! Python, or AWS tooling.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn release_cmd(project: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rsconnect_release").unwrap();
    cmd.arg("--project-dir")
        .arg(project)
        .env_remove("RSCONNECT_RELEASE_VERSION")
        .env_remove("RSCONNECT_RELEASE_S3_PREFIX")
        .env_remove("RSCONNECT_RELEASE_MOCK_HOST")
        .env_remove("SOURCE_DATE_EPOCH")
        .env_remove("GITHUB_OUTPUT")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_lint_rejects_legacy_python() {
    let dir = tempfile::tempdir().unwrap();
    release_cmd(dir.path())
        .args(["lint", "2.7"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Python 2.7 cannot run the lint tools"));
}

#[test]
fn test_fmt_alias_rejects_legacy_python() {
    let dir = tempfile::tempdir().unwrap();
    release_cmd(dir.path())
        .arg("fmt-3.5")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Python 3.5 cannot run the fmt tools"));
}

#[test]
fn test_invalid_tag_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    release_cmd(dir.path())
        .args(["test", "3.8:latest"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid environment tag"));
}

#[test]
fn test_version_override_is_printed_alone() {
    let dir = tempfile::tempdir().unwrap();
    release_cmd(dir.path())
        .arg("version")
        .env("RSCONNECT_RELEASE_VERSION", "1.5.0")
        .assert()
        .success()
        .stdout("1.5.0\n");
}

#[test]
fn test_publish_refuses_missing_wheel() {
    let dir = tempfile::tempdir().unwrap();
    for target in ["sync-to-s3", "sync-latest-to-s3"] {
        release_cmd(dir.path())
            .arg(target)
            .env("RSCONNECT_RELEASE_VERSION", "1.5.0")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Artifact not found"));
    }
}

#[test]
fn test_clean_removes_build_output() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("build/lib")).unwrap();
    std::fs::create_dir_all(dir.path().join("dist")).unwrap();
    std::fs::write(dir.path().join("setup.py"), "").unwrap();

    release_cmd(dir.path()).arg("clean").assert().success();

    assert!(!dir.path().join("build").exists());
    assert!(!dir.path().join("dist").exists());
    assert!(dir.path().join("setup.py").exists());
}

#[test]
fn test_clean_stores_removes_state_dirs() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("tests/home/rsconnect-python/servers")).unwrap();

    release_cmd(dir.path())
        .args(["-q", "clean-stores"])
        .assert()
        .success()
        .stdout("");

    assert!(!dir.path().join("tests/home/rsconnect-python").exists());
    assert!(dir.path().join("tests/home").exists());
}

#[test]
fn test_unknown_config_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("release.toml"), "[publish]\nbucket = \"x\"\n").unwrap();

    release_cmd(dir.path())
        .arg("clean")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_unknown_command_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    release_cmd(dir.path())
        .arg("deploy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}
