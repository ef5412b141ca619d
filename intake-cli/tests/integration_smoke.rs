//! Smoke tests to verify command wiring

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("intake").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_serve_help() {
    let mut cmd = Command::cargo_bin("intake").unwrap();
    cmd.arg("serve").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Port to listen on"));
}

#[test]
fn test_check_against_memory_store() {
    let mut cmd = Command::cargo_bin("intake").unwrap();
    cmd.arg("check")
        .arg("--database-url")
        .arg("memory://")
        .env_remove("APP_ENV")
        .env_remove("ALLOWED_ORIGINS")
        .env_remove("RATE_LIMIT_MAX")
        .env_remove("RATE_LIMIT_WINDOW_SECS")
        .env_remove("ACCEPT_WHEN_OFFLINE");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("connected (0 contacts)"))
        .stdout(predicate::str::contains("memory"));
}

#[test]
fn test_check_rejects_unknown_scheme() {
    let mut cmd = Command::cargo_bin("intake").unwrap();
    cmd.arg("check")
        .arg("--database-url")
        .arg("mongodb+srv://cluster.example.net/site")
        .env_remove("RATE_LIMIT_MAX")
        .env_remove("RATE_LIMIT_WINDOW_SECS")
        .env_remove("ACCEPT_WHEN_OFFLINE");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unsupported connection string scheme"));
}

#[test]
fn test_check_without_store_fails() {
    let mut cmd = Command::cargo_bin("intake").unwrap();
    cmd.arg("check")
        .env_remove("DATABASE_URL")
        .env_remove("MONGODB_URI")
        .env_remove("RATE_LIMIT_MAX")
        .env_remove("RATE_LIMIT_WINDOW_SECS")
        .env_remove("ACCEPT_WHEN_OFFLINE");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no store configured"));
}
