//! Smoke tests for the tolerador CLI
//!
//! Nothing here launches a browser: every `run` case fails during
//! planning, before Chromium would start.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const SCENARIO_FILE: &str = r##"
scenarios:
  - name: invalid login
    group: auth
    start: /login
    steps:
      - description: enter unknown email
        action:
          fill:
            target: { name: email, candidates: ["#Email", "input[name=Email]"] }
            value: { literal: nobody@example.com }
      - description: submit
        action:
          click: { target: { name: log in, candidates: ["input.login-button"] } }
      - description: error summary shown
        action:
          expect:
            subject: { text: { name: errors, candidates: [".validation-summary-errors"] } }
            matcher: { matches: "(?i)unsuccessful" }
"##;

/// Get a command for the tolerador binary
fn tolerador() -> Command {
    let mut cmd = Command::cargo_bin("tolerador").expect("tolerador binary should exist");
    cmd.env_remove("RUST_LOG")
        .env_remove("TOLERAR_BASE_URL")
        .env_remove("TOLERAR_ELEMENT_TIMEOUT_MS");
    cmd
}

fn write_scenarios(content: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scenarios.yaml");
    fs::write(&path, content).unwrap();
    (dir, path)
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    tolerador()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.4.0"));
}

#[test]
fn test_help_flag() {
    tolerador()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_no_args_shows_help() {
    tolerador().assert().failure(); // Requires a subcommand
}

#[test]
fn test_run_subcommand_help() {
    tolerador()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--scenario"))
        .stdout(predicate::str::contains("--jobs"));
}

// ============================================================================
// List
// ============================================================================

#[test]
fn test_list_catalog() {
    tolerador()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("empty search results"))
        .stdout(predicate::str::contains("valid user registration"));
}

#[test]
fn test_list_group_filter() {
    tolerador()
        .args(["list", "--group", "cart"])
        .assert()
        .success()
        .stdout(predicate::str::contains("add product to cart"))
        .stdout(predicate::str::contains("empty search results").not());
}

#[test]
fn test_list_json() {
    let output = tolerador()
        .args(["list", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(rows.as_array().unwrap().len() > 20);
}

#[test]
fn test_list_unknown_group_fails() {
    tolerador()
        .args(["list", "--group", "nosuch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown group"));
}

// ============================================================================
// Validate
// ============================================================================

#[test]
fn test_validate_good_file() {
    let (_dir, path) = write_scenarios(SCENARIO_FILE);
    tolerador()
        .arg("validate")
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("1 scenario(s) valid"));
}

#[test]
fn test_validate_malformed_yaml() {
    let (_dir, path) = write_scenarios("scenarios: [ {name: x");
    tolerador().arg("validate").arg(&path).assert().failure();
}

#[test]
fn test_validate_bad_pattern() {
    let (_dir, path) = write_scenarios(&SCENARIO_FILE.replace("(?i)unsuccessful", "(unclosed"));
    tolerador().arg("validate").arg(&path).assert().failure();
}

#[test]
fn test_validate_missing_file() {
    tolerador()
        .args(["validate", "/no/such/scenarios.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

// ============================================================================
// Run (planning failures only)
// ============================================================================

#[test]
fn test_run_unknown_group_fails_fast() {
    tolerador()
        .args(["run", "--group", "nosuch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown group"));
}

#[test]
fn test_run_unknown_scenario_fails_fast() {
    let (_dir, path) = write_scenarios(SCENARIO_FILE);
    tolerador()
        .args(["run", "--scenario", "nosuch", "--file"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown scenario"));
}

#[test]
fn test_run_zero_jobs_rejected() {
    tolerador()
        .args(["run", "--jobs", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--jobs"));
}

#[test]
fn test_run_bad_base_url_rejected() {
    tolerador()
        .args(["run", "--base-url", "ftp://shop.test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("base URL"));
}
