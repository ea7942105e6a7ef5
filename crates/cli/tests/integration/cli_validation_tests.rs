//! CLI argument validation tests.
//!
//! These tests verify that the CLI properly validates arguments and provides
//! helpful error messages.

use predicates::prelude::*;

use super::helpers::{fixture_path, optimizer_cmd};

#[test]
fn test_help_output() {
    optimizer_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("yield-optimizer"))
        .stdout(predicate::str::contains("simulate"))
        .stdout(predicate::str::contains("rates"))
        .stdout(predicate::str::contains("demo"));
}

#[test]
fn test_simulate_help() {
    optimizer_cmd()
        .args(["simulate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SCENARIO"))
        .stdout(predicate::str::contains("--auto-rebalance"))
        .stdout(predicate::str::contains("--tolerance"));
}

#[test]
fn test_invalid_command() {
    optimizer_cmd()
        .arg("invalid_command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_simulate_missing_scenario() {
    optimizer_cmd()
        .arg("simulate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_simulate_nonexistent_file() {
    optimizer_cmd()
        .args(["simulate", "does/not/exist.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read scenario file"));
}

#[test]
fn test_simulate_malformed_file() {
    optimizer_cmd()
        .arg("simulate")
        .arg(fixture_path("malformed"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse scenario file"));
}

#[test]
fn test_invalid_output_format() {
    optimizer_cmd()
        .args(["rates", "--format", "invalid_format"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_invalid_tolerance() {
    optimizer_cmd()
        .arg("simulate")
        .arg(fixture_path("rate_flip"))
        .args(["--tolerance", "lots"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_negative_tolerance_rejected() {
    optimizer_cmd()
        .arg("simulate")
        .arg(fixture_path("rate_flip"))
        .args(["--tolerance=-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid tolerance"));
}
