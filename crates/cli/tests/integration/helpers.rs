//! Test helper utilities for CLI integration tests.

#![allow(deprecated)] // Command::cargo_bin deprecation

use std::path::PathBuf;

use assert_cmd::Command;

/// Create a CLI command with a clean environment for keeper settings.
pub fn optimizer_cmd() -> Command {
    let mut cmd = Command::cargo_bin("yield-optimizer").unwrap();
    cmd.env_remove("AUTO_REBALANCE")
        .env_remove("YIELD_TOLERANCE")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

/// Path to a scenario fixture.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(format!(
        "{}/tests/fixtures/{}.toml",
        env!("CARGO_MANIFEST_DIR"),
        name
    ))
}

/// Run a fixture with `--format json` and parse stdout.
pub fn simulate_json(name: &str, extra_args: &[&str]) -> serde_json::Value {
    let output = optimizer_cmd()
        .args(["--format", "json", "simulate"])
        .arg(fixture_path(name))
        .args(extra_args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "simulate {} failed: {}",
        name,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}
