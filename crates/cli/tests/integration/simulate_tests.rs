//! Simulate command tests.
//!
//! Each fixture under `tests/fixtures/` is a scenario run end to end.

use predicates::prelude::*;

use super::helpers::{fixture_path, optimizer_cmd, simulate_json};

#[test]
fn test_rate_flip_moves_funds() {
    let json = simulate_json("rate_flip", &[]);

    assert_eq!(json["steps"][0]["detail"], "10000 USDC routed to Compound");
    assert_eq!(json["state"]["currentProtocol"], "aave");
    assert_eq!(json["state"]["balances"]["aave"], "10000");
    assert_eq!(json["state"]["balances"]["compound"], "0");

    let history = json["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["oldPool"], "compound");
    assert_eq!(history[0]["newPool"], "aave");
    assert_eq!(history[0]["yieldBefore"], "4");
    assert_eq!(history[0]["yieldAfter"], "5");
}

#[test]
fn test_rebalance_before_deposit_is_noop() {
    let json = simulate_json("no_deposit", &[]);

    assert_eq!(json["steps"][0]["detail"], "no-op");
    assert_eq!(json["state"]["currentProtocol"], "none");
    assert_eq!(json["history"].as_array().unwrap().len(), 0);
}

#[test]
fn test_unchanged_rates_rebalance_is_noop() {
    let json = simulate_json("unchanged_rates", &[]);

    assert_eq!(json["steps"][1]["detail"], "no-op");
    assert_eq!(json["state"]["currentProtocol"], "compound");
    assert_eq!(json["state"]["balances"]["compound"], "50000");
}

#[test]
fn test_overdraw_reverts_without_changes() {
    let json = simulate_json("overdraw", &[]);

    assert_eq!(json["steps"][1]["status"], "reverted");
    assert_eq!(json["steps"][2]["status"], "reverted");
    assert_eq!(json["state"]["balances"]["total"], "1000");
    assert_eq!(json["state"]["currentProtocol"], "compound");
}

#[test]
fn test_keeper_disabled_by_default() {
    let json = simulate_json("keeper", &[]);

    assert_eq!(json["steps"][2]["detail"], "auto-rebalance disabled");
    assert_eq!(json["state"]["currentProtocol"], "compound");
}

#[test]
fn test_keeper_flag_enables_rebalance() {
    let json = simulate_json("keeper", &["--auto-rebalance"]);

    assert_eq!(json["state"]["currentProtocol"], "aave");
    assert_eq!(json["history"].as_array().unwrap().len(), 1);
}

#[test]
fn test_keeper_env_enables_rebalance() {
    let output = optimizer_cmd()
        .env("AUTO_REBALANCE", "true")
        .args(["--format", "json", "simulate"])
        .arg(fixture_path("keeper"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["state"]["currentProtocol"], "aave");
}

#[test]
fn test_keeper_tolerance_blocks_small_gain() {
    let json = simulate_json("keeper", &["--auto-rebalance", "--tolerance", "50"]);

    assert!(json["steps"][2]["detail"]
        .as_str()
        .unwrap()
        .contains("within tolerance"));
    assert_eq!(json["state"]["currentProtocol"], "compound");
}

#[test]
fn test_ownership_scenario() {
    let json = simulate_json("ownership", &[]);

    assert_eq!(json["state"]["owner"], "0x0000000000000000000000000000000000000000");
    let accounts = json["state"]["accounts"].as_array().unwrap();
    let bob = accounts.iter().find(|a| a["name"] == "bob").unwrap();
    assert_eq!(bob["balance"], "250");
}

#[test]
fn test_unexpected_revert_fails_command() {
    optimizer_cmd()
        .arg("simulate")
        .arg(fixture_path("unexpected_revert"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Step 1"))
        .stderr(predicate::str::contains("No funds deposited"));
}

#[test]
fn test_table_output() {
    optimizer_cmd()
        .arg("simulate")
        .arg(fixture_path("rate_flip"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Scenario: Rate flip"))
        .stdout(predicate::str::contains("Old Pool"))
        .stdout(predicate::str::contains("Balances"))
        .stdout(predicate::str::contains("10000 USDC"));
}

#[test]
fn test_history_limit() {
    let json = simulate_json("many_flips", &["-n", "2"]);

    let history = json["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["id"], 4);
    assert_eq!(history[1]["id"], 3);
}

#[test]
fn test_demo_runs() {
    optimizer_cmd()
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::contains("Scenario: demo"));
}
