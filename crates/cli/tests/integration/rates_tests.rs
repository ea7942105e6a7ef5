//! Rates command tests.

use predicates::prelude::*;

use super::helpers::optimizer_cmd;

#[test]
fn test_rates_default_deployment() {
    optimizer_cmd()
        .arg("rates")
        .assert()
        .success()
        .stdout(predicate::str::contains("3%"))
        .stdout(predicate::str::contains("2.5%"))
        .stdout(predicate::str::contains("Best protocol: Aave"));
}

#[test]
fn test_rates_higher_compound() {
    optimizer_cmd()
        .args(["rates", "--aave", "3", "--compound", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Best protocol: Compound"));
}

#[test]
fn test_rates_tie_goes_to_compound() {
    let output = optimizer_cmd()
        .args(["--format", "json", "rates", "--aave", "4.5", "--compound", "4.5"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["best"], "compound");
    assert_eq!(json["aave"], "4.5");
}

#[test]
fn test_rates_zero_tie_goes_to_compound() {
    optimizer_cmd()
        .args(["rates", "--aave", "0", "--compound", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Best protocol: Compound"));
}

#[test]
fn test_rates_invalid_value() {
    optimizer_cmd()
        .args(["rates", "--aave=-3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid Aave rate"));
}
