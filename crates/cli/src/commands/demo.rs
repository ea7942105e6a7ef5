//! Built-in walkthrough scenario.

use anyhow::Result;
use yield_optimizer_contracts::Protocol;

use crate::cli::{KeeperArgs, OutputFormat};
use crate::commands::simulate::{print_report, resolve_policy, run_scenario};
use crate::scenario::{AccountConfig, Action, InitialRates, Scenario, Step};

/// Deposit at 3%/4%, flip Aave to 5%, rebalance, then let the keeper react
/// to a small and a large Compound move before the owner withdraws.
fn demo_scenario() -> Scenario {
    let set_rate = |protocol: Protocol, rate: &str| {
        Step::new(Action::SetRate {
            protocol,
            rate: rate.to_string(),
        })
    };

    Scenario {
        name: Some("demo".to_string()),
        description: None,
        rates: Some(InitialRates {
            aave: "3".to_string(),
            compound: "4".to_string(),
        }),
        accounts: vec![AccountConfig {
            name: "alice".to_string(),
            balance: Some("100000".to_string()),
        }],
        steps: vec![
            Step::new(Action::Deposit {
                from: Some("alice".to_string()),
                amount: "10000".to_string(),
            }),
            set_rate(Protocol::Aave, "5"),
            Step::new(Action::Rebalance {
                from: Some("alice".to_string()),
            }),
            set_rate(Protocol::Compound, "5.1"),
            Step::new(Action::KeeperTick {}),
            set_rate(Protocol::Compound, "6"),
            Step::new(Action::KeeperTick {}),
            Step::new(Action::Withdraw {
                from: None,
                amount: "1000".to_string(),
            }),
        ],
        ..Scenario::default()
    }
}

pub fn run_demo(args: &KeeperArgs, format: OutputFormat) -> Result<()> {
    let scenario = demo_scenario();
    let policy = resolve_policy(&scenario, args)?;
    let report = run_scenario(&scenario, policy, yield_optimizer_strategy::DEFAULT_HISTORY_LIMIT)?;
    print_report(&report, format)
}
