//! Scenario runner and the simulate command.

use alloy_primitives::{Address, U256};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use yield_optimizer_contracts::{account, Devnet, Protocol, USDC_DECIMALS};
use yield_optimizer_strategy::{
    format_amount, parse_amount, parse_percent, rate_to_percent, Decision, Keeper,
    RebalancePolicy, RebalanceRecord, StrategyError,
};

use crate::cli::{KeeperArgs, OutputFormat, SimulateArgs};
use crate::output::{format_history_table, format_state_detail, format_steps_table};
use crate::scenario::{Action, Scenario, Step};

/// Account index used by the keeper.
const KEEPER_ACCOUNT: u8 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Ok,
    Reverted,
}

/// Result of one scenario step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub index: usize,
    pub action: String,
    pub status: StepStatus,
    pub detail: String,
    /// Block that included the step's last transaction
    pub block: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    pub name: String,
    pub address: Address,
    pub balance: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateReport {
    pub aave: Decimal,
    pub compound: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceReport {
    pub aave: String,
    pub compound: String,
    /// Balance at the selected protocol only
    pub total: String,
}

/// Devnet state after the last step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateReport {
    pub block_number: u64,
    pub timestamp: u64,
    pub optimizer: Address,
    pub owner: Address,
    pub current_protocol: Protocol,
    pub best_protocol: Protocol,
    pub rates: RateReport,
    pub balances: BalanceReport,
    pub accounts: Vec<AccountBalance>,
    pub keeper: RebalancePolicy,
}

/// Everything the simulate command prints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub steps: Vec<StepReport>,
    pub state: StateReport,
    pub history: Vec<RebalanceRecord>,
}

/// A devnet, its keeper and the named accounts of a scenario.
pub struct Simulation {
    devnet: Devnet,
    keeper: Keeper,
    accounts: Vec<(String, Address)>,
}

impl Simulation {
    /// Deploy contracts, fund accounts and apply the initial rates.
    pub fn new(scenario: &Scenario, policy: RebalancePolicy) -> Result<Self> {
        let owner = account(0);
        let mut devnet = Devnet::deploy(owner).context("Failed to deploy contracts")?;

        let mut accounts = vec![("owner".to_string(), owner)];
        for (i, config) in scenario.accounts.iter().enumerate() {
            let index = u8::try_from(i + 1)
                .ok()
                .filter(|index| *index < KEEPER_ACCOUNT)
                .context("Too many accounts")?;
            let address = account(index);
            if let Some(balance) = &config.balance {
                let amount = parse_amount(balance, USDC_DECIMALS)
                    .with_context(|| format!("Invalid balance for {}", config.name))?;
                devnet
                    .transfer(owner, address, amount)
                    .with_context(|| format!("Failed to fund {}", config.name))?;
            }
            accounts.push((config.name.clone(), address));
        }

        if let Some(rates) = &scenario.rates {
            let aave = parse_percent(&rates.aave).context("Invalid initial Aave rate")?;
            let compound = parse_percent(&rates.compound).context("Invalid initial Compound rate")?;
            devnet.set_aave_rate(aave)?;
            devnet.set_compound_rate(compound)?;
        }

        Ok(Self {
            devnet,
            keeper: Keeper::new(account(KEEPER_ACCOUNT), policy),
            accounts,
        })
    }

    pub fn keeper(&self) -> &Keeper {
        &self.keeper
    }

    /// Resolve an account name, the `keeper`, or a literal address.
    fn resolve(&self, name: Option<&str>) -> Result<Address> {
        let name = name.unwrap_or("owner");
        if name == "keeper" {
            return Ok(self.keeper.address());
        }
        if let Some((_, address)) = self.accounts.iter().find(|(n, _)| n == name) {
            return Ok(*address);
        }
        name.parse::<Address>()
            .with_context(|| format!("Unknown account: {}", name))
    }

    fn name_of(&self, address: Address) -> String {
        if address == self.keeper.address() {
            return "keeper".to_string();
        }
        self.accounts
            .iter()
            .find(|(_, a)| *a == address)
            .map_or_else(|| address.to_string(), |(n, _)| n.clone())
    }

    /// Run one step, checking it against its expected revert.
    pub fn run_step(&mut self, index: usize, step: &Step) -> Result<StepReport> {
        let label = step.action.to_string();
        let outcome = self
            .execute(&step.action)
            .with_context(|| format!("Step {} ({}) is invalid", index, label))?;

        let (status, detail) = match (outcome, &step.expect_revert) {
            (Ok(detail), None) => (StepStatus::Ok, detail),
            (Ok(_), Some(expected)) => anyhow::bail!(
                "Step {} ({}) succeeded but was expected to revert with \"{}\"",
                index,
                label,
                expected
            ),
            (Err(err), Some(expected)) if err.to_string().contains(expected.as_str()) => {
                (StepStatus::Reverted, err.to_string())
            }
            (Err(err), _) => {
                return Err(err).with_context(|| format!("Step {} ({}) failed", index, label))
            }
        };

        info!(step = index, action = %label, ?status, "step done");
        Ok(StepReport {
            index,
            action: label,
            status,
            detail,
            block: self.devnet.block_number(),
        })
    }

    /// Execute an action. The outer error is a malformed step; the inner one
    /// is a revert.
    fn execute(&mut self, action: &Action) -> Result<std::result::Result<String, StrategyError>> {
        let usdc = |amount: U256| format!("{} USDC", format_amount(amount, USDC_DECIMALS));

        match action {
            Action::SetRate { protocol, rate } => {
                let quote = parse_percent(rate)?;
                let receipt = match protocol {
                    Protocol::Aave => self.devnet.set_aave_rate(quote),
                    Protocol::Compound => self.devnet.set_compound_rate(quote),
                    Protocol::None => anyhow::bail!("Cannot set a rate for protocol none"),
                };
                Ok(receipt
                    .map(|_| format!("{} rate is now {}%", protocol, rate))
                    .map_err(StrategyError::from))
            }
            Action::Deposit { from, amount } => {
                let caller = self.resolve(from.as_deref())?;
                let amount = parse_amount(amount, USDC_DECIMALS)?;
                let optimizer = self.devnet.optimizer().address();
                let result = self
                    .devnet
                    .approve(caller, optimizer, amount)
                    .and_then(|_| self.devnet.deposit(caller, amount));
                Ok(result
                    .map(|receipt| format!("{} routed to {}", usdc(amount), receipt.output))
                    .map_err(StrategyError::from))
            }
            Action::Withdraw { from, amount } => {
                let caller = self.resolve(from.as_deref())?;
                let amount = parse_amount(amount, USDC_DECIMALS)?;
                let owner = self.name_of(self.devnet.optimizer().owner());
                Ok(self
                    .devnet
                    .withdraw(caller, amount)
                    .map(|_| format!("{} sent to {}", usdc(amount), owner))
                    .map_err(StrategyError::from))
            }
            Action::Rebalance { from } => {
                let caller = self.resolve(from.as_deref())?;
                Ok(self
                    .keeper
                    .rebalance_as(&mut self.devnet, caller)
                    .map(|record| match record {
                        Some(r) => format!(
                            "moved {} from {} to {}",
                            usdc(r.amount),
                            r.old_pool,
                            r.new_pool
                        ),
                        None => "no-op".to_string(),
                    }))
            }
            Action::KeeperTick {} => Ok(self.keeper.tick(&mut self.devnet).map(describe_decision)),
            Action::TransferOwnership { from, to } => {
                let caller = self.resolve(from.as_deref())?;
                let new_owner = self.resolve(Some(to.as_str()))?;
                Ok(self
                    .devnet
                    .transfer_ownership(caller, new_owner)
                    .map(|_| format!("owner is now {}", to))
                    .map_err(StrategyError::from))
            }
            Action::RenounceOwnership { from } => {
                let caller = self.resolve(from.as_deref())?;
                Ok(self
                    .devnet
                    .renounce_ownership(caller)
                    .map(|_| "ownership renounced".to_string())
                    .map_err(StrategyError::from))
            }
            Action::AdvanceTime { seconds } => {
                self.devnet.advance_time(*seconds);
                Ok(Ok(format!("clock moved forward {}s", seconds)))
            }
        }
    }

    /// Snapshot the devnet for display.
    pub fn state_report(&self) -> Result<StateReport> {
        let devnet = &self.devnet;
        let rates = devnet.protocol_rates();
        let balances = devnet.protocol_balances();

        let accounts = self
            .accounts
            .iter()
            .map(|(name, address)| AccountBalance {
                name: name.clone(),
                address: *address,
                balance: format_amount(devnet.usdc().balance_of(*address), USDC_DECIMALS),
            })
            .collect();

        Ok(StateReport {
            block_number: devnet.block_number(),
            timestamp: devnet.timestamp(),
            optimizer: devnet.optimizer().address(),
            owner: devnet.optimizer().owner(),
            current_protocol: devnet.optimizer().current_protocol(),
            best_protocol: devnet.best_protocol(),
            rates: RateReport {
                aave: rate_to_percent(rates.aave)?,
                compound: rate_to_percent(rates.compound)?,
            },
            balances: BalanceReport {
                aave: format_amount(balances.aave, USDC_DECIMALS),
                compound: format_amount(balances.compound, USDC_DECIMALS),
                total: format_amount(devnet.total_balance(), USDC_DECIMALS),
            },
            accounts,
            keeper: *self.keeper.policy(),
        })
    }
}

fn describe_decision(decision: Decision) -> String {
    match decision {
        Decision::Disabled => "auto-rebalance disabled".to_string(),
        Decision::NoFunds => "nothing deposited".to_string(),
        Decision::AlreadyBest { protocol } => format!("already in best protocol ({})", protocol),
        Decision::BelowTolerance {
            to, improvement, ..
        } => format!("{} better by {}%, within tolerance", to, improvement),
        Decision::Rebalance {
            from,
            to,
            improvement,
        } => match improvement {
            Some(gain) => format!("rebalanced {} -> {} (+{}%)", from, to, gain),
            None => format!("rebalanced {} -> {}", from, to),
        },
    }
}

/// Combine scenario keeper settings with command-line overrides.
pub fn resolve_policy(scenario: &Scenario, overrides: &KeeperArgs) -> Result<RebalancePolicy> {
    let mut policy = scenario.keeper;
    if overrides.auto_rebalance {
        policy.auto_rebalance = true;
    }
    if let Some(tolerance) = overrides.tolerance {
        policy.tolerance = tolerance;
    }
    policy.validate()?;
    Ok(policy)
}

/// Run every step of `scenario` and collect the report.
pub fn run_scenario(
    scenario: &Scenario,
    policy: RebalancePolicy,
    history_limit: usize,
) -> Result<SimulationReport> {
    let mut simulation = Simulation::new(scenario, policy)?;

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (i, step) in scenario.steps.iter().enumerate() {
        steps.push(simulation.run_step(i + 1, step)?);
    }

    Ok(SimulationReport {
        scenario: scenario.name.clone(),
        description: scenario.description.clone(),
        steps,
        state: simulation.state_report()?,
        history: simulation
            .keeper()
            .history()
            .latest(history_limit)
            .into_iter()
            .cloned()
            .collect(),
    })
}

pub fn print_report(report: &SimulationReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if let Some(name) = &report.scenario {
                println!("Scenario: {}", name);
            }
            if let Some(description) = &report.description {
                println!("{}", description);
            }
            println!();
            println!("{}\n", format_steps_table(&report.steps));
            println!("{}", format_state_detail(&report.state));
            println!("{}", format_history_table(&report.history));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report)?;
            println!("{}", json);
        }
    }
    Ok(())
}

pub fn run_simulate(args: &SimulateArgs, format: OutputFormat) -> Result<()> {
    let scenario = Scenario::from_path(&args.scenario)?;
    let policy = resolve_policy(&scenario, &args.keeper)?;

    let report = run_scenario(&scenario, policy, args.history)?;
    print_report(&report, format)
}
