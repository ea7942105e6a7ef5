//! Scenario files.
//!
//! A scenario is a TOML document describing initial rates, funded accounts,
//! keeper settings and an ordered list of steps. Amounts and rates are
//! human-readable decimal strings.
//!
//! ```toml
//! name = "Rate flip"
//!
//! [rates]
//! aave = "3"
//! compound = "4"
//!
//! [keeper]
//! auto-rebalance = true
//! tolerance = "5"
//!
//! [[accounts]]
//! name = "alice"
//! balance = "100000"
//!
//! [[steps]]
//! action = "deposit"
//! from = "alice"
//! amount = "10000"
//!
//! [[steps]]
//! action = "withdraw"
//! amount = "20000"
//! expect-revert = "Insufficient balance"
//! ```

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use yield_optimizer_contracts::Protocol;
use yield_optimizer_strategy::RebalancePolicy;

/// A parsed scenario file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Rates to set before the first step. Deployment rates apply if absent.
    #[serde(default)]
    pub rates: Option<InitialRates>,
    #[serde(default)]
    pub keeper: RebalancePolicy,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Initial rate quotes, in percent.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitialRates {
    pub aave: String,
    pub compound: String,
}

/// A named account, optionally funded from the deployer's initial supply.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountConfig {
    pub name: String,
    #[serde(default)]
    pub balance: Option<String>,
}

/// One step and the revert it is expected to produce, if any.
#[derive(Debug, Clone)]
pub struct Step {
    pub action: Action,
    /// Substring of the expected revert reason.
    pub expect_revert: Option<String>,
}

/// Split `expect-revert` off the step table and parse the rest as an
/// [`Action`], so unknown keys are still rejected.
impl<'de> Deserialize<'de> for Step {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut table = toml::Table::deserialize(deserializer)?;
        let expect_revert = match table.remove("expect-revert") {
            None => None,
            Some(toml::Value::String(reason)) => Some(reason),
            Some(other) => {
                return Err(de::Error::custom(format!(
                    "expect-revert must be a string, found {}",
                    other.type_str()
                )))
            }
        };
        let action = Action::deserialize(toml::Value::Table(table)).map_err(de::Error::custom)?;
        Ok(Self {
            action,
            expect_revert,
        })
    }
}

impl Step {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            expect_revert: None,
        }
    }

    #[cfg(test)]
    pub fn expecting_revert(mut self, reason: impl Into<String>) -> Self {
        self.expect_revert = Some(reason.into());
        self
    }
}

/// What a step does. `from` defaults to the owner.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case", deny_unknown_fields)]
pub enum Action {
    SetRate {
        protocol: Protocol,
        rate: String,
    },
    Deposit {
        #[serde(default)]
        from: Option<String>,
        amount: String,
    },
    Withdraw {
        #[serde(default)]
        from: Option<String>,
        amount: String,
    },
    Rebalance {
        #[serde(default)]
        from: Option<String>,
    },
    KeeperTick {},
    TransferOwnership {
        #[serde(default)]
        from: Option<String>,
        to: String,
    },
    RenounceOwnership {
        #[serde(default)]
        from: Option<String>,
    },
    AdvanceTime {
        seconds: u64,
    },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let caller = |from: &Option<String>| from.clone().unwrap_or_else(|| "owner".to_string());
        match self {
            Action::SetRate { protocol, rate } => write!(f, "set {} rate to {}%", protocol, rate),
            Action::Deposit { from, amount } => {
                write!(f, "deposit {} USDC from {}", amount, caller(from))
            }
            Action::Withdraw { from, amount } => {
                write!(f, "withdraw {} USDC as {}", amount, caller(from))
            }
            Action::Rebalance { from } => write!(f, "rebalance as {}", caller(from)),
            Action::KeeperTick {} => write!(f, "keeper tick"),
            Action::TransferOwnership { from, to } => {
                write!(f, "transfer ownership from {} to {}", caller(from), to)
            }
            Action::RenounceOwnership { from } => {
                write!(f, "renounce ownership as {}", caller(from))
            }
            Action::AdvanceTime { seconds } => write!(f, "advance time {}s", seconds),
        }
    }
}

impl Scenario {
    /// Load a scenario from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse scenario file: {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(contents)?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<()> {
        self.keeper.validate()?;
        let mut seen = std::collections::HashSet::new();
        for account in &self.accounts {
            if account.name == "owner" || account.name == "keeper" {
                anyhow::bail!("Account name is reserved: {}", account.name);
            }
            if !seen.insert(account.name.as_str()) {
                anyhow::bail!("Duplicate account name: {}", account.name);
            }
        }
        Ok(())
    }
}
