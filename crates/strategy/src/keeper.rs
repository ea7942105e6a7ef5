//! Auto-rebalance keeper.
//!
//! The optimizer's `rebalance` always follows the better rate, however small
//! the difference. The keeper adds a tolerance on top: it only sends a
//! rebalance when auto-rebalancing is enabled and the best protocol beats
//! the current one by more than `tolerance` percent (relative).

use alloy_primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use yield_optimizer_contracts::{Devnet, Protocol, ProtocolRates};

use crate::error::{Result, StrategyError};
use crate::history::{RebalanceHistory, RebalanceRecord};
use crate::units::rate_to_percent;

/// Default tolerance (5%).
pub const DEFAULT_TOLERANCE: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// When the keeper is allowed to rebalance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RebalancePolicy {
    /// Off by default.
    pub auto_rebalance: bool,
    /// Minimum relative improvement, in percent.
    pub tolerance: Decimal,
}

impl Default for RebalancePolicy {
    fn default() -> Self {
        Self {
            auto_rebalance: false,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Outcome of evaluating the policy against the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "kebab-case")]
pub enum Decision {
    /// Auto-rebalancing is switched off.
    Disabled,
    /// Nothing is deposited at the selected protocol.
    NoFunds,
    /// The selected protocol is already the best one.
    AlreadyBest { protocol: Protocol },
    /// A better protocol exists but the gain is within tolerance.
    BelowTolerance {
        from: Protocol,
        to: Protocol,
        improvement: Decimal,
    },
    /// Move funds. `improvement` is `None` when the current rate is zero.
    Rebalance {
        from: Protocol,
        to: Protocol,
        improvement: Option<Decimal>,
    },
}

impl Decision {
    pub fn should_rebalance(&self) -> bool {
        matches!(self, Decision::Rebalance { .. })
    }
}

impl RebalancePolicy {
    /// Create a policy, rejecting negative tolerances.
    pub fn new(auto_rebalance: bool, tolerance: Decimal) -> Result<Self> {
        let policy = Self {
            auto_rebalance,
            tolerance,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tolerance.is_sign_negative() && !self.tolerance.is_zero() {
            return Err(StrategyError::InvalidTolerance(self.tolerance));
        }
        Ok(())
    }

    /// Decide whether to rebalance away from `current` given `rates`.
    ///
    /// `funded` is whether the selected protocol holds a nonzero balance.
    pub fn evaluate(
        &self,
        current: Protocol,
        rates: &ProtocolRates,
        funded: bool,
    ) -> Result<Decision> {
        if !self.auto_rebalance {
            return Ok(Decision::Disabled);
        }
        if current == Protocol::None || !funded {
            return Ok(Decision::NoFunds);
        }

        let best = rates.best();
        if best == current {
            return Ok(Decision::AlreadyBest { protocol: current });
        }

        let current_rate = rate_to_percent(rates.rate_of(current))?;
        let best_rate = rate_to_percent(rates.rate_of(best))?;

        if best_rate <= current_rate {
            // Tie resolved toward Compound; no gain to speak of.
            return Ok(Decision::BelowTolerance {
                from: current,
                to: best,
                improvement: Decimal::ZERO,
            });
        }

        // A zero current rate, or a gap too wide for `Decimal`, is unbounded.
        let Some(improvement) = relative_gain(current_rate, best_rate) else {
            return Ok(Decision::Rebalance {
                from: current,
                to: best,
                improvement: None,
            });
        };

        if improvement > self.tolerance {
            Ok(Decision::Rebalance {
                from: current,
                to: best,
                improvement: Some(improvement),
            })
        } else {
            Ok(Decision::BelowTolerance {
                from: current,
                to: best,
                improvement,
            })
        }
    }
}

/// Percent gain of `best` over `current`, rounded to 4 places.
fn relative_gain(current: Decimal, best: Decimal) -> Option<Decimal> {
    best.checked_sub(current)?
        .checked_div(current)?
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|gain| gain.round_dp(4))
}

/// Sends policy-gated rebalances and records each migration.
#[derive(Debug, Clone)]
pub struct Keeper {
    address: Address,
    policy: RebalancePolicy,
    history: RebalanceHistory,
}

impl Keeper {
    /// Create a keeper that sends transactions from `address`.
    pub fn new(address: Address, policy: RebalancePolicy) -> Self {
        Self {
            address,
            policy,
            history: RebalanceHistory::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn policy(&self) -> &RebalancePolicy {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: RebalancePolicy) -> Result<()> {
        policy.validate()?;
        self.policy = policy;
        Ok(())
    }

    pub fn history(&self) -> &RebalanceHistory {
        &self.history
    }

    /// Evaluate the policy against `devnet` without sending anything.
    pub fn evaluate(&self, devnet: &Devnet) -> Result<Decision> {
        let current = devnet.optimizer().current_protocol();
        let funded = !devnet.total_balance().is_zero();
        self.policy
            .evaluate(current, &devnet.protocol_rates(), funded)
    }

    /// Evaluate, and rebalance if the policy says so.
    pub fn tick(&mut self, devnet: &mut Devnet) -> Result<Decision> {
        let decision = self.evaluate(devnet)?;
        debug!(?decision, "keeper evaluated");

        if decision.should_rebalance() {
            if let Some(record) = self.rebalance_now(devnet)? {
                info!(
                    id = record.id,
                    from = %record.old_pool,
                    to = %record.new_pool,
                    amount = %record.amount,
                    "keeper rebalanced"
                );
            }
        }
        Ok(decision)
    }

    /// Rebalance regardless of policy, recording the migration if one happened.
    pub fn rebalance_now(&mut self, devnet: &mut Devnet) -> Result<Option<RebalanceRecord>> {
        self.rebalance_as(devnet, self.address)
    }

    /// Send a rebalance from `caller` and record the migration in this
    /// keeper's history.
    pub fn rebalance_as(
        &mut self,
        devnet: &mut Devnet,
        caller: Address,
    ) -> Result<Option<RebalanceRecord>> {
        let rates = devnet.protocol_rates();
        let receipt = devnet.rebalance(caller)?;

        match receipt.output {
            Some(migration) => {
                let record = self.history.record(
                    &migration,
                    &rates,
                    receipt.block_number,
                    receipt.timestamp,
                )?;
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }
}
