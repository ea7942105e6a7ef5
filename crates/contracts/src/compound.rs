//! Compound-V3-like single-asset market mock.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use tracing::debug;

use crate::erc20::Erc20;
use crate::error::{ContractError, Result};
use crate::events::EventLog;

/// Single-asset market with a supply/redeem pair and a settable supply rate.
#[derive(Debug, Clone)]
pub struct MockCompoundV3 {
    address: Address,
    base_token: Address,
    balances: HashMap<Address, U256>,
    supply_rates: HashMap<Address, U256>,
}

impl MockCompoundV3 {
    /// Create a market that lists only `base_token`.
    pub fn new(address: Address, base_token: Address) -> Self {
        Self {
            address,
            base_token,
            balances: HashMap::new(),
            supply_rates: HashMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn base_token(&self) -> Address {
        self.base_token
    }

    fn ensure_base_token(&self, asset: &Erc20) -> Result<()> {
        if asset.address() != self.base_token {
            return Err(ContractError::UnsupportedAsset {
                asset: asset.address(),
            });
        }
        Ok(())
    }

    /// Pull `amount` from `caller` and credit it to `caller`.
    pub fn supply(
        &mut self,
        asset: &mut Erc20,
        log: &mut EventLog,
        caller: Address,
        amount: U256,
    ) -> Result<()> {
        self.ensure_base_token(asset)?;
        asset.transfer_from(log, self.address, caller, self.address, amount)?;

        let balance = self.get_balance(caller);
        let updated = balance
            .checked_add(amount)
            .ok_or(ContractError::ArithmeticOverflow)?;
        self.balances.insert(caller, updated);

        debug!(%caller, %amount, "compound supply");
        Ok(())
    }

    /// Debit `caller` and return `amount` of the base token to them.
    pub fn redeem(
        &mut self,
        asset: &mut Erc20,
        log: &mut EventLog,
        caller: Address,
        amount: U256,
    ) -> Result<()> {
        self.ensure_base_token(asset)?;

        let balance = self.get_balance(caller);
        if balance < amount {
            return Err(ContractError::InsufficientBalance {
                have: balance,
                need: amount,
            });
        }
        self.balances.insert(caller, balance - amount);

        asset.transfer(log, self.address, caller, amount)?;

        debug!(%caller, %amount, "compound redeem");
        Ok(())
    }

    /// Supply rate quote for `asset` (8 fractional digits). Zero until set.
    pub fn get_supply_rate(&self, asset: Address) -> U256 {
        self.supply_rates.get(&asset).copied().unwrap_or_default()
    }

    pub fn set_supply_rate(&mut self, asset: Address, rate: U256) {
        self.supply_rates.insert(asset, rate);
    }

    pub fn get_balance(&self, depositor: Address) -> U256 {
        self.balances.get(&depositor).copied().unwrap_or_default()
    }
}
