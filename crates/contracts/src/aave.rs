//! Aave-V3-like lending pool mock.
//!
//! Balances are kept per depositor and per asset. Rates are informational:
//! they never accrue onto stored balances.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use tracing::debug;

use crate::erc20::Erc20;
use crate::error::{ContractError, Result};
use crate::events::EventLog;

/// Multi-asset pool with a deposit/withdraw pair and a settable interest rate.
#[derive(Debug, Clone)]
pub struct MockAaveV3 {
    address: Address,
    /// Keyed by (depositor, asset)
    balances: HashMap<(Address, Address), U256>,
    interest_rates: HashMap<Address, U256>,
}

impl MockAaveV3 {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balances: HashMap::new(),
            interest_rates: HashMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Pull `amount` of `asset` from `caller` and credit it to `on_behalf_of`.
    ///
    /// The caller must have approved this pool for at least `amount`.
    pub fn deposit(
        &mut self,
        asset: &mut Erc20,
        log: &mut EventLog,
        caller: Address,
        amount: U256,
        on_behalf_of: Address,
        referral_code: u16,
    ) -> Result<()> {
        asset.transfer_from(log, self.address, caller, self.address, amount)?;

        let key = (on_behalf_of, asset.address());
        let balance = self.balances.get(&key).copied().unwrap_or_default();
        let updated = balance
            .checked_add(amount)
            .ok_or(ContractError::ArithmeticOverflow)?;
        self.balances.insert(key, updated);

        debug!(%caller, %on_behalf_of, %amount, referral_code, "aave deposit");
        Ok(())
    }

    /// Debit `caller`'s balance of `asset` and send `amount` to `to`.
    pub fn withdraw(
        &mut self,
        asset: &mut Erc20,
        log: &mut EventLog,
        caller: Address,
        amount: U256,
        to: Address,
    ) -> Result<U256> {
        let key = (caller, asset.address());
        let balance = self.balances.get(&key).copied().unwrap_or_default();
        if balance < amount {
            return Err(ContractError::InsufficientBalance {
                have: balance,
                need: amount,
            });
        }
        self.balances.insert(key, balance - amount);

        asset.transfer(log, self.address, to, amount)?;

        debug!(%caller, %to, %amount, "aave withdraw");
        Ok(amount)
    }

    /// Rate quote for `asset` (8 fractional digits). Zero until set.
    pub fn get_interest_rate(&self, asset: Address) -> U256 {
        self.interest_rates.get(&asset).copied().unwrap_or_default()
    }

    pub fn set_interest_rate(&mut self, asset: Address, rate: U256) {
        self.interest_rates.insert(asset, rate);
    }

    pub fn get_balance(&self, depositor: Address, asset: Address) -> U256 {
        self.balances
            .get(&(depositor, asset))
            .copied()
            .unwrap_or_default()
    }
}
