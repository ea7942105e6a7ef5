//! Protocol selector and the lending capability the optimizer routes through.
//!
//! The optimizer never touches a concrete pool type. It sees two
//! [`LendingProtocol`] trait objects bundled with the managed asset in
//! [`Venues`] / [`VenuesMut`], and picks one by [`Protocol`] tag.

use std::fmt;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::aave::MockAaveV3;
use crate::compound::MockCompoundV3;
use crate::erc20::Erc20;
use crate::error::{ContractError, Result};
use crate::events::EventLog;

/// Which protocol custodies the pooled balance.
///
/// Discriminants match the values carried in `Deposited` and `Rebalanced` logs.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Nothing deposited yet
    #[default]
    None = 0,
    Aave = 1,
    Compound = 2,
}

impl Protocol {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Protocol::None),
            1 => Some(Protocol::Aave),
            2 => Some(Protocol::Compound),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Protocol::None => "None",
            Protocol::Aave => "Aave",
            Protocol::Compound => "Compound",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A lending backend as seen by the optimizer.
///
/// Implementations move custody through the asset ledger: `deposit_funds`
/// pulls from a depositor that has approved the protocol, `withdraw_funds`
/// always returns funds to the depositor.
pub trait LendingProtocol {
    /// Address the protocol holds tokens under.
    fn address(&self) -> Address;

    fn deposit_funds(
        &mut self,
        asset: &mut Erc20,
        log: &mut EventLog,
        depositor: Address,
        amount: U256,
    ) -> Result<()>;

    fn withdraw_funds(
        &mut self,
        asset: &mut Erc20,
        log: &mut EventLog,
        depositor: Address,
        amount: U256,
    ) -> Result<()>;

    /// Balance recorded for `depositor` in `asset`.
    fn current_balance(&self, asset: Address, depositor: Address) -> U256;

    /// Current rate quote for `asset`.
    fn current_rate(&self, asset: Address) -> U256;
}

impl LendingProtocol for MockAaveV3 {
    fn address(&self) -> Address {
        MockAaveV3::address(self)
    }

    fn deposit_funds(
        &mut self,
        asset: &mut Erc20,
        log: &mut EventLog,
        depositor: Address,
        amount: U256,
    ) -> Result<()> {
        self.deposit(asset, log, depositor, amount, depositor, 0)
    }

    fn withdraw_funds(
        &mut self,
        asset: &mut Erc20,
        log: &mut EventLog,
        depositor: Address,
        amount: U256,
    ) -> Result<()> {
        self.withdraw(asset, log, depositor, amount, depositor)?;
        Ok(())
    }

    fn current_balance(&self, asset: Address, depositor: Address) -> U256 {
        self.get_balance(depositor, asset)
    }

    fn current_rate(&self, asset: Address) -> U256 {
        self.get_interest_rate(asset)
    }
}

impl LendingProtocol for MockCompoundV3 {
    fn address(&self) -> Address {
        MockCompoundV3::address(self)
    }

    fn deposit_funds(
        &mut self,
        asset: &mut Erc20,
        log: &mut EventLog,
        depositor: Address,
        amount: U256,
    ) -> Result<()> {
        self.supply(asset, log, depositor, amount)
    }

    fn withdraw_funds(
        &mut self,
        asset: &mut Erc20,
        log: &mut EventLog,
        depositor: Address,
        amount: U256,
    ) -> Result<()> {
        self.redeem(asset, log, depositor, amount)
    }

    fn current_balance(&self, _asset: Address, depositor: Address) -> U256 {
        self.get_balance(depositor)
    }

    fn current_rate(&self, asset: Address) -> U256 {
        self.get_supply_rate(asset)
    }
}

/// Read-only view of the managed asset and both protocols.
#[derive(Clone, Copy)]
pub struct Venues<'a> {
    pub asset: &'a Erc20,
    pub aave: &'a dyn LendingProtocol,
    pub compound: &'a dyn LendingProtocol,
}

impl<'a> Venues<'a> {
    pub fn new(
        asset: &'a Erc20,
        aave: &'a dyn LendingProtocol,
        compound: &'a dyn LendingProtocol,
    ) -> Self {
        Self {
            asset,
            aave,
            compound,
        }
    }

    /// The protocol a selector points at, `None` for [`Protocol::None`].
    pub fn protocol(&self, selector: Protocol) -> Option<&'a dyn LendingProtocol> {
        match selector {
            Protocol::None => None,
            Protocol::Aave => Some(self.aave),
            Protocol::Compound => Some(self.compound),
        }
    }
}

/// Mutable access to the managed asset and both protocols for one call.
pub struct VenuesMut<'a> {
    pub asset: &'a mut Erc20,
    pub aave: &'a mut dyn LendingProtocol,
    pub compound: &'a mut dyn LendingProtocol,
}

impl<'a> VenuesMut<'a> {
    pub fn new(
        asset: &'a mut Erc20,
        aave: &'a mut dyn LendingProtocol,
        compound: &'a mut dyn LendingProtocol,
    ) -> Self {
        Self {
            asset,
            aave,
            compound,
        }
    }

    /// Reborrow as a read-only view.
    pub fn view(&self) -> Venues<'_> {
        Venues {
            asset: &*self.asset,
            aave: &*self.aave,
            compound: &*self.compound,
        }
    }

    /// Split into the selected protocol and the asset ledger.
    ///
    /// Reverts with `NoFundsDeposited` for [`Protocol::None`].
    pub fn route(
        &mut self,
        selector: Protocol,
    ) -> Result<(&mut (dyn LendingProtocol + 'a), &mut Erc20)> {
        match selector {
            Protocol::None => Err(ContractError::NoFundsDeposited),
            Protocol::Aave => Ok((&mut *self.aave, &mut *self.asset)),
            Protocol::Compound => Ok((&mut *self.compound, &mut *self.asset)),
        }
    }
}
