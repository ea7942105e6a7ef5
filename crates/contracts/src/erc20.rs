//! Fungible token ledger.
//!
//! A standard ERC-20 with OpenZeppelin revert semantics. Both lending
//! protocols and the optimizer move custody exclusively through this ledger.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use tracing::trace;

use crate::error::{ContractError, Result};
use crate::events::{Approval, EventLog, Transfer};

/// Decimals of the mock stablecoin.
pub const USDC_DECIMALS: u8 = 6;

/// Supply minted to the deployer of the mock stablecoin (1,000,000 USDC).
pub const MOCK_USDC_INITIAL_SUPPLY: U256 = U256::from_limbs([1_000_000_000_000, 0, 0, 0]);

/// An ERC-20 token ledger.
#[derive(Debug, Clone)]
pub struct Erc20 {
    address: Address,
    name: String,
    symbol: String,
    decimals: u8,
    total_supply: U256,
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
}

impl Erc20 {
    /// Create an empty token at `address`.
    pub fn new(address: Address, name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            address,
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            total_supply: U256::ZERO,
            balances: HashMap::new(),
            allowances: HashMap::new(),
        }
    }

    /// Deploy the mock stablecoin, minting the initial supply to `deployer`.
    pub fn mock_usdc(log: &mut EventLog, address: Address, deployer: Address) -> Result<Self> {
        let mut token = Self::new(address, "Mock USDC", "USDC", USDC_DECIMALS);
        token.mint(log, deployer, MOCK_USDC_INITIAL_SUPPLY)?;
        Ok(token)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    /// Create `amount` new tokens for `to`.
    pub fn mint(&mut self, log: &mut EventLog, to: Address, amount: U256) -> Result<()> {
        if to.is_zero() {
            return Err(ContractError::Erc20InvalidReceiver { receiver: to });
        }
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(ContractError::ArithmeticOverflow)?;
        // Cannot overflow: every balance is bounded by total supply.
        let balance = self.balance_of(to);
        self.balances.insert(to, balance + amount);

        log.emit(
            self.address,
            &Transfer {
                from: Address::ZERO,
                to,
                value: amount,
            },
        );
        Ok(())
    }

    /// Move `amount` from `caller` to `to`.
    pub fn transfer(
        &mut self,
        log: &mut EventLog,
        caller: Address,
        to: Address,
        amount: U256,
    ) -> Result<()> {
        self.move_balance(log, caller, to, amount)
    }

    /// Let `spender` move up to `amount` of `caller`'s tokens.
    pub fn approve(
        &mut self,
        log: &mut EventLog,
        caller: Address,
        spender: Address,
        amount: U256,
    ) -> Result<()> {
        if caller.is_zero() {
            return Err(ContractError::Erc20InvalidSender { sender: caller });
        }
        if spender.is_zero() {
            return Err(ContractError::Erc20InvalidReceiver { receiver: spender });
        }
        self.allowances.insert((caller, spender), amount);

        log.emit(
            self.address,
            &Approval {
                owner: caller,
                spender,
                value: amount,
            },
        );
        Ok(())
    }

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming allowance.
    ///
    /// An allowance of `U256::MAX` is treated as unlimited and never decremented.
    pub fn transfer_from(
        &mut self,
        log: &mut EventLog,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<()> {
        let allowance = self.allowance(from, spender);
        if allowance != U256::MAX {
            if allowance < amount {
                return Err(ContractError::Erc20InsufficientAllowance {
                    spender,
                    allowance,
                    needed: amount,
                });
            }
            self.allowances.insert((from, spender), allowance - amount);
        }
        self.move_balance(log, from, to, amount)
    }

    fn move_balance(
        &mut self,
        log: &mut EventLog,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<()> {
        if from.is_zero() {
            return Err(ContractError::Erc20InvalidSender { sender: from });
        }
        if to.is_zero() {
            return Err(ContractError::Erc20InvalidReceiver { receiver: to });
        }

        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(ContractError::Erc20InsufficientBalance {
                sender: from,
                balance: from_balance,
                needed: amount,
            });
        }
        self.balances.insert(from, from_balance - amount);
        let to_balance = self.balance_of(to);
        self.balances.insert(to, to_balance + amount);

        trace!(token = %self.symbol, %from, %to, %amount, "transfer");
        log.emit(
            self.address,
            &Transfer {
                from,
                to,
                value: amount,
            },
        );
        Ok(())
    }
}
