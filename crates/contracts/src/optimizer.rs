//! The yield optimizer: routes a pooled stablecoin balance to whichever of
//! two lending protocols quotes the higher rate.
//!
//! # Lifecycle
//!
//! The selector starts at [`Protocol::None`]. The first deposit moves it to
//! the protocol winning the rate comparison at that moment; afterwards only
//! [`YieldOptimizer::deposit`] and [`YieldOptimizer::rebalance`] change it.
//! Withdrawals never reset it, so a fully drained optimizer keeps pointing at
//! an empty protocol until the next deposit or rebalance.
//!
//! # Custody
//!
//! Both protocols record the optimizer's address as the depositor. Anyone may
//! deposit; only the owner may withdraw, and proceeds go to the owner.
//!
//! Every mutating entry point writes the selector before calling out to a
//! protocol. Calls are expected to run inside a transaction that discards all
//! state on error (see [`crate::devnet::Devnet`]).

use alloy_primitives::{Address, U256};
use tracing::{debug, info};

use crate::error::{ContractError, Result};
use crate::events::{Deposited, EventLog, OwnershipTransferred, Rebalanced, Withdrawn};
use crate::protocol::{Protocol, Venues, VenuesMut};

/// Rate quotes read from both protocols for the managed asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolRates {
    pub aave: U256,
    pub compound: U256,
}

impl ProtocolRates {
    /// Compound wins unless Aave is strictly higher.
    pub fn best(&self) -> Protocol {
        if self.aave > self.compound {
            Protocol::Aave
        } else {
            Protocol::Compound
        }
    }

    /// Rate quoted by `protocol`; zero for [`Protocol::None`].
    pub fn rate_of(&self, protocol: Protocol) -> U256 {
        match protocol {
            Protocol::None => U256::ZERO,
            Protocol::Aave => self.aave,
            Protocol::Compound => self.compound,
        }
    }
}

/// Balances the optimizer holds at each protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProtocolBalances {
    pub aave: U256,
    pub compound: U256,
}

impl ProtocolBalances {
    /// Sum across both protocols.
    pub fn total(&self) -> U256 {
        self.aave.saturating_add(self.compound)
    }
}

/// A completed migration between protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub from: Protocol,
    pub to: Protocol,
    pub amount: U256,
}

/// Optimizer state.
#[derive(Debug, Clone)]
pub struct YieldOptimizer {
    address: Address,
    owner: Address,
    usdc: Address,
    aave: Address,
    compound: Address,
    data_provider: Option<Address>,
    current_protocol: Protocol,
}

impl YieldOptimizer {
    /// Deploy at `address` with `deployer` as owner.
    pub fn new(
        address: Address,
        deployer: Address,
        aave: Address,
        compound: Address,
        usdc: Address,
    ) -> Self {
        Self {
            address,
            owner: deployer,
            usdc,
            aave,
            compound,
            data_provider: None,
            current_protocol: Protocol::None,
        }
    }

    /// Record an Aave data provider address. It is stored for callers that
    /// want richer Aave reads and plays no part in routing.
    pub fn with_data_provider(mut self, data_provider: Address) -> Self {
        self.data_provider = Some(data_provider);
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    /// The managed stablecoin.
    pub fn usdc(&self) -> Address {
        self.usdc
    }

    pub fn aave(&self) -> Address {
        self.aave
    }

    pub fn compound(&self) -> Address {
        self.compound
    }

    pub fn data_provider(&self) -> Option<Address> {
        self.data_provider
    }

    pub fn current_protocol(&self) -> Protocol {
        self.current_protocol
    }

    // ==================== Views ====================

    pub fn protocol_rates(&self, venues: Venues<'_>) -> ProtocolRates {
        ProtocolRates {
            aave: venues.aave.current_rate(self.usdc),
            compound: venues.compound.current_rate(self.usdc),
        }
    }

    /// The protocol the next deposit or rebalance would target. Never `None`.
    pub fn get_best_protocol(&self, venues: Venues<'_>) -> Protocol {
        self.protocol_rates(venues).best()
    }

    /// Balance held at the currently selected protocol only.
    ///
    /// Funds left at the other protocol (a deposit routed elsewhere after a
    /// rate flip, with no rebalance since) are not included; see
    /// [`YieldOptimizer::protocol_balances`].
    pub fn get_total_balance(&self, venues: Venues<'_>) -> U256 {
        venues
            .protocol(self.current_protocol)
            .map_or(U256::ZERO, |p| p.current_balance(self.usdc, self.address))
    }

    pub fn protocol_balances(&self, venues: Venues<'_>) -> ProtocolBalances {
        ProtocolBalances {
            aave: venues.aave.current_balance(self.usdc, self.address),
            compound: venues.compound.current_balance(self.usdc, self.address),
        }
    }

    // ==================== Mutations ====================

    /// Pull `amount` from `caller` and forward it to the best-rated protocol.
    ///
    /// Existing funds at the other protocol are not consolidated.
    pub fn deposit(
        &mut self,
        venues: &mut VenuesMut<'_>,
        log: &mut EventLog,
        caller: Address,
        amount: U256,
    ) -> Result<Protocol> {
        if amount.is_zero() {
            return Err(ContractError::ZeroAmount);
        }

        venues
            .asset
            .transfer_from(log, self.address, caller, self.address, amount)?;

        let best = self.get_best_protocol(venues.view());
        self.current_protocol = best;

        let (protocol, asset) = venues.route(best)?;
        let target = protocol.address();
        asset.approve(log, self.address, target, amount)?;
        protocol.deposit_funds(asset, log, self.address, amount)?;

        log.emit(
            self.address,
            &Deposited {
                user: caller,
                amount,
                protocol: best.as_u8(),
            },
        );
        info!(%caller, %amount, protocol = %best, "deposit routed");
        Ok(best)
    }

    /// Owner-only: withdraw `amount` from the selected protocol to the owner.
    pub fn withdraw(
        &mut self,
        venues: &mut VenuesMut<'_>,
        log: &mut EventLog,
        caller: Address,
        amount: U256,
    ) -> Result<()> {
        self.only_owner(caller)?;
        if amount.is_zero() {
            return Err(ContractError::ZeroAmount);
        }
        if self.current_protocol == Protocol::None {
            return Err(ContractError::NoFundsDeposited);
        }

        let (protocol, asset) = venues.route(self.current_protocol)?;
        protocol.withdraw_funds(asset, log, self.address, amount)?;
        asset.transfer(log, self.address, self.owner, amount)?;

        log.emit(
            self.address,
            &Withdrawn {
                user: self.owner,
                amount,
            },
        );
        info!(owner = %self.owner, %amount, protocol = %self.current_protocol, "withdrawn");
        Ok(())
    }

    /// Move the whole balance at the selected protocol to the best-rated one.
    ///
    /// Callable by anyone. Returns `None` without touching any protocol when
    /// nothing has been deposited or the selection is already the best.
    pub fn rebalance(
        &mut self,
        venues: &mut VenuesMut<'_>,
        log: &mut EventLog,
    ) -> Result<Option<Migration>> {
        let from = self.current_protocol;
        if from == Protocol::None {
            debug!("rebalance skipped: no funds deposited");
            return Ok(None);
        }

        let to = self.get_best_protocol(venues.view());
        if to == from {
            debug!(protocol = %from, "rebalance skipped: already in best protocol");
            return Ok(None);
        }

        let amount = self.get_total_balance(venues.view());
        self.current_protocol = to;

        let (source, asset) = venues.route(from)?;
        source.withdraw_funds(asset, log, self.address, amount)?;

        let (target, asset) = venues.route(to)?;
        let target_address = target.address();
        asset.approve(log, self.address, target_address, amount)?;
        target.deposit_funds(asset, log, self.address, amount)?;

        log.emit(
            self.address,
            &Rebalanced {
                from_protocol: from.as_u8(),
                to_protocol: to.as_u8(),
                amount,
            },
        );
        info!(%from, %to, %amount, "rebalanced");
        Ok(Some(Migration { from, to, amount }))
    }

    pub fn transfer_ownership(
        &mut self,
        log: &mut EventLog,
        caller: Address,
        new_owner: Address,
    ) -> Result<()> {
        self.only_owner(caller)?;
        if new_owner.is_zero() {
            return Err(ContractError::OwnableInvalidOwner { owner: new_owner });
        }
        self.set_owner(log, new_owner);
        Ok(())
    }

    /// Give up ownership. Withdrawals become impossible afterwards.
    pub fn renounce_ownership(&mut self, log: &mut EventLog, caller: Address) -> Result<()> {
        self.only_owner(caller)?;
        self.set_owner(log, Address::ZERO);
        Ok(())
    }

    fn set_owner(&mut self, log: &mut EventLog, new_owner: Address) {
        let previous_owner = self.owner;
        self.owner = new_owner;
        log.emit(
            self.address,
            &OwnershipTransferred {
                previous_owner,
                new_owner,
            },
        );
        info!(%previous_owner, %new_owner, "ownership transferred");
    }

    fn only_owner(&self, caller: Address) -> Result<()> {
        if caller != self.owner {
            return Err(ContractError::OwnableUnauthorizedAccount { account: caller });
        }
        Ok(())
    }
}
