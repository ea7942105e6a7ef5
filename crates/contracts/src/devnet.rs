//! In-memory execution environment.
//!
//! [`Devnet`] owns the deployed contracts and runs every state-changing call
//! as a transaction: the world state is snapshotted first and restored if the
//! call reverts, so a failed call leaves no partial writes and no logs.
//! Successful calls mine one block each.

use alloy_primitives::{keccak256, Address, Log, U256};
use alloy_sol_types::SolEvent;
use tracing::{debug, warn};

use crate::aave::MockAaveV3;
use crate::compound::MockCompoundV3;
use crate::erc20::Erc20;
use crate::error::Result;
use crate::events::{decode_events, EventLog};
use crate::optimizer::{Migration, ProtocolBalances, ProtocolRates, YieldOptimizer};
use crate::protocol::{Protocol, Venues, VenuesMut};

/// Timestamp of the genesis block.
pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

/// Seconds between consecutive blocks.
pub const BLOCK_TIME: u64 = 12;

/// Aave rate set at deployment (3%).
pub const INITIAL_AAVE_RATE: U256 = U256::from_limbs([300_000_000, 0, 0, 0]);

/// Compound rate set at deployment (2.5%).
pub const INITIAL_COMPOUND_RATE: U256 = U256::from_limbs([250_000_000, 0, 0, 0]);

/// Deterministic test account `index`. Account 0 deploys everything.
///
/// Every index maps to a distinct nonzero address, `0xacc0…00{index}`.
pub fn account(index: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = 0xac;
    bytes[1] = 0xc0;
    bytes[19] = index;
    Address::from(bytes)
}

/// Address of the contract `deployer` creates with `nonce`.
fn contract_address(deployer: Address, nonce: u64) -> Address {
    let mut preimage = [0u8; 28];
    preimage[..20].copy_from_slice(deployer.as_slice());
    preimage[20..].copy_from_slice(&nonce.to_be_bytes());
    Address::from_word(keccak256(preimage))
}

/// Every contract's storage.
#[derive(Debug, Clone)]
pub struct WorldState {
    pub usdc: Erc20,
    pub aave: MockAaveV3,
    pub compound: MockCompoundV3,
    pub optimizer: YieldOptimizer,
}

impl WorldState {
    pub fn venues(&self) -> Venues<'_> {
        Venues::new(&self.usdc, &self.aave, &self.compound)
    }

    /// Borrow the optimizer and the venues it routes through at once.
    pub fn split(&mut self) -> (&mut YieldOptimizer, VenuesMut<'_>) {
        (
            &mut self.optimizer,
            VenuesMut::new(&mut self.usdc, &mut self.aave, &mut self.compound),
        )
    }
}

/// A log together with the block that included it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinedLog {
    pub block_number: u64,
    pub timestamp: u64,
    pub log: Log,
}

/// Outcome of a committed transaction.
#[derive(Debug, Clone)]
pub struct Receipt<T> {
    pub block_number: u64,
    pub timestamp: u64,
    pub logs: Vec<Log>,
    /// Value returned by the call
    pub output: T,
}

impl<T> Receipt<T> {
    /// Decode the logs of one event type.
    pub fn events<E: SolEvent>(&self) -> Vec<E> {
        decode_events(&self.logs)
    }
}

/// A single-node chain holding the mock stablecoin, both lending protocols
/// and the optimizer.
#[derive(Debug, Clone)]
pub struct Devnet {
    state: WorldState,
    deployer: Address,
    block_number: u64,
    timestamp: u64,
    logs: Vec<MinedLog>,
}

impl Devnet {
    /// Deploy the stablecoin, both protocols (with their initial rates) and
    /// the optimizer from `deployer`, who becomes the optimizer's owner.
    pub fn deploy(deployer: Address) -> Result<Self> {
        let mut log = EventLog::new();

        let usdc = Erc20::mock_usdc(&mut log, contract_address(deployer, 0), deployer)?;
        let mut aave = MockAaveV3::new(contract_address(deployer, 1));
        let mut compound = MockCompoundV3::new(contract_address(deployer, 2), usdc.address());

        aave.set_interest_rate(usdc.address(), INITIAL_AAVE_RATE);
        compound.set_supply_rate(usdc.address(), INITIAL_COMPOUND_RATE);

        let optimizer = YieldOptimizer::new(
            contract_address(deployer, 3),
            deployer,
            aave.address(),
            compound.address(),
            usdc.address(),
        );

        let genesis = log
            .into_logs()
            .into_iter()
            .map(|log| MinedLog {
                block_number: 0,
                timestamp: GENESIS_TIMESTAMP,
                log,
            })
            .collect();

        debug!(
            %deployer,
            usdc = %usdc.address(),
            aave = %aave.address(),
            compound = %compound.address(),
            optimizer = %optimizer.address(),
            "contracts deployed"
        );

        Ok(Self {
            state: WorldState {
                usdc,
                aave,
                compound,
                optimizer,
            },
            deployer,
            block_number: 0,
            timestamp: GENESIS_TIMESTAMP,
            logs: genesis,
        })
    }

    /// Run `call` against the world state as one transaction.
    ///
    /// On `Err` the state is restored to what it was before the call and the
    /// call's logs are dropped. On `Ok` a block is mined.
    pub fn transact<T, F>(&mut self, label: &str, call: F) -> Result<Receipt<T>>
    where
        F: FnOnce(&mut WorldState, &mut EventLog) -> Result<T>,
    {
        let snapshot = self.state.clone();
        let mut log = EventLog::new();

        match call(&mut self.state, &mut log) {
            Ok(output) => {
                self.block_number += 1;
                self.timestamp += BLOCK_TIME;
                let (block_number, timestamp) = (self.block_number, self.timestamp);
                let logs = log.into_logs();
                self.logs.extend(logs.iter().cloned().map(|log| MinedLog {
                    block_number,
                    timestamp,
                    log,
                }));
                debug!(tx = label, block = block_number, logs = logs.len(), "transaction mined");
                Ok(Receipt {
                    block_number,
                    timestamp,
                    logs,
                    output,
                })
            }
            Err(err) => {
                self.state = snapshot;
                warn!(tx = label, error = %err, "transaction reverted");
                Err(err)
            }
        }
    }

    // ==================== Stablecoin ====================

    pub fn mint(&mut self, to: Address, amount: U256) -> Result<Receipt<()>> {
        self.transact("usdc.mint", |state, log| state.usdc.mint(log, to, amount))
    }

    pub fn transfer(&mut self, caller: Address, to: Address, amount: U256) -> Result<Receipt<()>> {
        self.transact("usdc.transfer", |state, log| {
            state.usdc.transfer(log, caller, to, amount)
        })
    }

    pub fn approve(
        &mut self,
        caller: Address,
        spender: Address,
        amount: U256,
    ) -> Result<Receipt<()>> {
        self.transact("usdc.approve", |state, log| {
            state.usdc.approve(log, caller, spender, amount)
        })
    }

    // ==================== Lending protocols ====================

    pub fn set_aave_rate(&mut self, rate: U256) -> Result<Receipt<()>> {
        self.transact("aave.setInterestRate", |state, _| {
            let asset = state.usdc.address();
            state.aave.set_interest_rate(asset, rate);
            Ok(())
        })
    }

    pub fn set_compound_rate(&mut self, rate: U256) -> Result<Receipt<()>> {
        self.transact("compound.setSupplyRate", |state, _| {
            let asset = state.usdc.address();
            state.compound.set_supply_rate(asset, rate);
            Ok(())
        })
    }

    /// Deposit straight into the Aave mock, bypassing the optimizer.
    pub fn aave_deposit(
        &mut self,
        caller: Address,
        amount: U256,
        on_behalf_of: Address,
    ) -> Result<Receipt<()>> {
        self.transact("aave.deposit", |state, log| {
            state
                .aave
                .deposit(&mut state.usdc, log, caller, amount, on_behalf_of, 0)
        })
    }

    pub fn aave_withdraw(
        &mut self,
        caller: Address,
        amount: U256,
        to: Address,
    ) -> Result<Receipt<U256>> {
        self.transact("aave.withdraw", |state, log| {
            state.aave.withdraw(&mut state.usdc, log, caller, amount, to)
        })
    }

    /// Supply straight into the Compound mock, bypassing the optimizer.
    pub fn compound_supply(&mut self, caller: Address, amount: U256) -> Result<Receipt<()>> {
        self.transact("compound.supply", |state, log| {
            state.compound.supply(&mut state.usdc, log, caller, amount)
        })
    }

    pub fn compound_redeem(&mut self, caller: Address, amount: U256) -> Result<Receipt<()>> {
        self.transact("compound.redeem", |state, log| {
            state.compound.redeem(&mut state.usdc, log, caller, amount)
        })
    }

    // ==================== Optimizer ====================

    /// Deposit `amount` from `caller`, who must have approved the optimizer.
    pub fn deposit(&mut self, caller: Address, amount: U256) -> Result<Receipt<Protocol>> {
        self.transact("optimizer.deposit", |state, log| {
            let (optimizer, mut venues) = state.split();
            optimizer.deposit(&mut venues, log, caller, amount)
        })
    }

    pub fn withdraw(&mut self, caller: Address, amount: U256) -> Result<Receipt<()>> {
        self.transact("optimizer.withdraw", |state, log| {
            let (optimizer, mut venues) = state.split();
            optimizer.withdraw(&mut venues, log, caller, amount)
        })
    }

    /// Permissionless. The receipt output is `None` when nothing moved.
    pub fn rebalance(&mut self, caller: Address) -> Result<Receipt<Option<Migration>>> {
        debug!(%caller, "rebalance requested");
        self.transact("optimizer.rebalance", |state, log| {
            let (optimizer, mut venues) = state.split();
            optimizer.rebalance(&mut venues, log)
        })
    }

    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<Receipt<()>> {
        self.transact("optimizer.transferOwnership", |state, log| {
            state.optimizer.transfer_ownership(log, caller, new_owner)
        })
    }

    pub fn renounce_ownership(&mut self, caller: Address) -> Result<Receipt<()>> {
        self.transact("optimizer.renounceOwnership", |state, log| {
            state.optimizer.renounce_ownership(log, caller)
        })
    }

    // ==================== Views ====================

    pub fn deployer(&self) -> Address {
        self.deployer
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    pub fn usdc(&self) -> &Erc20 {
        &self.state.usdc
    }

    pub fn aave(&self) -> &MockAaveV3 {
        &self.state.aave
    }

    pub fn compound(&self) -> &MockCompoundV3 {
        &self.state.compound
    }

    pub fn optimizer(&self) -> &YieldOptimizer {
        &self.state.optimizer
    }

    pub fn venues(&self) -> Venues<'_> {
        self.state.venues()
    }

    pub fn best_protocol(&self) -> Protocol {
        self.state.optimizer.get_best_protocol(self.venues())
    }

    pub fn total_balance(&self) -> U256 {
        self.state.optimizer.get_total_balance(self.venues())
    }

    pub fn protocol_balances(&self) -> ProtocolBalances {
        self.state.optimizer.protocol_balances(self.venues())
    }

    pub fn protocol_rates(&self) -> ProtocolRates {
        self.state.optimizer.protocol_rates(self.venues())
    }

    /// Every mined log, oldest first.
    pub fn logs(&self) -> &[MinedLog] {
        &self.logs
    }

    /// Decode every mined log of one event type, oldest first.
    pub fn events<E: SolEvent>(&self) -> Vec<E> {
        let logs: Vec<Log> = self.logs.iter().map(|mined| mined.log.clone()).collect();
        decode_events(&logs)
    }

    /// Move the clock forward without mining a block.
    pub fn advance_time(&mut self, seconds: u64) {
        self.timestamp = self.timestamp.saturating_add(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erc20::MOCK_USDC_INITIAL_SUPPLY;
    use crate::error::ContractError;
    use crate::events::{Rebalanced, Transfer};
    use crate::protocol::LendingProtocol;

    const DEPOSIT: u64 = 1_000_000_000; // 1,000 USDC

    /// A protocol that quotes a rate and a balance but rejects every transfer.
    struct BrokenProtocol {
        rate: U256,
        balance: U256,
    }

    impl LendingProtocol for BrokenProtocol {
        fn address(&self) -> Address {
            Address::repeat_byte(0xbd)
        }

        fn deposit_funds(
            &mut self,
            asset: &mut Erc20,
            _log: &mut EventLog,
            _depositor: Address,
            _amount: U256,
        ) -> Result<()> {
            Err(ContractError::UnsupportedAsset {
                asset: asset.address(),
            })
        }

        fn withdraw_funds(
            &mut self,
            asset: &mut Erc20,
            _log: &mut EventLog,
            _depositor: Address,
            _amount: U256,
        ) -> Result<()> {
            Err(ContractError::UnsupportedAsset {
                asset: asset.address(),
            })
        }

        fn current_balance(&self, _asset: Address, _depositor: Address) -> U256 {
            self.balance
        }

        fn current_rate(&self, _asset: Address) -> U256 {
            self.rate
        }
    }

    /// Helper to deploy and deposit 1,000 USDC, which deploy rates route to Aave.
    fn funded_devnet() -> Devnet {
        let mut devnet = Devnet::deploy(account(0)).unwrap();
        let optimizer = devnet.optimizer().address();
        devnet
            .approve(account(0), optimizer, U256::from(DEPOSIT))
            .unwrap();
        devnet.deposit(account(0), U256::from(DEPOSIT)).unwrap();
        devnet
    }

    /// Helper to assert the funded devnet is exactly as `funded_devnet` left it.
    fn assert_untouched(devnet: &Devnet, block_number: u64) {
        let optimizer = devnet.optimizer().address();
        assert_eq!(devnet.optimizer().current_protocol(), Protocol::Aave);
        assert_eq!(
            devnet.protocol_balances(),
            ProtocolBalances {
                aave: U256::from(DEPOSIT),
                compound: U256::ZERO,
            }
        );
        assert_eq!(devnet.usdc().balance_of(optimizer), U256::ZERO);
        assert_eq!(devnet.block_number(), block_number);
        assert!(devnet.events::<Rebalanced>().is_empty());
    }

    #[test]
    fn test_deploy_layout() {
        let devnet = Devnet::deploy(account(0)).unwrap();

        assert_eq!(devnet.block_number(), 0);
        assert_eq!(devnet.timestamp(), GENESIS_TIMESTAMP);
        assert_eq!(devnet.optimizer().owner(), account(0));
        assert_eq!(devnet.optimizer().usdc(), devnet.usdc().address());
        assert_eq!(devnet.optimizer().aave(), devnet.aave().address());
        assert_eq!(devnet.optimizer().compound(), devnet.compound().address());
        assert_eq!(devnet.usdc().balance_of(account(0)), MOCK_USDC_INITIAL_SUPPLY);
        assert_eq!(devnet.events::<Transfer>().len(), 1);
    }

    #[test]
    fn test_deploy_sets_initial_rates() {
        let devnet = Devnet::deploy(account(0)).unwrap();
        let rates = devnet.protocol_rates();

        assert_eq!(rates.aave, INITIAL_AAVE_RATE);
        assert_eq!(rates.compound, INITIAL_COMPOUND_RATE);
        assert_eq!(devnet.best_protocol(), Protocol::Aave);
    }

    #[test]
    fn test_contract_addresses_are_distinct() {
        let devnet = Devnet::deploy(account(0)).unwrap();
        let addresses = [
            devnet.usdc().address(),
            devnet.aave().address(),
            devnet.compound().address(),
            devnet.optimizer().address(),
        ];
        for (i, a) in addresses.iter().enumerate() {
            for b in &addresses[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_successful_transaction_mines_block() {
        let mut devnet = Devnet::deploy(account(0)).unwrap();

        let receipt = devnet
            .transfer(account(0), account(1), U256::from(5u64))
            .unwrap();

        assert_eq!(receipt.block_number, 1);
        assert_eq!(receipt.timestamp, GENESIS_TIMESTAMP + BLOCK_TIME);
        assert_eq!(receipt.events::<Transfer>().len(), 1);
        assert_eq!(devnet.block_number(), 1);
    }

    #[test]
    fn test_failed_transaction_rolls_back() {
        let mut devnet = Devnet::deploy(account(0)).unwrap();
        let logs_before = devnet.logs().len();

        let result = devnet.transact("partial", |state, log| {
            state
                .usdc
                .transfer(log, account(0), account(1), U256::from(5u64))?;
            Err::<(), _>(ContractError::NoFundsDeposited)
        });

        assert_eq!(result.unwrap_err(), ContractError::NoFundsDeposited);
        assert_eq!(devnet.usdc().balance_of(account(1)), U256::ZERO);
        assert_eq!(devnet.logs().len(), logs_before);
        assert_eq!(devnet.block_number(), 0);
    }

    // ==================== Rebalance Atomicity ====================

    #[test]
    fn test_rebalance_reverts_when_target_rejects_deposit() {
        let mut devnet = funded_devnet();
        let block = devnet.block_number();

        let result = devnet.transact("optimizer.rebalance", |state, log| {
            let mut broken = BrokenProtocol {
                rate: U256::from(1_000_000_000u64),
                balance: U256::ZERO,
            };
            let WorldState {
                usdc,
                aave,
                optimizer,
                ..
            } = state;
            let mut venues = VenuesMut::new(usdc, aave, &mut broken);
            optimizer.rebalance(&mut venues, log)
        });

        assert!(matches!(
            result,
            Err(ContractError::UnsupportedAsset { .. })
        ));
        assert_untouched(&devnet, block);
    }

    #[test]
    fn test_rebalance_reverts_when_source_rejects_withdrawal() {
        let mut devnet = funded_devnet();
        let block = devnet.block_number();

        let result = devnet.transact("optimizer.rebalance", |state, log| {
            let mut broken = BrokenProtocol {
                rate: U256::ZERO,
                balance: U256::from(DEPOSIT),
            };
            let WorldState {
                usdc,
                compound,
                optimizer,
                ..
            } = state;
            let mut venues = VenuesMut::new(usdc, &mut broken, compound);
            optimizer.rebalance(&mut venues, log)
        });

        assert!(matches!(
            result,
            Err(ContractError::UnsupportedAsset { .. })
        ));
        assert_untouched(&devnet, block);
    }

    #[test]
    fn test_accounts_are_distinct_and_nonzero() {
        let accounts: Vec<Address> = (0..=u8::MAX).map(account).collect();

        assert!(accounts.iter().all(|a| !a.is_zero()));
        for (i, a) in accounts.iter().enumerate() {
            assert!(!accounts[i + 1..].contains(a));
        }
        assert_ne!(account(u8::MAX), Address::ZERO);
    }

    #[test]
    fn test_advance_time() {
        let mut devnet = Devnet::deploy(account(0)).unwrap();
        devnet.advance_time(3600);
        assert_eq!(devnet.timestamp(), GENESIS_TIMESTAMP + 3600);
    }
}
