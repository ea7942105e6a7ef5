//! Yield optimizer state machine and the mock contracts it runs against.
//!
//! This crate provides a stablecoin ledger, Aave-like and Compound-like
//! lending pool mocks, the optimizer that routes a pooled balance to the
//! better-rated pool, and [`Devnet`], which executes every call with
//! all-or-nothing transaction semantics.
//!
//! # Example
//!
//! ```
//! use alloy_primitives::U256;
//! use yield_optimizer_contracts::{account, Devnet, Protocol};
//!
//! fn main() -> yield_optimizer_contracts::Result<()> {
//!     let owner = account(0);
//!     let mut devnet = Devnet::deploy(owner)?;
//!
//!     // Compound quotes 4%, Aave 3%
//!     devnet.set_aave_rate(U256::from(300_000_000u64))?;
//!     devnet.set_compound_rate(U256::from(400_000_000u64))?;
//!
//!     let amount = U256::from(10_000_000_000u64); // 10,000 USDC
//!     let optimizer = devnet.optimizer().address();
//!     devnet.approve(owner, optimizer, amount)?;
//!     let receipt = devnet.deposit(owner, amount)?;
//!
//!     assert_eq!(receipt.output, Protocol::Compound);
//!     assert_eq!(devnet.total_balance(), amount);
//!     Ok(())
//! }
//! ```

pub mod aave;
pub mod compound;
pub mod devnet;
pub mod erc20;
pub mod error;
pub mod events;
pub mod optimizer;
pub mod protocol;

pub use aave::MockAaveV3;
pub use compound::MockCompoundV3;
pub use devnet::{account, Devnet, MinedLog, Receipt, WorldState};
pub use erc20::{Erc20, MOCK_USDC_INITIAL_SUPPLY, USDC_DECIMALS};
pub use error::{ContractError, Result};
pub use events::{decode_events, EventLog};
pub use optimizer::{Migration, ProtocolBalances, ProtocolRates, YieldOptimizer};
pub use protocol::{LendingProtocol, Protocol, Venues, VenuesMut};
