//! Off-chain strategy for the yield optimizer.
//!
//! This crate provides unit conversions between on-chain integers and
//! decimals, the tolerance-gated auto-rebalance keeper, and the rebalancing
//! history built from keeper actions or `Rebalanced` logs.

pub mod error;
pub mod history;
pub mod keeper;
pub mod units;

pub use error::{Result, StrategyError};
pub use history::{RebalanceHistory, RebalanceRecord, DEFAULT_HISTORY_LIMIT};
pub use keeper::{Decision, Keeper, RebalancePolicy, DEFAULT_TOLERANCE};
pub use units::{
    format_amount, parse_amount, parse_percent, percent_to_rate, rate_to_percent, RATE_DECIMALS,
    RATE_SCALE,
};
