//! Error types for the strategy crate.

use rust_decimal::Decimal;
use thiserror::Error;
use yield_optimizer_contracts::ContractError;

/// Errors that can occur while converting units or driving the keeper.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    /// Amount string could not be parsed.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Amount has more fractional digits than the token supports.
    #[error("Amount {value} has more than {decimals} decimal places")]
    TooPrecise { value: String, decimals: u8 },

    /// Rate quote cannot be represented as a percentage.
    #[error("Rate out of range: {0}")]
    RateOutOfRange(String),

    /// Percentage cannot be represented as a rate quote.
    #[error("Invalid rate: {0}%")]
    InvalidRate(Decimal),

    /// Tolerance must be a non-negative percentage.
    #[error("Invalid tolerance: {0}%")]
    InvalidTolerance(Decimal),

    /// A transaction sent on behalf of the strategy reverted.
    #[error("Transaction reverted: {0}")]
    Reverted(#[from] ContractError),
}

/// Result type alias for strategy operations.
pub type Result<T> = std::result::Result<T, StrategyError>;
