//! Error types for the contracts crate.
//!
//! Every variant's `Display` output is the revert reason a caller would see.

use alloy_primitives::{Address, U256};
use thiserror::Error;

/// Reasons a contract call reverts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// Zero-amount deposit or withdrawal.
    #[error("Amount must be greater than 0")]
    ZeroAmount,

    /// Withdrawal attempted before anything was deposited.
    #[error("No funds deposited")]
    NoFundsDeposited,

    /// Caller is not the owner of an ownable contract.
    #[error("OwnableUnauthorizedAccount({account})")]
    OwnableUnauthorizedAccount { account: Address },

    /// Ownership cannot be transferred to the zero address.
    #[error("OwnableInvalidOwner({owner})")]
    OwnableInvalidOwner { owner: Address },

    /// A lending protocol's recorded balance is smaller than the request.
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: U256, need: U256 },

    /// Token holder does not own enough tokens.
    #[error("ERC20InsufficientBalance({sender}, {balance}, {needed})")]
    Erc20InsufficientBalance {
        sender: Address,
        balance: U256,
        needed: U256,
    },

    /// Spender has not been approved for enough tokens.
    #[error("ERC20InsufficientAllowance({spender}, {allowance}, {needed})")]
    Erc20InsufficientAllowance {
        spender: Address,
        allowance: U256,
        needed: U256,
    },

    /// Tokens cannot be sent to the zero address.
    #[error("ERC20InvalidReceiver({receiver})")]
    Erc20InvalidReceiver { receiver: Address },

    /// Tokens cannot be sent from the zero address.
    #[error("ERC20InvalidSender({sender})")]
    Erc20InvalidSender { sender: Address },

    /// A market was asked to handle a token it does not list.
    #[error("Unsupported asset {asset}")]
    UnsupportedAsset { asset: Address },

    /// Checked arithmetic overflowed.
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,
}

/// Result type alias for contract calls.
pub type Result<T> = std::result::Result<T, ContractError>;
