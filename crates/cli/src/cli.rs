//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

/// Yield optimizer CLI - run scenarios against an in-memory devnet
#[derive(Parser, Debug)]
#[command(name = "yield-optimizer")]
#[command(about = "Run yield optimizer scenarios on an in-memory devnet", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scenario file step by step
    #[command(name = "simulate")]
    Simulate(SimulateArgs),
    /// Show both protocols' rates and which one wins
    #[command(name = "rates")]
    Rates(RatesArgs),
    /// Deposit, flip rates and rebalance on a fresh devnet
    #[command(name = "demo")]
    Demo(KeeperArgs),
}

#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// Path to a TOML scenario file
    pub scenario: PathBuf,

    #[command(flatten)]
    pub keeper: KeeperArgs,

    /// Number of history records to show, newest first
    #[arg(short = 'n', long, default_value = "10")]
    pub history: usize,
}

/// Keeper overrides; unset values fall back to the scenario file.
#[derive(Parser, Debug, Default)]
pub struct KeeperArgs {
    /// Let the keeper rebalance on keeper-tick steps
    #[arg(long, env = "AUTO_REBALANCE")]
    pub auto_rebalance: bool,

    /// Minimum relative rate improvement in percent before the keeper moves funds
    #[arg(long, env = "YIELD_TOLERANCE")]
    pub tolerance: Option<Decimal>,
}

#[derive(Parser, Debug)]
pub struct RatesArgs {
    /// Aave rate in percent (e.g., "3" or "4.25"); defaults to the deployment rate
    #[arg(long)]
    pub aave: Option<String>,

    /// Compound rate in percent; defaults to the deployment rate
    #[arg(long)]
    pub compound: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}
