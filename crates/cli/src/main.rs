//! Yield optimizer CLI - run scenarios against an in-memory devnet.

mod cli;
mod commands;
mod output;
mod scenario;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Commands};
use commands::{run_demo, run_rates, run_simulate};

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) -> Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)?,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Simulate(args) => run_simulate(&args, cli.format)?,
        Commands::Rates(args) => run_rates(&args, cli.format)?,
        Commands::Demo(args) => run_demo(&args, cli.format)?,
    }

    Ok(())
}
