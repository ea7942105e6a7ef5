//! Rates command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use yield_optimizer_contracts::{account, Devnet, Protocol};
use yield_optimizer_strategy::{parse_percent, rate_to_percent};

use crate::cli::{OutputFormat, RatesArgs};
use crate::output::format_rates_table;

#[derive(Debug, Serialize)]
struct RatesReport {
    aave: rust_decimal::Decimal,
    compound: rust_decimal::Decimal,
    best: Protocol,
}

pub fn run_rates(args: &RatesArgs, format: OutputFormat) -> Result<()> {
    let mut devnet = Devnet::deploy(account(0)).context("Failed to deploy contracts")?;

    if let Some(aave) = &args.aave {
        devnet.set_aave_rate(parse_percent(aave).context("Invalid Aave rate")?)?;
    }
    if let Some(compound) = &args.compound {
        devnet.set_compound_rate(parse_percent(compound).context("Invalid Compound rate")?)?;
    }

    let rates = devnet.protocol_rates();
    let report = RatesReport {
        aave: rate_to_percent(rates.aave)?,
        compound: rate_to_percent(rates.compound)?,
        best: devnet.best_protocol(),
    };

    match format {
        OutputFormat::Table => {
            println!(
                "{}",
                format_rates_table(report.aave, report.compound, report.best)
            );
            println!("Best protocol: {}", report.best);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)?;
            println!("{}", json);
        }
    }

    Ok(())
}
