//! Table formatting for steps, rates and rebalancing history.

use colored::Colorize;
use rust_decimal::Decimal;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use yield_optimizer_contracts::{Protocol, USDC_DECIMALS};
use yield_optimizer_strategy::{format_amount, RebalanceRecord};

use crate::commands::simulate::{StepReport, StepStatus};

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Result")]
    detail: String,
    #[tabled(rename = "Block")]
    block: u64,
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Old Pool")]
    old_pool: String,
    #[tabled(rename = "New Pool")]
    new_pool: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Yield Before")]
    yield_before: String,
    #[tabled(rename = "Yield After")]
    yield_after: String,
    #[tabled(rename = "Block")]
    block: u64,
    #[tabled(rename = "Time")]
    timestamp: u64,
}

#[derive(Tabled)]
struct RateRow {
    #[tabled(rename = "Protocol")]
    protocol: String,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "Best")]
    best: String,
}

fn format_rate(rate: Option<Decimal>) -> String {
    rate.map_or_else(|| "-".to_string(), |r| format!("{}%", r))
}

fn rounded(table: &mut Table) -> String {
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::left()));
    table.to_string()
}

pub fn format_steps_table(steps: &[StepReport]) -> String {
    if steps.is_empty() {
        return "No steps.".to_string();
    }

    let rows: Vec<StepRow> = steps
        .iter()
        .map(|s| StepRow {
            index: s.index,
            action: s.action.clone(),
            status: match s.status {
                StepStatus::Ok => "ok".green().to_string(),
                StepStatus::Reverted => "reverted".yellow().to_string(),
            },
            detail: s.detail.clone(),
            block: s.block,
        })
        .collect();

    rounded(&mut Table::new(rows))
}

pub fn format_history_table(records: &[RebalanceRecord]) -> String {
    if records.is_empty() {
        return "No rebalances.".to_string();
    }

    let rows: Vec<HistoryRow> = records
        .iter()
        .map(|r| HistoryRow {
            old_pool: r.old_pool.to_string(),
            new_pool: r.new_pool.to_string(),
            amount: format!("{} USDC", format_amount(r.amount, USDC_DECIMALS)),
            yield_before: format_rate(r.yield_before),
            yield_after: format_rate(r.yield_after),
            block: r.block_number,
            timestamp: r.timestamp,
        })
        .collect();

    rounded(&mut Table::new(rows))
}

pub fn format_rates_table(aave: Decimal, compound: Decimal, best: Protocol) -> String {
    let mark = |p: Protocol| if p == best { "*".to_string() } else { String::new() };
    let rows = vec![
        RateRow {
            protocol: Protocol::Aave.to_string(),
            rate: format_rate(Some(aave)),
            best: mark(Protocol::Aave),
        },
        RateRow {
            protocol: Protocol::Compound.to_string(),
            rate: format_rate(Some(compound)),
            best: mark(Protocol::Compound),
        },
    ];

    rounded(&mut Table::new(rows))
}
