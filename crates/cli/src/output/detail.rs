//! Detailed output formatting for the devnet state.

use colored::Colorize;

use crate::commands::simulate::StateReport;

pub fn format_state_detail(state: &StateReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}\n", "=".repeat(60)));
    output.push_str(&format!("{}\n", "Yield Optimizer".bold()));
    output.push_str(&format!("{}\n\n", "=".repeat(60)));

    output.push_str(&format!("{}\n", "Chain".cyan().bold()));
    output.push_str(&format!("  Block:     {}\n", state.block_number));
    output.push_str(&format!("  Timestamp: {}\n\n", state.timestamp));

    output.push_str(&format!("{}\n", "Optimizer".cyan().bold()));
    output.push_str(&format!("  Address:  {}\n", state.optimizer));
    output.push_str(&format!("  Owner:    {}\n", state.owner));
    output.push_str(&format!("  Current:  {}\n", state.current_protocol));
    output.push_str(&format!("  Best:     {}\n\n", state.best_protocol));

    output.push_str(&format!("{}\n", "Rates".cyan().bold()));
    output.push_str(&format!("  Aave:     {}%\n", state.rates.aave));
    output.push_str(&format!("  Compound: {}%\n\n", state.rates.compound));

    output.push_str(&format!("{}\n", "Balances".cyan().bold()));
    output.push_str(&format!("  Aave:     {} USDC\n", state.balances.aave));
    output.push_str(&format!("  Compound: {} USDC\n", state.balances.compound));
    output.push_str(&format!("  Total:    {} USDC\n\n", state.balances.total));

    if !state.accounts.is_empty() {
        output.push_str(&format!("{}\n", "Accounts".cyan().bold()));
        for account in &state.accounts {
            output.push_str(&format!(
                "  {:<10} {} USDC\n",
                account.name, account.balance
            ));
        }
        output.push('\n');
    }

    output.push_str(&format!("{}\n", "Keeper".cyan().bold()));
    output.push_str(&format!(
        "  Auto-rebalance: {}\n",
        if state.keeper.auto_rebalance { "On" } else { "Off" }
    ));
    output.push_str(&format!("  Tolerance:      {}%\n", state.keeper.tolerance));

    output
}
