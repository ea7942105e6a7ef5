//! Output formatting for CLI results.

pub mod detail;
pub mod table;

pub use detail::format_state_detail;
pub use table::{format_history_table, format_rates_table, format_steps_table};
