//! Command implementations.

pub mod demo;
pub mod rates;
pub mod simulate;

pub use demo::run_demo;
pub use rates::run_rates;
pub use simulate::run_simulate;
