//! Rate table and fee calculator for parkledger
//!
//! This crate turns a parking duration and a vehicle class into billed
//! hours and a fee, using operator-supplied hourly rates.

pub mod fee_calculator;
pub mod rate_table;

pub use fee_calculator::{FeeCalculator, FeeQuote};
pub use rate_table::RateTable;
