//! Terminal reports for the rate table and fee computations.

pub mod format;

pub use format::{format_fee, format_raw_table, format_rate_table};
