//! Late-payment fee engine.
//!
//! - request-facing parsers (`input`)
//! - penalty + interest computation (`calculator`)

pub mod calculator;
pub mod input;

pub use calculator::{FeeRequest, LateFeeCalculator, late_penalty};
pub use input::{parse_amount, parse_date_ddmmyyyy, parse_period};
