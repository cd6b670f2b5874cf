//! File exports.
//!
//! - rate table to CSV (`export`)

pub mod export;

pub use export::*;
