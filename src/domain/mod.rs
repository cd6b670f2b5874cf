//! Domain types used throughout the service.
//!
//! This module defines:
//!
//! - table keys and shape (`YearRange`, `RatePeriod`, `RateTable`)
//! - fee outputs (`FeeComputation`) and the interest convention
//! - resolved runtime configuration (`ServiceConfig`)

pub mod types;

pub use types::*;
