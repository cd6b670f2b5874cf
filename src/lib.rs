//! `selic-mora` library crate.
//!
//! Scrapes the monthly Selic table published by Receita Federal and uses it to
//! compute late-payment surcharges (daily penalty plus interest).
//!
//! The binary (`mora`) is a thin wrapper around this library so that:
//!
//! - table parsing and fee math are testable without a network or a server
//! - the HTTP layer and the CLI share one engine

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fees;
pub mod io;
pub mod report;
pub mod server;
