//! Command-line parsing for the Selic late-fee service.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the table and fee code.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_FIRST_YEAR, DEFAULT_LAST_YEAR, DEFAULT_SOURCE_URL};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "mora", version, about = "Selic rate table and late-payment fee service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Fetch the rate table and print it (optionally export it to CSV).
    Table(TableArgs),
    /// Print the chargeable rate for a reference period (MMYYYY).
    Rate(RateArgs),
    /// Compute penalty and interest for a late payment.
    Calc(CalcArgs),
}

/// Options shared by every command that reads the rate table.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Page that publishes the monthly Selic table.
    #[arg(long, env = "SELIC_SOURCE_URL", default_value = DEFAULT_SOURCE_URL)]
    pub source_url: String,

    /// First year column of the published table.
    #[arg(long, env = "SELIC_FIRST_YEAR", default_value_t = DEFAULT_FIRST_YEAR)]
    pub first_year: i32,

    /// Last year column of the published table.
    #[arg(long, env = "SELIC_LAST_YEAR", default_value_t = DEFAULT_LAST_YEAR)]
    pub last_year: i32,

    /// Upstream request timeout (seconds).
    #[arg(long, env = "SELIC_TIMEOUT_SECS", default_value_t = 15)]
    pub timeout_secs: u64,

    /// Reuse a fetched table for this many seconds (0 = re-fetch on every request).
    #[arg(long, env = "SELIC_CACHE_TTL_SECS", default_value_t = 0)]
    pub cache_ttl_secs: u64,

    /// Divide the published percentage by 100 twice when computing interest,
    /// reproducing the legacy service's numbers.
    #[arg(long, env = "MORA_LEGACY_DOUBLE_PERCENT")]
    pub legacy_double_percent: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "MORA_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct TableArgs {
    /// Print every scraped cell per year instead of the month grid.
    #[arg(long)]
    pub raw: bool,

    /// Also write the table to this CSV file.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct RateArgs {
    /// Reference period, MMYYYY. The following month's rate is returned.
    pub mes_ano: String,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct CalcArgs {
    /// Principal, comma decimal separator (e.g. 1.234,56).
    #[arg(long)]
    pub valor: String,

    /// Due date, DDMMYYYY.
    #[arg(long)]
    pub vencimento: String,

    /// Payment date, DDMMYYYY (defaults to today).
    #[arg(long)]
    pub pagamento: Option<String>,

    /// Reference period for the rate, MMYYYY (defaults to the payment month).
    #[arg(long)]
    pub periodo: Option<String>,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn calc_parses_optional_dates() {
        let cli = Cli::parse_from([
            "mora",
            "calc",
            "--valor",
            "100,00",
            "--vencimento",
            "01022024",
            "--periodo",
            "012024",
        ]);
        let Command::Calc(args) = cli.command else {
            panic!("expected calc");
        };
        assert_eq!(args.valor, "100,00");
        assert!(args.pagamento.is_none());
        assert_eq!(args.periodo.as_deref(), Some("012024"));
    }
}
