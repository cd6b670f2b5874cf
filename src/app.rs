//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments into a `ServiceConfig`
//! - builds the rate store once
//! - runs the HTTP server or a one-shot command

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{CalcArgs, Command, RateArgs, ServeArgs, SourceArgs, TableArgs};
use crate::data::{HttpRateSource, RateLookup, RateTableStore};
use crate::domain::{InterestConvention, ServiceConfig, YearRange, parse_rate_percent};
use crate::error::AppError;
use crate::fees::{FeeRequest, LateFeeCalculator, parse_amount, parse_date_ddmmyyyy, parse_period};
use crate::server::ApiState;

/// Entry point for the `mora` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    // `mora` and `mora --bind ...` behave like `mora serve ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Serve(args) => handle_serve(args),
        Command::Table(args) => handle_table(args),
        Command::Rate(args) => handle_rate(args),
        Command::Calc(args) => handle_calc(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second init (e.g. in tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_serve(args: ServeArgs) -> Result<(), AppError> {
    let config = service_config_from_args(&args.source, Some(args.bind))?;
    let store = Arc::new(build_store(&config)?);
    let state = ApiState::new(Arc::clone(&store), LateFeeCalculator::new(config.convention));

    info!(
        bind = %config.bind,
        years = %config.years,
        cache_ttl_secs = config.cache_ttl.as_secs(),
        convention = ?config.convention,
        "starting server"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::Server(format!("Failed to start async runtime: {e}")))?;
    let result = runtime.block_on(crate::server::serve(state, config.bind));
    drop(runtime);

    // The blocking HTTP client must be dropped outside the async runtime.
    drop(store);
    result
}

fn handle_table(args: TableArgs) -> Result<(), AppError> {
    let config = service_config_from_args(&args.source, None)?;
    let store = build_store(&config)?;
    let table = store.fetch()?;

    if args.raw {
        print!("{}", crate::report::format_raw_table(&table));
    } else {
        print!("{}", crate::report::format_rate_table(&table));
    }

    if let Some(path) = &args.export {
        crate::io::write_rate_table_csv(path, &table)?;
        info!(path = %path.display(), "exported rate table");
    }
    Ok(())
}

fn handle_rate(args: RateArgs) -> Result<(), AppError> {
    let config = service_config_from_args(&args.source, None)?;
    let period = parse_period(&args.mes_ano)?;
    let store = build_store(&config)?;

    let raw = store.lookup(period)?;
    let percent = parse_rate_percent(&raw).ok_or_else(|| {
        AppError::InsufficientData("Não existe Selic para esta data ainda!".to_string())
    })?;
    println!("Selic {} (aplicada a {period}): {percent}%", period.chargeable());
    Ok(())
}

fn handle_calc(args: CalcArgs) -> Result<(), AppError> {
    let config = service_config_from_args(&args.source, None)?;
    let payment_date = match &args.pagamento {
        Some(raw) => parse_date_ddmmyyyy(raw)?,
        None => chrono::Local::now().date_naive(),
    };
    let req = FeeRequest {
        principal: parse_amount(&args.valor)?,
        due_date: parse_date_ddmmyyyy(&args.vencimento)?,
        payment_date,
        period: args.periodo.as_deref().map(parse_period).transpose()?,
    };

    let store = build_store(&config)?;
    let fee = LateFeeCalculator::new(config.convention).compute(&store, &req)?;
    print!("{}", crate::report::format_fee(&fee));
    Ok(())
}

fn build_store(config: &ServiceConfig) -> Result<RateTableStore, AppError> {
    let source = HttpRateSource::new(config.source_url.clone(), config.timeout)?;
    Ok(RateTableStore::new(Box::new(source), config.years, config.cache_ttl))
}

/// Resolve CLI/env options into a validated config.
pub fn service_config_from_args(
    args: &SourceArgs,
    bind: Option<std::net::SocketAddr>,
) -> Result<ServiceConfig, AppError> {
    if args.timeout_secs == 0 {
        return Err(AppError::Config("--timeout-secs must be greater than zero.".to_string()));
    }
    Ok(ServiceConfig {
        bind: bind.unwrap_or_else(|| std::net::SocketAddr::from(([127, 0, 0, 1], 8000))),
        source_url: args.source_url.clone(),
        years: YearRange::new(args.first_year, args.last_year)?,
        timeout: Duration::from_secs(args.timeout_secs),
        cache_ttl: Duration::from_secs(args.cache_ttl_secs),
        convention: if args.legacy_double_percent {
            InterestConvention::LegacyDoublePercent
        } else {
            InterestConvention::Percent
        },
    })
}

/// Rewrite argv so `mora` defaults to `mora serve`.
///
/// Rules:
/// - `mora`                      -> `mora serve`
/// - `mora --bind 0.0.0.0:80`    -> `mora serve --bind 0.0.0.0:80`
/// - `mora --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("serve".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "serve" | "table" | "rate" | "calc");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "serve".to_string());
        return argv;
    }

    argv
}
