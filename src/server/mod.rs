//! HTTP surface.
//!
//! | route                                        | answer                         |
//! |----------------------------------------------|--------------------------------|
//! | `GET /`                                      | whole table (`formato=bruto` for raw strings) |
//! | `GET /?mes_ano=MMYYYY`                       | `{"taxa_selic": fraction}`     |
//! | `GET /selic?mes_ano=MMYYYY`, `GET /selic/MMYYYY` | `{"taxa_selic": fraction}` |
//! | `GET /calcular?valor_guia=&vencimento_guia=&selic=` | fee computation         |
//! | `GET /{valor}/{DDMMYYYY}`                    | fee computation                |
//!
//! Failures answer `{"detail": "..."}` with the status from `AppError::status`.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;
use warp::Filter;

use crate::data::RateTableStore;
use crate::error::AppError;
use crate::fees::LateFeeCalculator;

pub mod handlers;
pub mod requests;

use requests::{CalcParams, RootParams, SelicParams};

/// Everything a request handler needs, cheap to clone per request.
#[derive(Clone)]
pub struct ApiState {
    store: Arc<RateTableStore>,
    calculator: LateFeeCalculator,
    today: fn() -> NaiveDate,
}

impl ApiState {
    pub fn new(store: Arc<RateTableStore>, calculator: LateFeeCalculator) -> Self {
        Self {
            store,
            calculator,
            today: local_today,
        }
    }

    /// Replace the clock used as payment date.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn routes(
    state: ApiState,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let state_filter = warp::any().map(move || state.clone());

    let root = warp::path::end()
        .and(warp::get())
        .and(warp::query::<RootParams>())
        .and(state_filter.clone())
        .and_then(handlers::root);

    let selic_query = warp::path!("selic")
        .and(warp::get())
        .and(warp::query::<SelicParams>())
        .and(state_filter.clone())
        .and_then(handlers::selic_query);

    let selic_path = warp::path!("selic" / String)
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(handlers::selic_path);

    let calcular = warp::path!("calcular")
        .and(warp::get())
        .and(warp::query::<CalcParams>())
        .and(state_filter.clone())
        .and_then(handlers::calcular);

    let shortcut = warp::path!(String / String)
        .and(warp::get())
        .and(state_filter)
        .and_then(handlers::calcular_path);

    root.or(selic_query)
        .unify()
        .or(selic_path)
        .unify()
        .or(calcular)
        .unify()
        .or(shortcut)
        .unify()
        .with(warp::trace::request())
}

/// Serve until Ctrl-C.
pub async fn serve(state: ApiState, bind: SocketAddr) -> Result<(), AppError> {
    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
        }
    };

    let (addr, server) = warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(bind, shutdown)
        .map_err(|e| AppError::Server(format!("Failed to bind {bind}: {e}")))?;

    info!(%addr, "listening");
    server.await;
    Ok(())
}
