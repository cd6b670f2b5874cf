//! Request handlers.
//!
//! Handlers never reject: every outcome, including domain errors, becomes a
//! response here so the first matching route always answers.

use std::convert::Infallible;

use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tracing::{debug, warn};
use warp::Reply;
use warp::reply::Response;

use super::ApiState;
use super::requests::{CalcParams, RootParams, SelicParams, TableRequest, shortcut_request};
use crate::data::RateLookup;
use crate::domain::{FeeComputation, RatePeriod, parse_rate_percent};
use crate::error::AppError;
use crate::fees::FeeRequest;

#[derive(Debug, Serialize)]
pub struct SelicResponse {
    /// Chargeable rate as a fraction (1,07% → 0.0107).
    pub taxa_selic: f64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

pub async fn root(params: RootParams, state: ApiState) -> Result<Response, Infallible> {
    let request = match TableRequest::from_params(&params) {
        Ok(request) => request,
        Err(err) => return Ok(error_reply(&err)),
    };

    let reply = match request {
        TableRequest::ListAll { raw } => {
            let store = state.store.clone();
            match blocking(move || store.table()).await {
                Ok(table) if raw => json_reply(&table.raw_view()),
                Ok(table) => json_reply(&table.formatted()),
                Err(err) => error_reply(&err),
            }
        }
        TableRequest::LookupPeriod(period) => respond(selic_rate(state, period).await),
    };
    Ok(reply)
}

pub async fn selic_query(params: SelicParams, state: ApiState) -> Result<Response, Infallible> {
    let reply = match params.period() {
        Ok(period) => respond(selic_rate(state, period).await),
        Err(err) => error_reply(&err),
    };
    Ok(reply)
}

pub async fn selic_path(mes_ano: String, state: ApiState) -> Result<Response, Infallible> {
    let params = SelicParams {
        mes_ano: Some(mes_ano),
    };
    selic_query(params, state).await
}

pub async fn calcular(params: CalcParams, state: ApiState) -> Result<Response, Infallible> {
    let reply = match params.to_request(state.today()) {
        Ok(req) => respond(late_fee(state, req).await),
        Err(err) => error_reply(&err),
    };
    Ok(reply)
}

pub async fn calcular_path(
    valor: String,
    vencimento: String,
    state: ApiState,
) -> Result<Response, Infallible> {
    let reply = match shortcut_request(&valor, &vencimento, state.today()) {
        Ok(req) => respond(late_fee(state, req).await),
        Err(err) => error_reply(&err),
    };
    Ok(reply)
}

async fn selic_rate(state: ApiState, period: RatePeriod) -> Result<SelicResponse, AppError> {
    let raw = blocking(move || state.store.lookup(period)).await?;
    let percent = parse_rate_percent(&raw).ok_or_else(|| {
        AppError::InsufficientData("Não existe Selic para esta data ainda!".to_string())
    })?;
    let fraction = (percent / rust_decimal::Decimal::ONE_HUNDRED)
        .to_f64()
        .ok_or_else(|| AppError::Server(format!("Rate '{raw}' is not representable.")))?;
    Ok(SelicResponse { taxa_selic: fraction })
}

async fn late_fee(state: ApiState, req: FeeRequest) -> Result<FeeComputation, AppError> {
    blocking(move || state.calculator.compute(state.store.as_ref(), &req)).await
}

/// Run a store call on the blocking pool; it may perform a synchronous fetch.
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        warn!("blocking task failed: {e}");
        AppError::Server("Falha interna ao processar a requisição.".to_string())
    })?
}

fn respond<T: Serialize>(result: Result<T, AppError>) -> Response {
    match result {
        Ok(body) => json_reply(&body),
        Err(err) => error_reply(&err),
    }
}

fn json_reply<T: Serialize>(body: &T) -> Response {
    warp::reply::json(body).into_response()
}

fn error_reply(err: &AppError) -> Response {
    let status = err.status();
    if status.is_server_error() {
        warn!(%status, "{err}");
    } else {
        debug!(%status, "{err}");
    }
    let body = ErrorResponse {
        detail: err.to_string(),
    };
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}
