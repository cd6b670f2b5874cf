//! Late-payment surcharge: daily penalty (capped) plus Selic interest.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::data::RateLookup;
use crate::domain::{FeeComputation, InterestConvention, RatePeriod, parse_rate_percent};
use crate::error::AppError;

/// 0.3% of principal per day overdue.
pub const DAILY_PENALTY_RATE: Decimal = Decimal::from_parts(3, 0, 0, false, 3);
/// Penalty never exceeds 20% of principal.
pub const PENALTY_CAP_RATE: Decimal = Decimal::from_parts(20, 0, 0, false, 2);

/// One late-payment question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeRequest {
    pub principal: Decimal,
    pub due_date: NaiveDate,
    pub payment_date: NaiveDate,
    /// Reference period for the rate; defaults to the payment date's month.
    pub period: Option<RatePeriod>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LateFeeCalculator {
    convention: InterestConvention,
}

impl LateFeeCalculator {
    pub fn new(convention: InterestConvention) -> Self {
        Self { convention }
    }

    pub fn convention(&self) -> InterestConvention {
        self.convention
    }

    /// Compute penalty, interest and total for `req`.
    ///
    /// Payments on or before the due date cost nothing extra and never consult
    /// `rates`, so they cannot fail on missing or unreachable rate data.
    pub fn compute<L: RateLookup + ?Sized>(
        &self,
        rates: &L,
        req: &FeeRequest,
    ) -> Result<FeeComputation, AppError> {
        if req.principal <= Decimal::ZERO {
            return Err(AppError::InvalidAmount(
                "O valor da guia deve ser maior que zero.".to_string(),
            ));
        }
        let principal = req
            .principal
            .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);

        let days_overdue = (req.payment_date - req.due_date).num_days().max(0);
        if days_overdue == 0 {
            return Ok(FeeComputation {
                principal: money(principal),
                due_date: req.due_date,
                payment_date: req.payment_date,
                days_overdue: 0,
                penalty: Decimal::ZERO,
                interest: Decimal::ZERO,
                total: money(principal),
                rate_period: None,
                rate_percent: None,
            });
        }

        let penalty = money(late_penalty(principal, days_overdue)?);

        let period = req
            .period
            .unwrap_or_else(|| RatePeriod::of_date(req.payment_date));
        let raw = rates.lookup(period)?;
        let chargeable = period.chargeable();
        let rate_percent = parse_rate_percent(&raw).ok_or_else(|| {
            AppError::InsufficientData(format!(
                "Não existe Selic publicada para {chargeable} ainda!"
            ))
        })?;
        let interest = money(
            principal
                .checked_mul(self.convention.fraction(rate_percent))
                .ok_or_else(amount_too_large)?,
        );

        let total = money(principal)
            .checked_add(penalty)
            .and_then(|t| t.checked_add(interest))
            .ok_or_else(amount_too_large)?;

        debug!(
            days_overdue,
            period = %period,
            chargeable = %chargeable,
            rate = %rate_percent,
            "computed late fee"
        );

        Ok(FeeComputation {
            principal: money(principal),
            due_date: req.due_date,
            payment_date: req.payment_date,
            days_overdue,
            penalty,
            interest,
            total,
            rate_period: Some(chargeable),
            rate_percent: Some(rate_percent),
        })
    }
}

/// `min(principal × 0.003 × days, principal × 0.20)`, unrounded.
pub fn late_penalty(principal: Decimal, days_overdue: i64) -> Result<Decimal, AppError> {
    if days_overdue <= 0 {
        return Ok(Decimal::ZERO);
    }
    let cap = principal
        .checked_mul(PENALTY_CAP_RATE)
        .ok_or_else(amount_too_large)?;
    let daily = principal
        .checked_mul(DAILY_PENALTY_RATE)
        .and_then(|d| d.checked_mul(Decimal::from(days_overdue)));
    // A daily total too large to represent is past the cap anyway.
    Ok(daily.map_or(cap, |d| d.min(cap)))
}

fn amount_too_large() -> AppError {
    AppError::InvalidAmount("Valor da guia excede o limite suportado.".to_string())
}

fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
