//! Query parameters and the request variants they resolve to.
//!
//! Optional parameters are resolved once, here, into explicit variants so the
//! handlers never branch on "was this field present".

use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::RatePeriod;
use crate::error::AppError;
use crate::fees::{FeeRequest, parse_amount, parse_date_ddmmyyyy, parse_period};

/// `GET /` query string.
#[derive(Debug, Default, Deserialize)]
pub struct RootParams {
    pub mes_ano: Option<String>,
    pub formato: Option<String>,
}

/// `GET /selic` query string.
#[derive(Debug, Default, Deserialize)]
pub struct SelicParams {
    pub mes_ano: Option<String>,
}

/// `GET /calcular` query string.
#[derive(Debug, Default, Deserialize)]
pub struct CalcParams {
    pub valor_guia: Option<String>,
    pub vencimento_guia: Option<String>,
    pub selic: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRequest {
    /// Whole table; `raw` keeps the scraped strings instead of month names and numbers.
    ListAll { raw: bool },
    LookupPeriod(RatePeriod),
}

impl TableRequest {
    pub fn from_params(params: &RootParams) -> Result<Self, AppError> {
        match params.mes_ano.as_deref() {
            Some(mes_ano) => parse_period(mes_ano).map(TableRequest::LookupPeriod),
            None => Ok(TableRequest::ListAll {
                raw: params
                    .formato
                    .as_deref()
                    .is_some_and(|f| f.eq_ignore_ascii_case("bruto")),
            }),
        }
    }
}

impl SelicParams {
    pub fn period(&self) -> Result<RatePeriod, AppError> {
        parse_period(self.mes_ano.as_deref().unwrap_or_default())
    }
}

impl CalcParams {
    /// Resolve into a fee request paid on `today`.
    pub fn to_request(&self, today: NaiveDate) -> Result<FeeRequest, AppError> {
        let valor = self.valor_guia.as_deref().ok_or_else(|| {
            AppError::InvalidAmount("Parâmetro obrigatório ausente: valor_guia.".to_string())
        })?;
        let vencimento = self.vencimento_guia.as_deref().ok_or_else(|| {
            AppError::InvalidDate("Parâmetro obrigatório ausente: vencimento_guia.".to_string())
        })?;

        Ok(FeeRequest {
            principal: parse_amount(valor)?,
            due_date: parse_date_ddmmyyyy(vencimento)?,
            payment_date: today,
            period: self.selic.as_deref().map(parse_period).transpose()?,
        })
    }
}

/// `GET /{valor}/{DDMMYYYY}` path segments, percent-decoded.
pub fn shortcut_request(valor: &str, vencimento: &str, today: NaiveDate) -> Result<FeeRequest, AppError> {
    let valor = urlencoding::decode(valor)
        .map_err(|_| AppError::InvalidAmount(format!("Valor inválido: '{valor}'.")))?;
    let vencimento = urlencoding::decode(vencimento)
        .map_err(|_| AppError::InvalidDate(format!("Data inválida: '{vencimento}'. Use ddmmaaaa.")))?;

    Ok(FeeRequest {
        principal: parse_amount(&valor)?,
        due_date: parse_date_ddmmyyyy(&vencimento)?,
        payment_date: today,
        period: None,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()
    }

    #[test]
    fn root_params_pick_one_variant() {
        let all = TableRequest::from_params(&RootParams::default()).unwrap();
        assert_eq!(all, TableRequest::ListAll { raw: false });

        let raw = RootParams {
            formato: Some("bruto".into()),
            ..Default::default()
        };
        assert_eq!(TableRequest::from_params(&raw).unwrap(), TableRequest::ListAll { raw: true });

        let lookup = RootParams {
            mes_ano: Some("032024".into()),
            formato: Some("bruto".into()),
        };
        assert_eq!(
            TableRequest::from_params(&lookup).unwrap(),
            TableRequest::LookupPeriod(RatePeriod { year: 2024, month: 3 })
        );

        let bad = RootParams {
            mes_ano: Some("3-2024".into()),
            ..Default::default()
        };
        assert!(matches!(TableRequest::from_params(&bad), Err(AppError::InvalidPeriodFormat(_))));
    }

    #[test]
    fn missing_selic_period_is_format_error() {
        let err = SelicParams::default().period().unwrap_err();
        assert!(matches!(err, AppError::InvalidPeriodFormat(_)));
    }

    #[test]
    fn calc_params_require_amount_and_due_date() {
        let params = CalcParams {
            vencimento_guia: Some("01022024".into()),
            ..Default::default()
        };
        assert!(matches!(params.to_request(today()), Err(AppError::InvalidAmount(_))));

        let params = CalcParams {
            valor_guia: Some("100,00".into()),
            ..Default::default()
        };
        assert!(matches!(params.to_request(today()), Err(AppError::InvalidDate(_))));

        let params = CalcParams {
            valor_guia: Some("100,00".into()),
            vencimento_guia: Some("01022024".into()),
            selic: Some("012024".into()),
        };
        let req = params.to_request(today()).unwrap();
        assert_eq!(req.principal, Decimal::new(100, 0));
        assert_eq!(req.payment_date, today());
        assert_eq!(req.period, Some(RatePeriod { year: 2024, month: 1 }));
    }

    #[test]
    fn shortcut_segments_are_percent_decoded() {
        let req = shortcut_request("1.500%2C25", "01022024", today()).unwrap();
        assert_eq!(req.principal, Decimal::new(150025, 2));
        assert!(req.period.is_none());
    }
}
