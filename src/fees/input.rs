//! Parsing of request-facing values: amounts, `DDMMYYYY` dates, `MMYYYY` periods.
//!
//! Messages are Portuguese because they are returned verbatim to API callers.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::RatePeriod;
use crate::error::AppError;

/// Parse a principal written with a comma decimal separator (`"1.234,56"`).
///
/// Without a comma, dots grouping digits in threes (`"1.000"`, `"1.234.567"`)
/// are thousands separators; any other single dot (`"1234.56"`) is a decimal
/// point. The value is rounded to four decimal places and must be strictly
/// positive.
pub fn parse_amount(raw: &str) -> Result<Decimal, AppError> {
    let trimmed = raw.trim();
    let invalid = || AppError::InvalidAmount(format!("Valor inválido: '{trimmed}'."));

    if trimmed.is_empty() {
        return Err(invalid());
    }

    let normalized = if trimmed.contains(',') || is_thousands_grouped(trimmed) {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.to_string()
    };

    let body = normalized.strip_prefix('-').unwrap_or(&normalized);
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(invalid());
    }

    let value = Decimal::from_str(&normalized).map_err(|_| invalid())?;
    if value <= Decimal::ZERO {
        return Err(AppError::InvalidAmount(
            "O valor da guia deve ser maior que zero.".to_string(),
        ));
    }
    Ok(value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero))
}

/// `^\d{1,3}(\.\d{3})+$`
fn is_thousands_grouped(raw: &str) -> bool {
    let mut groups = raw.split('.');
    let Some(head) = groups.next() else {
        return false;
    };
    let all_digits = |g: &str| g.bytes().all(|b| b.is_ascii_digit());
    let mut tail_count = 0;
    for group in groups {
        if group.len() != 3 || !all_digits(group) {
            return false;
        }
        tail_count += 1;
    }
    tail_count > 0 && (1..=3).contains(&head.len()) && all_digits(head)
}

/// Parse a `DDMMYYYY` date.
pub fn parse_date_ddmmyyyy(raw: &str) -> Result<NaiveDate, AppError> {
    let trimmed = raw.trim();
    let invalid = || AppError::InvalidDate(format!("Data inválida: '{trimmed}'. Use ddmmaaaa."));

    if trimmed.len() != 8 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let day: u32 = trimmed[0..2].parse().map_err(|_| invalid())?;
    let month: u32 = trimmed[2..4].parse().map_err(|_| invalid())?;
    let year: i32 = trimmed[4..8].parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Parse an `MMYYYY` rate period: exactly six ASCII digits naming a real month.
pub fn parse_period(raw: &str) -> Result<RatePeriod, AppError> {
    let invalid = || AppError::InvalidPeriodFormat("Formato inválido. Use mmyyyy.".to_string());

    if raw.len() != 6 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let month: u32 = raw[0..2].parse().map_err(|_| invalid())?;
    let year: i32 = raw[2..6].parse().map_err(|_| invalid())?;
    RatePeriod::new(year, month).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_accept_comma_and_dot_decimals() {
        assert_eq!(parse_amount("1000,50").unwrap(), Decimal::new(100050, 2));
        assert_eq!(parse_amount("1.234,56").unwrap(), Decimal::new(123456, 2));
        assert_eq!(parse_amount("1234.56").unwrap(), Decimal::new(123456, 2));
        assert_eq!(parse_amount("1.000").unwrap(), Decimal::new(1000, 0));
        assert_eq!(parse_amount("1.234.567").unwrap(), Decimal::new(1234567, 0));
        assert_eq!(parse_amount("12.5").unwrap(), Decimal::new(125, 1));
        assert_eq!(parse_amount(" 10 ").unwrap(), Decimal::new(10, 0));
    }

    #[test]
    fn amounts_round_to_four_places() {
        assert_eq!(parse_amount("1,123456").unwrap(), Decimal::new(11235, 4));
    }

    #[test]
    fn malformed_or_non_positive_amounts_are_rejected() {
        for raw in ["", "abc", "12a", "1e5", "0", "0,00", "-5,00", "--1", "1,2,3"] {
            let err = parse_amount(raw).unwrap_err();
            assert!(matches!(err, AppError::InvalidAmount(_)), "{raw}");
        }
    }

    #[test]
    fn dates_are_ddmmyyyy() {
        assert_eq!(
            parse_date_ddmmyyyy("15032024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
        for raw in ["1503202", "31022024", "2024-03-15", "15/03/24", "abcdefgh"] {
            assert!(matches!(parse_date_ddmmyyyy(raw), Err(AppError::InvalidDate(_))), "{raw}");
        }
    }

    #[test]
    fn periods_are_six_digits() {
        assert_eq!(parse_period("122023").unwrap(), RatePeriod { year: 2023, month: 12 });
        for raw in ["12023", "1220234", "12-202", "132023", "002023", "１２２０２３"] {
            assert!(matches!(parse_period(raw), Err(AppError::InvalidPeriodFormat(_))), "{raw}");
        }
    }
}
