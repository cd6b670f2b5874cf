//! Shared domain types.
//!
//! These types are intentionally kept small and serializable so they can be:
//!
//! - built fresh on every upstream fetch
//! - returned as JSON by the HTTP layer
//! - printed or exported by the CLI

use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::AppError;

/// Receita Federal page that publishes the monthly Selic table.
pub const DEFAULT_SOURCE_URL: &str = "https://www.gov.br/receitafederal/pt-br/assuntos/orientacao-tributaria/pagamentos-e-parcelamentos/taxa-de-juros-selic#Selicmensalmente";

pub const DEFAULT_FIRST_YEAR: i32 = 2020;
pub const DEFAULT_LAST_YEAR: i32 = 2025;

/// Month labels as published, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// A year label plus twelve months; anything past this is upstream duplication.
pub const MAX_COLUMN_ENTRIES: usize = 13;

/// Contiguous, inclusive range of years the table is scraped for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    first: i32,
    last: i32,
}

impl YearRange {
    pub fn new(first: i32, last: i32) -> Result<Self, AppError> {
        if first > last {
            return Err(AppError::Config(format!(
                "Invalid year range: first year {first} is after last year {last}."
            )));
        }
        Ok(Self { first, last })
    }

    pub fn first(self) -> i32 {
        self.first
    }

    pub fn last(self) -> i32 {
        self.last
    }

    pub fn contains(self, year: i32) -> bool {
        (self.first..=self.last).contains(&year)
    }

    /// `InsufficientData` unless `year` is inside the range.
    pub fn require(self, year: i32) -> Result<(), AppError> {
        if self.contains(year) {
            Ok(())
        } else {
            Err(AppError::InsufficientData(format!(
                "Ano fora do intervalo suportado ({self})."
            )))
        }
    }

    pub fn iter(self) -> impl Iterator<Item = i32> {
        self.first..=self.last
    }

    /// Cell index holding `year` inside a data row.
    ///
    /// Column layout of the published table:
    ///
    /// | cell | content            |
    /// |------|--------------------|
    /// | 0    | month label        |
    /// | 1    | first year         |
    /// | 1+k  | first year + k     |
    pub fn column_of(self, year: i32) -> Option<usize> {
        if !self.contains(year) {
            return None;
        }
        usize::try_from(year - self.first).ok().map(|k| k + 1)
    }

    /// Widest cell index a complete row must have.
    pub fn last_column(self) -> usize {
        self.column_of(self.last).unwrap_or(1)
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            first: DEFAULT_FIRST_YEAR,
            last: DEFAULT_LAST_YEAR,
        }
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.last)
    }
}

/// A (year, month) key into the rate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RatePeriod {
    pub year: i32,
    pub month: u32,
}

impl RatePeriod {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The period whose published rate is charged for this reference period.
    ///
    /// A month's rate is only published once it closes, so it applies to the
    /// following month. December rolls into January of the next year.
    pub fn chargeable(self) -> Self {
        if self.month >= 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn month_name(self) -> &'static str {
        MONTH_NAMES[(self.month.clamp(1, 12) - 1) as usize]
    }
}

impl fmt::Display for RatePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

/// Parse a published rate cell (`"1,07"`) into a percentage.
///
/// Returns `None` for cells that are not published yet (`""`, `"---"`) and for
/// anything that is not a non-negative decimal.
pub fn parse_rate_percent(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim().trim_end_matches('%').trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '-') {
        return None;
    }
    let normalized = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.to_string()
    };
    let value = Decimal::from_str(&normalized).ok()?;
    if value.is_sign_negative() {
        return None;
    }
    Some(value)
}

/// Year → cells of that year's column, in document order.
///
/// Cells are stored trimmed but otherwise raw; numeric interpretation happens
/// at the point of use. A table is built whole by one fetch and never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateTable {
    years: YearRange,
    columns: BTreeMap<i32, Vec<String>>,
}

impl RateTable {
    pub fn empty(years: YearRange) -> Self {
        Self {
            years,
            columns: years.iter().map(|y| (y, Vec::new())).collect(),
        }
    }

    pub(crate) fn push(&mut self, year: i32, cell: String) {
        if self.years.contains(year) {
            self.columns.entry(year).or_default().push(cell);
        }
    }

    pub fn years(&self) -> YearRange {
        self.years
    }

    /// `true` when no year received a single cell.
    pub fn is_empty(&self) -> bool {
        self.columns.values().all(Vec::is_empty)
    }

    /// Everything scraped for `year`, duplicates included.
    pub fn raw(&self, year: i32) -> &[String] {
        self.columns.get(&year).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The monthly cells of `year`: year label removed, capped at twelve.
    pub fn months(&self, year: i32) -> &[String] {
        let raw = self.raw(year);
        let capped = &raw[..raw.len().min(MAX_COLUMN_ENTRIES)];
        match capped.first() {
            Some(first) if is_year_label(first, year) => &capped[1..],
            _ => &capped[..capped.len().min(12)],
        }
    }

    /// Raw cell for a period, without any month shift.
    pub fn cell(&self, year: i32, month: u32) -> Result<&str, AppError> {
        self.years.require(year)?;
        if !(1..=12).contains(&month) {
            return Err(AppError::InsufficientData("Ano ou mês inválido.".to_string()));
        }
        self.months(year)
            .get((month - 1) as usize)
            .map(String::as_str)
            .ok_or_else(|| {
                AppError::InsufficientData("Não existe Selic para esta data ainda!".to_string())
            })
    }

    /// Year → label plus months, capped against upstream duplication.
    pub fn raw_view(&self) -> BTreeMap<i32, Vec<String>> {
        self.columns
            .iter()
            .map(|(year, cells)| {
                let keep = cells.len().min(MAX_COLUMN_ENTRIES);
                (*year, cells[..keep].to_vec())
            })
            .collect()
    }

    /// Year → {month name → rate percent or null}, months in calendar order.
    pub fn formatted(&self) -> FormattedTable<'_> {
        FormattedTable { table: self }
    }
}

fn is_year_label(cell: &str, year: i32) -> bool {
    cell.trim() == year.to_string()
}

/// Serializable view of a table with month names and parsed rates.
pub struct FormattedTable<'a> {
    table: &'a RateTable,
}

struct FormattedYear<'a> {
    months: &'a [String],
}

impl Serialize for FormattedTable<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.table.columns.len()))?;
        for year in self.table.columns.keys() {
            map.serialize_entry(
                &year.to_string(),
                &FormattedYear {
                    months: self.table.months(*year),
                },
            )?;
        }
        map.end()
    }
}

impl Serialize for FormattedYear<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(MONTH_NAMES.len()))?;
        for (idx, name) in MONTH_NAMES.iter().enumerate() {
            let rate = self
                .months
                .get(idx)
                .and_then(|raw| parse_rate_percent(raw))
                .and_then(|r| r.to_f64());
            map.serialize_entry(name, &rate)?;
        }
        map.end()
    }
}

/// How the published percentage turns into interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterestConvention {
    /// `interest = principal × rate% / 100`.
    #[default]
    Percent,
    /// `interest = principal × (rate% / 100) / 100`, matching the numbers the
    /// legacy service produced.
    LegacyDoublePercent,
}

impl InterestConvention {
    /// Fraction of principal charged for a published percentage.
    pub fn fraction(self, rate_percent: Decimal) -> Decimal {
        let hundred = Decimal::ONE_HUNDRED;
        match self {
            InterestConvention::Percent => rate_percent / hundred,
            InterestConvention::LegacyDoublePercent => rate_percent / hundred / hundred,
        }
    }
}

/// Result of one late-payment computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeComputation {
    #[serde(rename = "valor_original", with = "rust_decimal::serde::float")]
    pub principal: Decimal,
    #[serde(rename = "data_vencimento", serialize_with = "serialize_br_date")]
    pub due_date: NaiveDate,
    #[serde(rename = "data_pagamento", serialize_with = "serialize_br_date")]
    pub payment_date: NaiveDate,
    #[serde(rename = "dias_atraso")]
    pub days_overdue: i64,
    #[serde(rename = "multa", with = "rust_decimal::serde::float")]
    pub penalty: Decimal,
    #[serde(rename = "juros", with = "rust_decimal::serde::float")]
    pub interest: Decimal,
    #[serde(rename = "valor_total", with = "rust_decimal::serde::float")]
    pub total: Decimal,
    /// Chargeable period whose rate was applied (absent when not overdue).
    #[serde(skip)]
    pub rate_period: Option<RatePeriod>,
    #[serde(skip)]
    pub rate_percent: Option<Decimal>,
}

fn serialize_br_date<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&date.format("%d/%m/%Y"))
}

/// Runtime configuration resolved from CLI flags, environment and `.env`.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind: SocketAddr,
    pub source_url: String,
    pub years: YearRange,
    pub timeout: Duration,
    /// Zero means every rate-dependent request re-fetches the source page.
    pub cache_ttl: Duration,
    pub convention: InterestConvention,
}
