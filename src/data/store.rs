//! The process-wide rate table.
//!
//! One store is built at startup and shared by every request. Each fetch
//! parses into a brand-new `RateTable` and swaps it in whole, so readers see
//! either the previous table or the new one, never a half-filled one.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::data::parse::parse_rate_table;
use crate::data::source::RateSource;
use crate::domain::{RatePeriod, RateTable, YearRange};
use crate::error::AppError;

/// Resolve the rate charged for a reference period.
///
/// Implementations reject a reference year outside the supported range before
/// applying the next-month rule (`RatePeriod::chargeable`), so December of the
/// year before the range does not borrow the range's first January. The
/// trimmed cell text is returned untouched.
pub trait RateLookup {
    fn lookup(&self, period: RatePeriod) -> Result<String, AppError>;
}

impl RateLookup for RateTable {
    fn lookup(&self, period: RatePeriod) -> Result<String, AppError> {
        self.years().require(period.year)?;
        let chargeable = period.chargeable();
        self.cell(chargeable.year, chargeable.month).map(str::to_string)
    }
}

struct Snapshot {
    table: Arc<RateTable>,
    fetched_at: Instant,
}

pub struct RateTableStore {
    source: Box<dyn RateSource>,
    years: YearRange,
    ttl: Duration,
    current: RwLock<Option<Snapshot>>,
}

impl RateTableStore {
    /// `ttl` of zero re-fetches on every `table()` call.
    pub fn new(source: Box<dyn RateSource>, years: YearRange, ttl: Duration) -> Self {
        Self {
            source,
            years,
            ttl,
            current: RwLock::new(None),
        }
    }

    pub fn years(&self) -> YearRange {
        self.years
    }

    /// Fetch and parse the source page, replacing the current table.
    ///
    /// A page without the expected table yields an empty table rather than an
    /// error. On transport failure the previous table is kept.
    pub fn fetch(&self) -> Result<Arc<RateTable>, AppError> {
        let html = self.source.fetch_document()?;
        let table = match parse_rate_table(&html, self.years) {
            Ok(table) => table,
            Err(AppError::MalformedUpstreamDocument(msg)) => {
                warn!(source = self.source.describe(), "{msg}");
                RateTable::empty(self.years)
            }
            Err(e) => return Err(e),
        };

        let table = Arc::new(table);
        *self.current.write() = Some(Snapshot {
            table: Arc::clone(&table),
            fetched_at: Instant::now(),
        });

        info!(
            years = %self.years,
            empty = table.is_empty(),
            "rate table replaced"
        );
        Ok(table)
    }

    /// Current table, re-fetched unless the last fetch is younger than the TTL.
    pub fn table(&self) -> Result<Arc<RateTable>, AppError> {
        if !self.ttl.is_zero() {
            if let Some(snapshot) = self.current.read().as_ref() {
                if snapshot.fetched_at.elapsed() < self.ttl {
                    debug!("serving cached rate table");
                    return Ok(Arc::clone(&snapshot.table));
                }
            }
        }
        self.fetch()
    }

    /// Last table swapped in, without touching the source.
    pub fn cached(&self) -> Option<Arc<RateTable>> {
        self.current.read().as_ref().map(|s| Arc::clone(&s.table))
    }
}

impl RateLookup for RateTableStore {
    fn lookup(&self, period: RatePeriod) -> Result<String, AppError> {
        self.years.require(period.year)?;
        self.table()?.lookup(period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{StaticSource, sample_page, wrap_tables};

    fn store(source: StaticSource, ttl: Duration) -> RateTableStore {
        RateTableStore::new(Box::new(source), YearRange::default(), ttl)
    }

    #[test]
    fn repeated_fetches_replace_instead_of_accumulating() {
        let store = store(StaticSource::new(sample_page()), Duration::ZERO);
        let first = store.fetch().unwrap();
        let second = store.fetch().unwrap();
        assert_eq!(first.raw(2022).len(), 13);
        assert_eq!(second.raw(2022).len(), 13);
        assert_eq!(*first, *second);
    }

    #[test]
    fn zero_ttl_always_refetches() {
        let source = StaticSource::new(sample_page());
        let calls = source.calls();
        let store = store(source, Duration::ZERO);
        store.table().unwrap();
        store.table().unwrap();
        store.lookup(RatePeriod::new(2023, 5).unwrap()).unwrap();
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn positive_ttl_serves_cached_table() {
        let source = StaticSource::new(sample_page());
        let calls = source.calls();
        let store = store(source, Duration::from_secs(3600));
        store.table().unwrap();
        store.table().unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn lookup_uses_following_month() {
        let store = store(StaticSource::new(sample_page()), Duration::ZERO);
        // December 2023 reads January 2024.
        assert_eq!(store.lookup(RatePeriod::new(2023, 12).unwrap()).unwrap(), "0,97");
        // May 2023 reads June 2023.
        assert_eq!(store.lookup(RatePeriod::new(2023, 5).unwrap()).unwrap(), "1,07");
    }

    #[test]
    fn lookup_past_supported_range_is_insufficient() {
        let store = store(StaticSource::new(sample_page()), Duration::ZERO);
        let err = store.lookup(RatePeriod::new(2025, 12).unwrap()).unwrap_err();
        assert!(matches!(err, AppError::InsufficientData(_)));
    }

    #[test]
    fn year_before_range_is_rejected_before_the_shift() {
        let source = StaticSource::new(sample_page());
        let calls = source.calls();
        let store = store(source, Duration::ZERO);

        // December 2019 would shift into January 2020, which is published.
        let err = store.lookup(RatePeriod::new(2019, 12).unwrap()).unwrap_err();
        assert!(matches!(err, AppError::InsufficientData(ref m) if m.contains("Ano fora")));
        assert_eq!(calls.get(), 0);

        let table = store.fetch().unwrap();
        let err = table.lookup(RatePeriod::new(2019, 12).unwrap()).unwrap_err();
        assert!(matches!(err, AppError::InsufficientData(_)));
        assert!(table.lookup(RatePeriod::new(2020, 12).unwrap()).is_ok());
    }

    #[test]
    fn page_without_table_becomes_empty_table() {
        let store = store(StaticSource::new(wrap_tables(2, "")), Duration::ZERO);
        let table = store.fetch().unwrap();
        assert!(table.is_empty());
        let err = store.lookup(RatePeriod::new(2022, 1).unwrap()).unwrap_err();
        assert!(matches!(err, AppError::InsufficientData(_)));
    }

    #[test]
    fn failed_fetch_keeps_previous_table() {
        let source = StaticSource::new(sample_page());
        let failing = source.failure_switch();
        let store = store(source, Duration::ZERO);
        store.fetch().unwrap();

        failing.set(true);
        let err = store.fetch().unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable(_)));
        assert!(store.cached().is_some_and(|t| !t.is_empty()));
    }
}
