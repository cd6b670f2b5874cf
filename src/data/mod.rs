//! Upstream rate data: fetching the source page, parsing it, and holding the
//! current table.

pub mod parse;
pub mod source;
pub mod store;

pub use parse::{TABLE_SELECTOR, parse_rate_table};
pub use source::{HttpRateSource, RateSource};
pub use store::{RateLookup, RateTableStore};

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::RateSource;
    use crate::error::AppError;

    const YEARS: [(i32, [&str; 12]); 6] = [
        (2020, ["0,38", "0,29", "0,34", "0,28", "0,24", "0,21", "0,19", "0,16", "0,16", "0,16", "0,15", "0,16"]),
        (2021, ["0,15", "0,13", "0,20", "0,21", "0,27", "0,31", "0,36", "0,43", "0,44", "0,49", "0,59", "0,77"]),
        (2022, ["0,73", "0,76", "0,93", "0,83", "1,03", "1,02", "1,03", "1,17", "1,07", "1,02", "1,02", "1,12"]),
        (2023, ["1,12", "0,92", "1,17", "0,92", "1,12", "1,07", "1,07", "1,14", "0,97", "1,00", "0,92", "0,89"]),
        (2024, ["0,97", "0,80", "0,83", "0,89", "0,83", "0,79", "0,91", "0,87", "0,84", "0,93", "0,79", "0,93"]),
        (2025, ["1,01", "0,99", "0,96", "1,06", "1,14", "1,10", "1,28", "1,16", "1,22", "---", "---", "---"]),
    ];

    const MONTHS: [&str; 12] = [
        "Janeiro", "Fevereiro", "Março", "Abril", "Maio", "Junho", "Julho", "Agosto", "Setembro",
        "Outubro", "Novembro", "Dezembro",
    ];

    /// Content container holding `count` tables; the last one gets `rows`.
    pub fn wrap_tables(count: usize, rows: &str) -> String {
        let mut body = String::from("<div id=\"parent-fieldname-text\"><p>Taxa de juros Selic</p>");
        for i in 1..count {
            body.push_str(&format!("<table><tr><td>outra tabela {i}</td><td>9,99</td></tr></table>"));
        }
        if count > 0 {
            body.push_str(&format!("<table>{rows}</table>"));
        }
        body.push_str("</div>");
        format!("<html><head><title>Selic</title></head><body>{body}</body></html>")
    }

    /// A page shaped like the published one: year label row plus twelve month rows.
    pub fn sample_page() -> String {
        let mut rows = String::from("<tr><td>Mês/Ano</td>");
        for (year, _) in YEARS {
            rows.push_str(&format!("<td>{year}</td>"));
        }
        rows.push_str("</tr>");
        for (m, month) in MONTHS.iter().enumerate() {
            rows.push_str(&format!("<tr><td>{month}</td>"));
            for (_, values) in YEARS {
                rows.push_str(&format!("<td> {} </td>", values[m]));
            }
            rows.push_str("</tr>");
        }
        wrap_tables(6, &rows)
    }

    #[derive(Clone)]
    pub struct CallCounter(Arc<AtomicUsize>);

    impl CallCounter {
        pub fn get(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[derive(Clone)]
    pub struct FailureSwitch(Arc<AtomicBool>);

    impl FailureSwitch {
        pub fn set(&self, failing: bool) {
            self.0.store(failing, Ordering::SeqCst);
        }
    }

    /// In-memory source serving a fixed document.
    pub struct StaticSource {
        html: String,
        calls: CallCounter,
        failing: FailureSwitch,
    }

    impl StaticSource {
        pub fn new(html: String) -> Self {
            Self {
                html,
                calls: CallCounter(Arc::new(AtomicUsize::new(0))),
                failing: FailureSwitch(Arc::new(AtomicBool::new(false))),
            }
        }

        pub fn calls(&self) -> CallCounter {
            self.calls.clone()
        }

        pub fn failure_switch(&self) -> FailureSwitch {
            self.failing.clone()
        }
    }

    impl RateSource for StaticSource {
        fn fetch_document(&self) -> Result<String, AppError> {
            self.calls.0.fetch_add(1, Ordering::SeqCst);
            if self.failing.0.load(Ordering::SeqCst) {
                return Err(AppError::UpstreamUnavailable("fonte indisponível".to_string()));
            }
            Ok(self.html.clone())
        }

        fn describe(&self) -> &str {
            "static"
        }
    }
}
