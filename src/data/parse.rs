//! HTML → `RateTable`.
//!
//! The Receita Federal page carries several tables inside its main content
//! container; the monthly Selic matrix for the supported years is the sixth.
//! Rows are months, columns are years (see `YearRange::column_of`).

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::domain::{RateTable, YearRange};
use crate::error::AppError;

/// Location of the monthly matrix inside the page.
pub const TABLE_SELECTOR: &str = "#parent-fieldname-text > table:nth-of-type(6)";

/// Parse the source page into a fresh table.
///
/// Fails with `MalformedUpstreamDocument` when the table is absent. Rows that
/// are narrower than the year range only contribute the cells they have.
pub fn parse_rate_table(html: &str, years: YearRange) -> Result<RateTable, AppError> {
    let document = Html::parse_document(html);
    let table_sel = selector(TABLE_SELECTOR)?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;

    let Some(table_el) = document.select(&table_sel).next() else {
        return Err(AppError::MalformedUpstreamDocument(format!(
            "Rate table not found in source page (selector `{TABLE_SELECTOR}`)."
        )));
    };

    let mut table = RateTable::empty(years);
    let mut rows = 0usize;
    let mut short_rows = 0usize;

    for (idx, row) in table_el.select(&row_sel).enumerate() {
        let cells: Vec<String> = row.select(&cell_sel).map(cell_text).collect();
        // Header rows made only of <th>.
        if cells.is_empty() {
            continue;
        }
        rows += 1;

        if cells.len() <= years.last_column() {
            short_rows += 1;
            warn!(
                row = idx,
                cells = cells.len(),
                expected = years.last_column() + 1,
                "rate table row narrower than the configured year range"
            );
        }

        for year in years.iter() {
            let Some(col) = years.column_of(year) else {
                continue;
            };
            if let Some(text) = cells.get(col) {
                table.push(year, text.clone());
            }
        }
    }

    for year in years.iter() {
        if table.raw(year).is_empty() {
            warn!(year, "no cells found for year; upstream layout may have changed");
        }
    }

    debug!(rows, short_rows, "parsed rate table");
    Ok(table)
}

fn selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css).map_err(|e| AppError::Server(format!("Invalid selector `{css}`: {e}")))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}
