//! Formatted terminal output.
//!
//! We keep formatting code in one place so the table and fee code stay free of
//! presentation concerns.

use crate::domain::{FeeComputation, MONTH_NAMES, RateTable};

const MONTH_COL: usize = 10;
const YEAR_COL: usize = 8;

/// Render the table the way it is published: months down, years across.
pub fn format_rate_table(table: &RateTable) -> String {
    let years: Vec<i32> = table.years().iter().collect();
    let mut out = String::new();

    out.push_str(&format!("=== Selic mensal (%) {} ===\n", table.years()));
    out.push_str(&format!("{:<MONTH_COL$}", "Mês"));
    for year in &years {
        out.push_str(&format!("{year:>YEAR_COL$}"));
    }
    out.push('\n');
    out.push_str(&"-".repeat(MONTH_COL + YEAR_COL * years.len()));
    out.push('\n');

    for (idx, name) in MONTH_NAMES.iter().enumerate() {
        out.push_str(&format!("{name:<MONTH_COL$}"));
        for year in &years {
            let cell = table
                .months(*year)
                .get(idx)
                .map(String::as_str)
                .filter(|c| !c.is_empty())
                .unwrap_or("-");
            out.push_str(&format!("{cell:>YEAR_COL$}"));
        }
        out.push('\n');
    }

    if table.is_empty() {
        out.push_str("\n(no data: rate table not found in source page)\n");
    }
    out
}

/// Render a raw view: every scraped cell per year, label included.
pub fn format_raw_table(table: &RateTable) -> String {
    let mut out = String::new();
    for (year, cells) in table.raw_view() {
        out.push_str(&format!("{year}: [{}]\n", cells.join(", ")));
    }
    out
}

/// Render one fee computation.
pub fn format_fee(fee: &FeeComputation) -> String {
    let mut out = String::new();
    out.push_str("=== Acréscimos por atraso ===\n");
    out.push_str(&format!("Valor original : {:>12}\n", fee.principal));
    out.push_str(&format!("Vencimento     : {}\n", fee.due_date.format("%d/%m/%Y")));
    out.push_str(&format!("Pagamento      : {}\n", fee.payment_date.format("%d/%m/%Y")));
    out.push_str(&format!("Dias de atraso : {}\n", fee.days_overdue));
    out.push_str(&format!("Multa          : {:>12}\n", fee.penalty));
    match (fee.rate_period, fee.rate_percent) {
        (Some(period), Some(rate)) => out.push_str(&format!(
            "Juros          : {:>12}  (Selic {period}: {rate}%)\n",
            fee.interest
        )),
        _ => out.push_str(&format!("Juros          : {:>12}\n", fee.interest)),
    }
    out.push_str(&format!("Total          : {:>12}\n", fee.total));
    out
}
