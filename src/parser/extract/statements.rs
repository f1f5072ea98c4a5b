use scraper::Html;
use tracing::info;

use super::{aligned_rows, MetricTable};
use crate::parser::sections::{locate, Locator, BALANCE_SHEET, CASH_FLOW};
use crate::parser::tables::{tables_in, Table};

pub fn balance_sheet(doc: &Html, ticker: &str, axis: &[String]) -> MetricTable {
    let out = extract_named(doc, BALANCE_SHEET, axis);
    if !out.is_empty() {
        info!("Extracted {} balance sheet metrics for {}", out.len(), ticker);
    }
    out
}

pub fn cash_flow(doc: &Html, ticker: &str, axis: &[String]) -> MetricTable {
    let out = extract_named(doc, CASH_FLOW, axis);
    if !out.is_empty() {
        info!("Extracted {} cash flow metrics for {}", out.len(), ticker);
    }
    out
}

/// Every table in the named section, rows aligned to an already known axis.
fn extract_named(doc: &Html, strategies: &[Locator], axis: &[String]) -> MetricTable {
    let mut out = MetricTable::new();
    if axis.is_empty() {
        return out;
    }
    for section in locate(doc, strategies) {
        for el in tables_in(section) {
            out.extend(aligned_rows(&Table::read(el), axis.len()));
        }
    }
    out
}
