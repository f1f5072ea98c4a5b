use scraper::Html;
use tracing::{info, warn};

use super::{aligned_rows, SectionData};
use crate::parser::sections::{locate_table, QUARTERS};
use crate::parser::tables::Table;

/// Quarterly results table. Primary source of the quarter axis.
pub fn extract(doc: &Html, ticker: &str) -> SectionData {
    let Some(el) = locate_table(doc, QUARTERS) else {
        warn!("Quarterly data not found for {}", ticker);
        return SectionData::default();
    };

    let table = Table::read(el);
    let axis = table.periods();
    if axis.is_empty() {
        warn!("No quarters found for {}", ticker);
        return SectionData::default();
    }

    let metrics = aligned_rows(&table, axis.len());
    info!("Extracted {} quarterly metrics for {}", metrics.len(), ticker);
    SectionData { metrics, axis }
}
