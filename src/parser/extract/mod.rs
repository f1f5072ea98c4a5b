pub mod annual;
pub mod per_share;
pub mod profile;
pub mod quarterly;
pub mod ratios;
pub mod statements;

use std::collections::BTreeMap;

use serde::Serialize;

use super::classify::Category;
use super::normalize::{clean_metric_name, normalize};
use super::tables::Table;

/// Metric name → value tokens, as emitted by one section extractor.
pub type MetricTable = BTreeMap<String, Vec<String>>;

/// Output of an axis-establishing extractor (quarterly, annual).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionData {
    pub metrics: MetricTable,
    pub axis: Vec<String>,
}

impl SectionData {
    pub fn is_usable(&self) -> bool {
        !self.metrics.is_empty() && !self.axis.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSeries {
    pub values: Vec<String>,
    pub category: Category,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompanyProfile {
    pub category: String,
    pub industry: String,
}

/// Everything known about one ticker after a collect.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub ticker: String,
    pub metrics: BTreeMap<String, MetricSeries>,
    pub axis: Vec<String>,
    pub profile: CompanyProfile,
}

impl ExtractionResult {
    pub fn empty(ticker: &str) -> Self {
        ExtractionResult {
            ticker: ticker.to_string(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() || self.axis.is_empty()
    }

    /// Number of non-empty data points across all series.
    pub fn data_points(&self) -> usize {
        self.metrics
            .values()
            .map(|s| s.values.iter().filter(|v| !v.is_empty()).count())
            .sum()
    }
}

/// Rows carrying a full set of `width` values after the name cell.
/// Shorter rows are skipped; extra trailing cells are ignored.
pub(crate) fn aligned_rows(table: &Table, width: usize) -> MetricTable {
    let mut out = MetricTable::new();
    for cells in &table.rows {
        if cells.len() < width + 1 {
            continue;
        }
        let name = clean_metric_name(&cells[0]);
        let values: Vec<String> = cells[1..=width].iter().map(|c| normalize(c)).collect();
        if has_data(&name, &values) {
            out.insert(name, values);
        }
    }
    out
}

pub(crate) fn has_data(name: &str, values: &[String]) -> bool {
    !name.is_empty() && values.iter().any(|v| !v.is_empty())
}

/// Pad with empty tokens or truncate so `values.len() == width`.
pub(crate) fn conform(mut values: Vec<String>, width: usize) -> Vec<String> {
    values.resize(width, String::new());
    values
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn aligned_rows_filters_and_cleans() {
        let table = Table {
            header: row(&["", "Mar 2023", "Jun 2023"]),
            rows: vec![
                row(&["Sales\u{a0}+", "1,000", "(50)"]),
                row(&["Foo", "-", "n/a"]),
                row(&["Short", "1"]),
                row(&["", "1", "2"]),
                row(&["OPM %", "12%", "13%", "extra"]),
            ],
        };
        let rows = aligned_rows(&table, 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows["Sales +"], vec!["1000", "-50"]);
        assert_eq!(rows["OPM %"], vec!["0.12", "0.13"]);
        assert!(!rows.contains_key("Foo"));
    }

    #[test]
    fn conform_pads_and_truncates() {
        assert_eq!(conform(row(&["1"]), 3), vec!["1", "", ""]);
        assert_eq!(conform(row(&["1", "2", "3"]), 2), vec!["1", "2"]);
        assert!(conform(row(&["1"]), 0).is_empty());
    }

    #[test]
    fn empty_result_shape() {
        let r = ExtractionResult::empty("XYZ");
        assert!(r.is_empty());
        assert_eq!(r.ticker, "XYZ");
        assert_eq!(r.profile, CompanyProfile::default());
        assert_eq!(r.data_points(), 0);
    }
}
