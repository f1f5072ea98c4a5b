//! Per-share rows gathered across every section. Sections are walked in page
//! order and the first row with a given name is kept, so a full quarterly
//! row beats the shorter annual row of the same name further down.

use scraper::Html;
use tracing::info;

use super::{conform, has_data, MetricTable};
use crate::parser::normalize::{clean_metric_name, normalize};
use crate::parser::sections::{locate, ALL_SECTIONS};
use crate::parser::tables::{tables_in, Table};

const KEYWORDS: &[&str] = &["per share", "eps", "book value", "dividend"];

/// Per-share rows from anywhere on the page. A row too short for the axis
/// becomes a single-value series. The first occurrence of a name wins.
pub fn extract(doc: &Html, ticker: &str, axis: &[String]) -> MetricTable {
    let mut out = MetricTable::new();
    let width = axis.len();
    if width == 0 {
        return out;
    }

    for section in locate(doc, ALL_SECTIONS) {
        for el in tables_in(section) {
            for cells in Table::read(el).rows {
                if cells.len() < 2 {
                    continue;
                }
                let name = clean_metric_name(&cells[0]);
                let lower = name.to_lowercase();
                if !KEYWORDS.iter().any(|kw| lower.contains(kw)) || out.contains_key(&name) {
                    continue;
                }

                let values: Vec<String> = if cells.len() >= width + 1 {
                    cells[1..=width].iter().map(|c| normalize(c)).collect()
                } else {
                    conform(vec![normalize(&cells[1])], width)
                };
                if has_data(&name, &values) {
                    out.insert(name, values);
                }
            }
        }
    }

    if !out.is_empty() {
        info!("Extracted {} per share metrics for {}", out.len(), ticker);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("P{}", i)).collect()
    }

    #[test]
    fn picks_keyword_rows_across_sections() {
        let html = std::fs::read_to_string("tests/fixtures/reliance.html").unwrap();
        let doc = Html::parse_document(&html);
        let ps = extract(&doc, "RELIANCE", &axis(5));

        // Full quarterly row seen first; the shorter annual row is ignored.
        assert_eq!(ps["EPS in Rs"], vec!["28.01", "26.92", "25.71", "25.52", "28.01"]);
        assert_eq!(ps["Book Value"], vec!["1250", "", "", "", ""]);
        assert_eq!(ps["Dividend Yield"], vec!["0.0035", "", "", "", ""]);
        assert!(!ps.contains_key("Sales +"));
        assert!(ps.values().all(|v| v.len() == 5));
    }

    #[test]
    fn rows_outside_sections_are_ignored() {
        let doc = Html::parse_document(
            "<table><tbody><tr><td>EPS</td><td>4</td></tr></tbody></table>",
        );
        assert!(extract(&doc, "X", &axis(2)).is_empty());
    }

    #[test]
    fn no_axis_no_rows() {
        let doc = Html::parse_document(
            "<section><table><tbody><tr><td>EPS</td><td>4</td></tr></tbody></table></section>",
        );
        assert!(extract(&doc, "X", &[]).is_empty());
        assert_eq!(extract(&doc, "X", &axis(1))["EPS"], vec!["4"]);
    }
}
