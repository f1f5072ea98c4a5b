use scraper::Html;
use tracing::info;

use super::{conform, has_data, MetricTable};
use crate::parser::normalize::{clean_metric_name, normalize};
use crate::parser::sections::{locate, RATIOS};
use crate::parser::tables::{tables_in, Table};

/// Ratio sections often carry a different column count than the quarterly
/// table, so every row is padded or cut to the axis.
pub fn extract(doc: &Html, ticker: &str, axis: &[String]) -> MetricTable {
    let mut out = MetricTable::new();

    for section in locate(doc, RATIOS) {
        let Some(el) = tables_in(section).into_iter().next() else {
            continue;
        };
        for cells in Table::read(el).rows {
            if cells.len() < 2 {
                continue;
            }
            let name = clean_metric_name(&cells[0]);
            let values: Vec<String> = cells[1..].iter().map(|c| normalize(c)).collect();
            let values = conform(values, axis.len());
            if has_data(&name, &values) {
                out.insert(name, values);
            }
        }
    }

    if !out.is_empty() {
        info!("Extracted {} ratio metrics for {}", out.len(), ticker);
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
    fn rows_conform_to_axis() {
        let html = std::fs::read_to_string("tests/fixtures/reliance.html").unwrap();
        let doc = Html::parse_document(&html);
        let ratios = extract(&doc, "RELIANCE", &axis(5));
        assert_eq!(ratios["Debtor Days"], vec!["10", "12", "11", "", ""]);
        assert_eq!(ratios["ROCE %"], vec!["0.09", "0.09", "0.1", "", ""]);

        let short = extract(&doc, "RELIANCE", &axis(2));
        assert_eq!(short["Debtor Days"], vec!["10", "12"]);
    }

    #[test]
    fn class_based_ratio_section() {
        let doc = Html::parse_document(
            r#"<div class="Key-Ratios"><table><tbody>
                 <tr><td>Interest Coverage</td><td>3.1x</td></tr>
                 <tr><td>Lonely</td></tr>
               </tbody></table></div>"#,
        );
        let ratios = extract(&doc, "X", &axis(3));
        assert_eq!(ratios.len(), 1);
        assert_eq!(ratios["Interest Coverage"], vec!["3.1", "", ""]);
    }

    #[test]
    fn values_beyond_axis_do_not_count() {
        let doc = Html::parse_document(
            r#"<section id="ratios"><table><tbody>
                 <tr><td>Late</td><td>-</td><td>7</td></tr>
               </tbody></table></section>"#,
        );
        assert!(extract(&doc, "X", &axis(1)).is_empty());
    }
}
