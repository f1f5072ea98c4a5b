use scraper::Html;
use tracing::{info, warn};

use super::{aligned_rows, SectionData};
use crate::parser::sections::{locate_table, PROFIT_LOSS};
use crate::parser::tables::Table;

/// Prefix keeping annual rows apart from quarterly rows of the same name.
pub const PREFIX: &str = "Annual ";

/// Profit & loss (yearly) table. Its years only become the axis when the
/// quarterly table gave none; the aggregator decides that.
pub fn extract(doc: &Html, ticker: &str) -> SectionData {
    let Some(el) = locate_table(doc, PROFIT_LOSS) else {
        return SectionData::default();
    };

    let table = Table::read(el);
    let years = table.periods();
    if years.is_empty() {
        warn!("Annual section for {} has no year header", ticker);
        return SectionData::default();
    }

    let metrics = aligned_rows(&table, years.len())
        .into_iter()
        .map(|(name, values)| (format!("{PREFIX}{name}"), values))
        .collect::<super::MetricTable>();
    info!("Extracted {} annual metrics for {}", metrics.len(), ticker);
    SectionData {
        metrics,
        axis: years,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> Html {
        let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap();
        Html::parse_document(&html)
    }

    #[test]
    fn names_are_prefixed() {
        let data = extract(&fixture("reliance"), "RELIANCE");
        assert_eq!(data.axis, vec!["Mar 2022", "Mar 2023", "Mar 2024"]);
        assert_eq!(data.metrics["Annual Sales +"], vec!["700000", "877835", "899041"]);
        assert!(data.metrics.keys().all(|k| k.starts_with(PREFIX)));
    }

    #[test]
    fn annual_only_page() {
        let data = extract(&fixture("annual_only"), "ANNUAL");
        assert_eq!(data.axis, vec!["Mar 2022", "Mar 2023"]);
        assert_eq!(data.metrics["Annual Net Profit +"], vec!["120", "-15"]);
    }

    #[test]
    fn absent_section() {
        let doc = Html::parse_document("<section id='quarters'></section>");
        assert_eq!(extract(&doc, "X"), SectionData::default());
    }
}
