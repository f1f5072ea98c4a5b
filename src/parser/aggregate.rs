use std::collections::BTreeMap;

use anyhow::Result;
use scraper::Html;
use serde::Serialize;
use tracing::{info, warn};

use super::classify::CategoryRegistry;
use super::extract::{
    annual, conform, per_share, profile, quarterly, ratios, statements, ExtractionResult,
    MetricSeries, MetricTable,
};
use crate::fallback::Fallback;

/// Where the rows of a result came from, as persisted in `data_source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataSource {
    #[serde(rename = "SCREENER")]
    Screener,
    #[serde(rename = "FALLBACK")]
    Fallback,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Screener => "SCREENER",
            DataSource::Fallback => "FALLBACK",
        }
    }
}

/// Outcome of one collect. `Unavailable` always carries an empty result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "result")]
pub enum Collected {
    Live(ExtractionResult),
    Fallback(ExtractionResult),
    Unavailable(ExtractionResult),
}

impl Collected {
    pub fn result(&self) -> &ExtractionResult {
        match self {
            Collected::Live(r) | Collected::Fallback(r) | Collected::Unavailable(r) => r,
        }
    }

    pub fn into_result(self) -> ExtractionResult {
        match self {
            Collected::Live(r) | Collected::Fallback(r) | Collected::Unavailable(r) => r,
        }
    }

    pub fn source(&self) -> Option<DataSource> {
        match self {
            Collected::Live(_) => Some(DataSource::Screener),
            Collected::Fallback(_) => Some(DataSource::Fallback),
            Collected::Unavailable(_) => None,
        }
    }
}

/// Run every section extractor over a fetched page and merge the output,
/// falling back to static data when the page yields nothing. A fetch error
/// goes straight to the fallback path.
pub fn collect(
    document: Result<&str>,
    ticker: &str,
    registry: &CategoryRegistry,
    fallback: &Fallback,
) -> Collected {
    match document {
        Ok(html) => {
            let doc = Html::parse_document(html);
            let result = extract_document(&doc, ticker, registry);
            if !result.is_empty() {
                info!(
                    "Collected {} metrics x {} periods for {}",
                    result.metrics.len(),
                    result.axis.len(),
                    ticker
                );
                return Collected::Live(result);
            }
            warn!("No financial data extracted for {}, using fallback", ticker);
        }
        Err(e) => warn!("Fetch failed for {}: {:#}, using fallback", ticker, e),
    }
    from_fallback(ticker, registry, fallback)
}

fn extract_document(doc: &Html, ticker: &str, registry: &CategoryRegistry) -> ExtractionResult {
    let mut merged = MetricTable::new();
    let mut axis = Vec::new();

    let quarterly = quarterly::extract(doc, ticker);
    if quarterly.is_usable() {
        axis = quarterly.axis;
        merged.extend(quarterly.metrics);
    }

    let annual = annual::extract(doc, ticker);
    if axis.is_empty() {
        if annual.is_usable() {
            info!("Using annual periods as the axis for {}", ticker);
            axis = annual.axis;
            merged.extend(annual.metrics);
        }
    } else {
        merged.extend(annual.metrics);
    }

    if !axis.is_empty() {
        merged.extend(ratios::extract(doc, ticker, &axis));
        merged.extend(statements::balance_sheet(doc, ticker, &axis));
        merged.extend(statements::cash_flow(doc, ticker, &axis));
        merged.extend(per_share::extract(doc, ticker, &axis));
    }

    ExtractionResult {
        ticker: ticker.to_string(),
        metrics: classify_all(merged, axis.len(), registry),
        axis,
        profile: profile::extract(doc),
    }
}

fn from_fallback(ticker: &str, registry: &CategoryRegistry, fallback: &Fallback) -> Collected {
    let Some(entry) = fallback.lookup(ticker) else {
        warn!("No fallback data for {}", ticker);
        return Collected::Unavailable(ExtractionResult::empty(ticker));
    };
    info!("Using fallback data for {} ({} metrics)", ticker, entry.metrics.len());
    Collected::Fallback(ExtractionResult {
        ticker: ticker.to_string(),
        metrics: classify_all(entry.metrics, entry.axis.len(), registry),
        axis: entry.axis,
        profile: entry.profile,
    })
}

/// Conform each series to the axis and record its category.
fn classify_all(
    table: MetricTable,
    width: usize,
    registry: &CategoryRegistry,
) -> BTreeMap<String, MetricSeries> {
    table
        .into_iter()
        .map(|(name, values)| {
            let category = registry.classify(&name);
            let series = MetricSeries {
                values: conform(values, width),
                category,
            };
            (name, series)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::classify::Category;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
    }

    fn assert_aligned(result: &ExtractionResult) {
        for (name, series) in &result.metrics {
            assert_eq!(series.values.len(), result.axis.len(), "{name} is misaligned");
        }
    }

    #[test]
    fn live_page_merges_every_section() {
        let registry = CategoryRegistry::new();
        let html = fixture("reliance.html");
        let collected = collect(Ok(html.as_str()), "RELIANCE", &registry, &Fallback::embedded());

        assert_eq!(collected.source(), Some(DataSource::Screener));
        let r = collected.result();
        assert_eq!(r.axis, ["Mar 2023", "Jun 2023", "Sep 2023", "Dec 2023", "Mar 2024"]);
        assert_aligned(r);

        assert_eq!(r.metrics["Sales +"].category, Category::IncomeStatement);
        assert_eq!(r.metrics["Annual Sales +"].values, ["700000", "877835", "899041", "", ""]);
        assert_eq!(r.metrics["Debtor Days"].category, Category::FinancialRatios);
        assert_eq!(r.metrics["Total Assets"].category, Category::BalanceSheet);
        assert_eq!(r.metrics["Net Cash Flow"].category, Category::CashFlow);
        assert_eq!(r.metrics["EPS in Rs"].category, Category::PerShareData);
        assert_eq!(r.metrics["Book Value"].values, ["1250", "", "", "", ""]);
        assert!(!r.metrics.contains_key("Foo"));
        assert!(!r.metrics.contains_key("Raw PDF"));

        assert_eq!(r.profile.category, "Large Cap");
        assert_eq!(r.profile.industry, "Oil & Gas");
        assert_eq!(registry.total(), r.metrics.len());
    }

    #[test]
    fn annual_periods_become_axis() {
        let registry = CategoryRegistry::new();
        let html = fixture("annual_only.html");
        let collected = collect(Ok(html.as_str()), "ANNUALCO", &registry, &Fallback::embedded());

        let Collected::Live(r) = collected else {
            panic!("expected live data");
        };
        assert_eq!(r.axis, ["Mar 2022", "Mar 2023"]);
        assert_eq!(r.metrics["Annual Net Profit +"].values, ["120", "-15"]);
        assert_eq!(r.metrics["Total Assets"].values, ["5000", "5400"]);
        assert!(!r.metrics.contains_key("Annual Dividend Payout %"));
        assert_eq!(r.profile.industry, "Chemicals");
        assert_aligned(&r);
    }

    #[test]
    fn empty_page_uses_fallback() {
        let registry = CategoryRegistry::new();
        let collected = collect(
            Ok("<html><body><p>Please log in</p></body></html>"),
            "RELIANCE",
            &registry,
            &Fallback::embedded(),
        );

        assert_eq!(collected.source(), Some(DataSource::Fallback));
        let r = collected.into_result();
        assert_eq!(r.axis, ["Mar 2023", "Jun 2023", "Sep 2023", "Dec 2023"]);
        assert_eq!(r.metrics["Sales"].values.len(), 4);
        assert_eq!(r.metrics["Sales"].category, Category::IncomeStatement);
        assert_eq!(r.metrics["ROE %"].category, Category::FinancialRatios);
        assert_eq!(r.metrics["EPS"].category, Category::PerShareData);
        assert_eq!(r.profile.category, "Large Cap");
        assert_eq!(r.profile.industry, "Oil & Gas");
        assert_aligned(&r);
    }

    #[test]
    fn fetch_error_uses_fallback() {
        let registry = CategoryRegistry::new();
        let collected = collect(
            Err(anyhow::anyhow!("HTTP 403")),
            "tcs",
            &registry,
            &Fallback::embedded(),
        );
        assert!(matches!(collected, Collected::Fallback(_)));
        assert_eq!(collected.result().profile.industry, "IT Services");
        assert_eq!(registry.total(), 8);
    }

    #[test]
    fn unknown_ticker_is_unavailable() {
        let registry = CategoryRegistry::new();
        let collected = collect(Ok(""), "NOSUCH", &registry, &Fallback::embedded());

        assert!(matches!(collected, Collected::Unavailable(_)));
        assert_eq!(collected.source(), None);
        assert_eq!(collected.into_result(), ExtractionResult::empty("NOSUCH"));
        assert_eq!(registry.total(), 0);
    }
}
