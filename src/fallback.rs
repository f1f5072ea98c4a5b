use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::error;

use crate::parser::extract::{CompanyProfile, MetricTable};

const EMBEDDED: &str = include_str!("../data/fallback.json");

/// Shape every entry must have before it is served.
#[derive(Debug, Deserialize)]
struct RawEntry {
    data: BTreeMap<String, Vec<String>>,
    quarters: Vec<String>,
    category: String,
    industry: String,
}

/// One validated fallback entry. Values are kept exactly as authored.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackEntry {
    pub metrics: MetricTable,
    pub axis: Vec<String>,
    pub profile: CompanyProfile,
}

/// Static sample data keyed by upper-case ticker.
#[derive(Debug, Default)]
pub struct Fallback {
    entries: Map<String, Value>,
}

impl Fallback {
    /// The dataset compiled into the binary.
    pub fn embedded() -> Self {
        Self::from_json(EMBEDDED).unwrap_or_else(|e| {
            error!("Embedded fallback data is unusable: {:#}", e);
            Fallback::default()
        })
    }

    /// Entries are only checked on lookup, so one bad entry never hides the rest.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).context("parsing fallback data")?;
        let Value::Object(entries) = value else {
            bail!("fallback data must be a JSON object keyed by ticker");
        };
        Ok(Fallback { entries })
    }

    pub fn tickers(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn lookup(&self, ticker: &str) -> Option<FallbackEntry> {
        let key = ticker.trim().to_uppercase();
        let value = self.entries.get(&key)?;

        let raw: RawEntry = match serde_json::from_value(value.clone()) {
            Ok(raw) => raw,
            Err(e) => {
                error!("Fallback entry for {} is malformed: {}", key, e);
                return None;
            }
        };

        if raw.data.is_empty() || raw.quarters.is_empty() {
            error!("Fallback entry for {} has no data", key);
            return None;
        }
        if let Some((name, values)) = raw
            .data
            .iter()
            .find(|(_, values)| values.len() != raw.quarters.len())
        {
            error!(
                "Fallback entry for {}: {} has {} values for {} quarters",
                key,
                name,
                values.len(),
                raw.quarters.len()
            );
            return None;
        }

        Some(FallbackEntry {
            metrics: raw.data,
            axis: raw.quarters,
            profile: CompanyProfile {
                category: raw.category,
                industry: raw.industry,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_dataset_is_complete() {
        let fb = Fallback::embedded();
        assert_eq!(
            fb.tickers(),
            ["BALAMINES", "CUMMINSIND", "HATSUN", "ITC", "PIDILITIND", "RELIANCE", "TCS"]
        );
        for ticker in fb.tickers() {
            assert!(fb.lookup(ticker).is_some(), "{ticker} should validate");
        }
    }

    #[test]
    fn reliance_entry() {
        let entry = Fallback::embedded().lookup("RELIANCE").unwrap();
        assert_eq!(entry.axis, ["Mar 2023", "Jun 2023", "Sep 2023", "Dec 2023"]);
        assert_eq!(entry.metrics["Sales"], ["2,15,000", "2,18,000", "2,20,000", "2,25,000"]);
        assert_eq!(entry.metrics.len(), 8);
        assert_eq!(entry.profile.category, "Large Cap");
        assert_eq!(entry.profile.industry, "Oil & Gas");
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let fb = Fallback::embedded();
        assert_eq!(fb.lookup(" tcs "), fb.lookup("TCS"));
        assert!(fb.lookup("NOPE").is_none());
    }

    #[test]
    fn malformed_entries_are_not_found() {
        let fb = Fallback::from_json(
            r#"{
                "STRING": "oops",
                "SHORT": {"data": {"Sales": ["1"]}, "quarters": ["Q1", "Q2"],
                          "category": "Small Cap", "industry": "X"},
                "NOINDUSTRY": {"data": {"Sales": ["1"]}, "quarters": ["Q1"],
                               "category": "Small Cap"},
                "NUMBERS": {"data": {"Sales": [1]}, "quarters": ["Q1"],
                            "category": "Small Cap", "industry": "X"},
                "EMPTY": {"data": {}, "quarters": [], "category": "", "industry": ""},
                "GOOD": {"data": {"Sales": ["1"]}, "quarters": ["Q1"],
                         "category": "Small Cap", "industry": "X"}
            }"#,
        )
        .unwrap();
        for ticker in ["STRING", "SHORT", "NOINDUSTRY", "NUMBERS", "EMPTY"] {
            assert!(fb.lookup(ticker).is_none(), "{ticker} should be rejected");
        }
        assert!(fb.lookup("good").is_some());
    }

    #[test]
    fn top_level_must_be_object() {
        assert!(Fallback::from_json("[1, 2]").is_err());
        assert!(Fallback::from_json("not json").is_err());
    }
}
