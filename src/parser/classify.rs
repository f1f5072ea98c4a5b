use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{LazyLock, Mutex};

use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    #[serde(rename = "Income Statement")]
    IncomeStatement,
    #[serde(rename = "Balance Sheet")]
    BalanceSheet,
    #[serde(rename = "Cash Flow")]
    CashFlow,
    #[serde(rename = "Financial Ratios")]
    FinancialRatios,
    #[serde(rename = "Per Share Data")]
    PerShareData,
    #[serde(rename = "Valuation Metrics")]
    ValuationMetrics,
    #[serde(rename = "Other Financial Metrics")]
    OtherFinancialMetrics,
}

impl Category {
    /// Taxonomy order. Also the rule precedence order.
    pub const ALL: [Category; 7] = [
        Category::IncomeStatement,
        Category::BalanceSheet,
        Category::CashFlow,
        Category::FinancialRatios,
        Category::PerShareData,
        Category::ValuationMetrics,
        Category::OtherFinancialMetrics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::IncomeStatement => "Income Statement",
            Category::BalanceSheet => "Balance Sheet",
            Category::CashFlow => "Cash Flow",
            Category::FinancialRatios => "Financial Ratios",
            Category::PerShareData => "Per Share Data",
            Category::ValuationMetrics => "Valuation Metrics",
            Category::OtherFinancialMetrics => "Other Financial Metrics",
        }
    }

    /// Case-insensitive lookup by display name.
    pub fn parse(s: &str) -> Option<Category> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Rules ──

const INCOME_STATEMENT: &[&str] = &[
    r"\bsales\b",
    r"\brevenue",
    r"\bturnover\b",
    r"\bincome\b",
    r"\bprofit\b",
    r"\bearnings\b",
    r"\bebitda?\b",
    r"\bpbt\b",
    r"\bpat\b",
    r"\bexpenses?\b",
    r"\bcosts?\b",
    r"\bdepreciation\b",
    r"\bamortization\b",
    r"^interest$",
    r"\binterest (paid|expense)",
    r"\btax\b",
    r"\bexceptional\b",
    r"\bextraordinary\b",
];

const BALANCE_SHEET: &[&str] = &[
    r"\bassets\b",
    r"\bcwip\b",
    r"\binvestments\b",
    r"\bcash (and|&) (cash )?equivalents\b",
    r"\bcash equivalents\b",
    r"\bcash (and|&) bank\b",
    r"\binventor(y|ies)\b",
    r"\breceivables\b",
    r"\bdebtors\b",
    r"\badvances\b",
    r"\bliabilities\b",
    r"\bpayables\b",
    r"\bcreditors\b",
    r"\bprovisions\b",
    r"\bborrowings\b",
    r"^(total |long term |short term )?debt$",
    r"\bloans\b",
    r"^equity$",
    r"\b(equity|share) capital\b",
    r"\b(total|shareholders'?) equity\b",
    r"\breserves\b",
    r"\bsurplus\b",
    r"\bretained earnings\b",
];

const CASH_FLOW: &[&str] = &[
    r"\bcash flow\b",
    r"\bcash from\b.*\bactivit",
    r"\b(operating|investing|financing) activit",
    r"\bfree cash\b",
    r"\bnet cash\b",
    r"\bcash (generated|used)\b",
];

const FINANCIAL_RATIOS: &[&str] = &[
    r"\broe\b",
    r"\broce\b",
    r"\broic\b",
    r"\broa\b",
    r"\broi\b",
    r"\breturn on\b",
    r"\bopm\b",
    r"\bmargin\b",
    r"\b(current|quick|cash) ratio\b",
    r"\bdebt\b.*\bequity\b",
    r"\binterest coverage\b",
    r"\bdebt service coverage\b",
    r"\bleverage\b",
    r"\bdays\b",
    r"\bconversion cycle\b",
    r"\bturnover ratio\b",
    r"\bp/?e\b",
    r"\bp/?b\b",
    r"\bprice to (book|earnings?)\b",
    r"\bdividend (yield|payout)\b",
];

const PER_SHARE_DATA: &[&str] = &[
    r"\bper share\b",
    r"\beps\b",
    r"\bbook value\b.*\bshare\b",
    r"\bcash\b.*\bshare\b",
    r"\bdividend\b.*\bshare\b",
    r"\bsales\b.*\bshare\b",
];

const VALUATION_METRICS: &[&str] = &[
    r"\bmarket cap",
    r"\benterprise value\b",
    r"\bev\b",
    r"\bprice to (sales|cash)\b",
    r"\bmarket\b.*\bbook\b",
    r"\bcurrent price\b",
    r"\bhigh\s*/\s*low\b",
];

const OTHER_FINANCIAL_METRICS: &[&str] = &[
    r"\bworking capital\b",
    r"\bnet worth\b",
    r"\bface value\b",
    r"\bbook value\b",
    r"\bintrinsic value\b",
    r"\bfair value\b",
];

/// Ordered (category, patterns) precedence chain. The first category with
/// any matching pattern wins.
static RULES: LazyLock<Vec<(Category, Vec<Regex>)>> = LazyLock::new(|| {
    let table: [(Category, &[&str]); 7] = [
        (Category::IncomeStatement, INCOME_STATEMENT),
        (Category::BalanceSheet, BALANCE_SHEET),
        (Category::CashFlow, CASH_FLOW),
        (Category::FinancialRatios, FINANCIAL_RATIOS),
        (Category::PerShareData, PER_SHARE_DATA),
        (Category::ValuationMetrics, VALUATION_METRICS),
        (Category::OtherFinancialMetrics, OTHER_FINANCIAL_METRICS),
    ];
    table
        .into_iter()
        .map(|(category, patterns)| {
            let compiled = patterns.iter().map(|p| Regex::new(p).unwrap()).collect();
            (category, compiled)
        })
        .collect()
});

/// Pure rule lookup, no bookkeeping.
pub fn category_of(metric_name: &str) -> Category {
    let lower = metric_name.trim().to_lowercase();
    RULES
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(&lower)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::OtherFinancialMetrics)
}

// ── Registry ──

/// Metric names discovered per category. Accumulate-only; safe to share
/// between rayon workers.
#[derive(Debug, Default)]
pub struct CategoryRegistry {
    seen: Mutex<BTreeMap<Category, BTreeSet<String>>>,
}

impl CategoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `metric_name` and record it under the winning category.
    pub fn classify(&self, metric_name: &str) -> Category {
        let category = category_of(metric_name);
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen.entry(category)
            .or_default()
            .insert(metric_name.to_string());
        category
    }

    /// Non-empty categories in taxonomy order, names sorted.
    pub fn snapshot(&self) -> Vec<(Category, Vec<String>)> {
        let seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen.iter()
            .filter(|(_, names)| !names.is_empty())
            .map(|(c, names)| (*c, names.iter().cloned().collect()))
            .collect()
    }

    pub fn total(&self) -> usize {
        let seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen.values().map(BTreeSet::len).sum()
    }
}
