use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::tables::{header_texts, tables_in};

static RATIO_CLASS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)ratio").unwrap());
static SECTION: LazyLock<Selector> = LazyLock::new(|| Selector::parse("section").unwrap());
static DIV: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div").unwrap());
static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());

const QUARTER_TOKENS: &[&str] = &["mar", "jun", "sep", "dec", "q1", "q2", "q3", "q4"];

/// One way of finding a page section. Strategies are tried in order; the
/// first that finds anything wins.
#[derive(Debug, Clone, Copy)]
pub enum Locator {
    /// CSS selector, every match.
    Css(&'static str),
    /// Elements of `tag` whose `class` attribute mentions "ratio".
    RatioClass(&'static str),
    /// Any table with more than three header cells naming quarters.
    QuarterHeader,
}

impl Locator {
    pub fn find<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        match *self {
            Locator::Css(css) => match Selector::parse(css) {
                Ok(sel) => doc.select(&sel).collect(),
                Err(_) => Vec::new(),
            },
            Locator::RatioClass(tag) => {
                let sel = if tag == "section" { &*SECTION } else { &*DIV };
                doc.select(sel)
                    .filter(|el| {
                        el.value()
                            .attr("class")
                            .is_some_and(|c| RATIO_CLASS_RE.is_match(c))
                    })
                    .collect()
            }
            Locator::QuarterHeader => doc
                .select(&TABLE)
                .filter(|t| looks_quarterly(&header_texts(*t)))
                .take(1)
                .collect(),
        }
    }
}

pub const QUARTERS: &[Locator] = &[
    Locator::Css("section#quarters"),
    Locator::Css("section[id*='quarter']"),
    Locator::Css("div[class*='quarter']"),
    Locator::Css("table[class*='quarter']"),
    Locator::Css(".table-responsive table"),
    Locator::QuarterHeader,
];

pub const PROFIT_LOSS: &[Locator] = &[Locator::Css("section#profit-loss")];

pub const RATIOS: &[Locator] = &[
    Locator::Css("section#ratios"),
    Locator::RatioClass("section"),
    Locator::RatioClass("div"),
];

pub const BALANCE_SHEET: &[Locator] = &[Locator::Css("section#balance-sheet")];

pub const CASH_FLOW: &[Locator] = &[Locator::Css("section#cash-flow")];

pub const ALL_SECTIONS: &[Locator] = &[Locator::Css("section")];

/// Run strategies in order and return the first non-empty match set.
pub fn locate<'a>(doc: &'a Html, strategies: &[Locator]) -> Vec<ElementRef<'a>> {
    for strategy in strategies {
        let found = strategy.find(doc);
        if !found.is_empty() {
            tracing::debug!(?strategy, count = found.len(), "section located");
            return found;
        }
    }
    Vec::new()
}

/// First table of the first located section.
pub fn locate_table<'a>(doc: &'a Html, strategies: &[Locator]) -> Option<ElementRef<'a>> {
    locate(doc, strategies)
        .into_iter()
        .find_map(|el| tables_in(el).into_iter().next())
}

fn looks_quarterly(header: &[String]) -> bool {
    if header.len() <= 3 {
        return false;
    }
    let text = header
        .iter()
        .map(|h| h.trim())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    QUARTER_TOKENS.iter().any(|tok| text.contains(tok))
}
