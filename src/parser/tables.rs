use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static HEADER_CELLS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("thead tr th").unwrap());
static BODY_ROWS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tbody tr").unwrap());
static CELLS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

/// Raw text of one HTML table. Nothing is cleaned at this level.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn read(el: ElementRef<'_>) -> Table {
        Table {
            header: header_texts(el),
            rows: el
                .select(&BODY_ROWS)
                .map(|tr| tr.select(&CELLS).map(text_of).collect())
                .collect(),
        }
    }

    /// Header labels after the leading metric-name column.
    pub fn periods(&self) -> Vec<String> {
        self.header
            .iter()
            .skip(1)
            .map(|h| h.trim().to_string())
            .collect()
    }
}

/// The element itself when it is a `<table>`, otherwise every table nested
/// inside it.
pub fn tables_in(el: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    if el.value().name() == "table" {
        vec![el]
    } else {
        el.select(&TABLE).collect()
    }
}

pub fn header_texts(el: ElementRef<'_>) -> Vec<String> {
    el.select(&HEADER_CELLS).map(text_of).collect()
}

pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>()
}
