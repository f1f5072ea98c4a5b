use std::path::Path;

use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;

use crate::parser::aggregate::Collected;

pub fn connect(path: &str) -> Result<Connection> {
    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating database directory {}", dir.display()))?;
    }
    let conn = Connection::open(path).with_context(|| format!("opening {}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            ticker      TEXT PRIMARY KEY,
            url         TEXT NOT NULL,
            html        TEXT,
            status      INTEGER,
            error       TEXT,
            latency_ms  INTEGER,
            fetched_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS financials_quarterly (
            id               INTEGER PRIMARY KEY,
            ticker           TEXT NOT NULL,
            metric           TEXT NOT NULL,
            quarter          TEXT NOT NULL,
            value            TEXT NOT NULL,
            industry         TEXT,
            category         TEXT,
            metric_category  TEXT NOT NULL,
            data_source      TEXT NOT NULL DEFAULT 'SCREENER'
                             CHECK(data_source IN ('SCREENER','FALLBACK')),
            created_at       TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at       TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(ticker, metric, quarter)
        );
        CREATE INDEX IF NOT EXISTS idx_fq_ticker ON financials_quarterly(ticker);
        CREATE INDEX IF NOT EXISTS idx_fq_metric_category ON financials_quarterly(metric_category);
        ",
    )?;
    Ok(())
}

// ── Documents ──

/// One fetch attempt for a ticker, successful or not.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRow {
    pub ticker: String,
    pub url: String,
    pub html: Option<String>,
    pub status: Option<i32>,
    pub error: Option<String>,
    pub latency_ms: Option<i64>,
}

impl DocumentRow {
    /// The page body, or why there is none.
    pub fn document(&self) -> Result<&str> {
        match (&self.html, &self.error) {
            (_, Some(e)) => Err(anyhow!("{}", e)),
            (Some(html), None) => Ok(html.as_str()),
            (None, None) => Err(anyhow!("empty response for {}", self.url)),
        }
    }
}

/// Replace the stored document for this ticker.
pub fn save_document(conn: &Connection, row: &DocumentRow) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO documents (ticker, url, html, status, error, latency_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![row.ticker, row.url, row.html, row.status, row.error, row.latency_ms],
    )?;
    Ok(())
}

/// Every stored fetch attempt, failures included, ordered by ticker.
pub fn fetch_documents(conn: &Connection, limit: Option<usize>) -> Result<Vec<DocumentRow>> {
    let sql = format!(
        "SELECT ticker, url, html, status, error, latency_ms FROM documents
         ORDER BY ticker{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(DocumentRow {
                ticker: row.get(0)?,
                url: row.get(1)?,
                html: row.get(2)?,
                status: row.get(3)?,
                error: row.get(4)?,
                latency_ms: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Financials ──

/// Upsert every non-empty data point of one result in a single transaction.
/// Returns the number of rows written.
pub fn save_collected(conn: &Connection, collected: &Collected) -> Result<usize> {
    let Some(source) = collected.source() else {
        return Ok(0);
    };
    let result = collected.result();

    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO financials_quarterly
             (ticker, metric, quarter, value, industry, category, metric_category, data_source)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(ticker, metric, quarter) DO UPDATE SET
                value           = excluded.value,
                industry        = excluded.industry,
                category        = excluded.category,
                metric_category = excluded.metric_category,
                data_source     = excluded.data_source,
                updated_at      = datetime('now')",
        )?;
        for (metric, series) in &result.metrics {
            for (quarter, value) in result.axis.iter().zip(&series.values) {
                if value.is_empty() {
                    continue;
                }
                count += stmt.execute(rusqlite::params![
                    result.ticker,
                    metric,
                    quarter,
                    value,
                    result.profile.industry,
                    result.profile.category,
                    series.category.as_str(),
                    source.as_str(),
                ])?;
            }
        }
    }
    tx.commit()?;
    Ok(count)
}

pub struct CategorySummary {
    pub category: String,
    pub metrics: usize,
    pub stocks: usize,
}

pub fn fetch_category_summary(conn: &Connection) -> Result<Vec<CategorySummary>> {
    let mut stmt = conn.prepare(
        "SELECT metric_category, COUNT(DISTINCT metric), COUNT(DISTINCT ticker)
         FROM financials_quarterly
         GROUP BY metric_category
         ORDER BY metric_category",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(CategorySummary {
                category: row.get(0)?,
                metrics: row.get(1)?,
                stocks: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn fetch_metrics_in_category(conn: &Connection, category: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT metric FROM financials_quarterly
         WHERE metric_category = ?1
         ORDER BY metric",
    )?;
    let rows = stmt
        .query_map([category], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub documents: usize,
    pub fetch_errors: usize,
    pub tickers: usize,
    pub rows: usize,
    pub fallback_rows: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let documents: usize = conn.query_row("SELECT COUNT(*) FROM documents", [], |r| r.get(0))?;
    let fetch_errors: usize = conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE error IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let tickers: usize = conn.query_row(
        "SELECT COUNT(DISTINCT ticker) FROM financials_quarterly",
        [],
        |r| r.get(0),
    )?;
    let rows: usize =
        conn.query_row("SELECT COUNT(*) FROM financials_quarterly", [], |r| r.get(0))?;
    let fallback_rows: usize = conn.query_row(
        "SELECT COUNT(*) FROM financials_quarterly WHERE data_source = 'FALLBACK'",
        [],
        |r| r.get(0),
    )?;
    Ok(Stats {
        documents,
        fetch_errors,
        tickers,
        rows,
        fallback_rows,
    })
}

// ── Tests ──
