use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, USER_AGENT};
use reqwest::StatusCode;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::config::{self, Config};
use crate::db::{self, DocumentRow};

const BASE_BACKOFF_MS: u64 = 2000;

/// Scrape stats returned after completion.
pub struct ScrapeStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

/// HTTP client for company pages.
pub struct Fetcher {
    client: reqwest::Client,
    config: Config,
}

impl Fetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(config::USER_AGENT));
        if let Some(cookie) = &config.cookie {
            headers.insert(
                COOKIE,
                HeaderValue::from_str(cookie).context("SCREENER_COOKIE is not a valid header")?,
            );
        }
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Fetcher {
            client,
            config: config.clone(),
        })
    }

    /// Fetch one ticker's page, retrying rate limits and server errors with
    /// exponential backoff. Never fails; the outcome is in the row.
    pub async fn fetch(&self, ticker: &str) -> DocumentRow {
        let url = self.config.url_for(ticker);
        let max_retries = self.config.max_retries;

        let mut attempt = 0;
        loop {
            let row = self.fetch_once(ticker, &url).await;
            if !should_retry(&row) || attempt >= max_retries {
                return row;
            }

            let backoff = backoff(attempt);
            warn!(
                "Retrying {} (attempt {}/{}) after {:?}, backing off {:.1}s",
                ticker,
                attempt + 1,
                max_retries,
                row.status,
                backoff.as_secs_f64()
            );
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }

    async fn fetch_once(&self, ticker: &str, url: &str) -> DocumentRow {
        let start = Instant::now();
        let mut row = DocumentRow {
            ticker: ticker.to_string(),
            url: url.to_string(),
            html: None,
            status: None,
            error: None,
            latency_ms: None,
        };

        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                row.status = Some(status.as_u16() as i32);
                if status.is_success() {
                    match response.text().await {
                        Ok(body) => row.html = Some(body),
                        Err(e) => row.error = Some(format!("reading body: {}", e)),
                    }
                } else {
                    row.error = Some(format!("HTTP {}", status));
                }
            }
            Err(e) => row.error = Some(e.to_string()),
        }

        row.latency_ms = Some(start.elapsed().as_millis() as i64);
        row
    }
}

/// Doubling delay before retry `attempt + 1`, capped instead of overflowing.
fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(BASE_BACKOFF_MS.saturating_mul(2u64.saturating_pow(attempt)))
}

fn should_retry(row: &DocumentRow) -> bool {
    match row.status.and_then(|s| StatusCode::from_u16(s as u16).ok()) {
        Some(status) => status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
        None => false,
    }
}

pub fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    Ok(pb)
}

/// Fetch tickers one after another with `delay` between requests, saving
/// each document as it arrives.
pub async fn scrape_tickers(
    conn: &Connection,
    fetcher: &Fetcher,
    tickers: &[String],
    delay: Duration,
) -> Result<ScrapeStats> {
    let pb = progress_bar(tickers.len())?;
    let mut ok = 0usize;
    let mut errors = 0usize;

    for (i, ticker) in tickers.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        pb.set_message(ticker.clone());

        let row = fetcher.fetch(ticker).await;
        match &row.error {
            Some(e) => {
                warn!("Fetch failed for {}: {}", ticker, e);
                errors += 1;
            }
            None => ok += 1,
        }
        db::save_document(conn, &row)?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Fetched {} tickers ({} ok, {} errors)", tickers.len(), ok, errors);

    Ok(ScrapeStats {
        total: tickers.len(),
        ok,
        errors,
    })
}
