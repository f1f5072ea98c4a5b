use std::time::Duration;

use tracing::warn;

pub const DEFAULT_URL_TEMPLATE: &str = "https://www.screener.in/company/{}/consolidated/";
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const DEFAULT_DB_PATH: &str = "data/financials.sqlite";

const DEFAULT_DELAY_MS: u64 = 2000;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 2;
const MAX_RETRIES_LIMIT: u32 = 10;

/// Default ticker universe, grouped by market-cap bucket.
pub const STOCKS: &[(&str, &[&str])] = &[
    ("Large Cap", &["RELIANCE", "TCS", "ITC", "HDFCBANK"]),
    ("Mid Cap", &["PIDILITIND", "CUMMINSIND"]),
    ("Small Cap", &["HATSUN", "BALAMINES"]),
];

pub fn default_tickers() -> Vec<String> {
    STOCKS
        .iter()
        .flat_map(|(_, tickers)| tickers.iter().map(|t| t.to_string()))
        .collect()
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Page URL with `{}` where the ticker goes.
    pub url_template: String,
    pub cookie: Option<String>,
    pub delay: Duration,
    pub timeout: Duration,
    pub max_retries: u32,
    pub db_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            cookie: None,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            db_path: DEFAULT_DB_PATH.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from a variable lookup. Bad values are logged and replaced by
    /// defaults.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Config::default();

        if let Some(url) = non_empty(get("SCREENER_URL")) {
            if url.contains("{}") {
                cfg.url_template = url;
            } else {
                warn!("SCREENER_URL has no {{}} placeholder, using default");
            }
        }
        cfg.cookie = non_empty(get("SCREENER_COOKIE"));
        if let Some(ms) = parse_var(&get, "SCREENER_DELAY_MS") {
            cfg.delay = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64>(&get, "SCREENER_TIMEOUT_SECS") {
            if secs == 0 {
                warn!("SCREENER_TIMEOUT_SECS must be positive, using default");
            } else {
                cfg.timeout = Duration::from_secs(secs);
            }
        }
        if let Some(n) = parse_var::<u32>(&get, "SCREENER_MAX_RETRIES") {
            if n > MAX_RETRIES_LIMIT {
                warn!("SCREENER_MAX_RETRIES={} is too high, capping at {}", n, MAX_RETRIES_LIMIT);
            }
            cfg.max_retries = n.min(MAX_RETRIES_LIMIT);
        }
        if let Some(path) = non_empty(get("SCREENER_DB")) {
            cfg.db_path = path;
        }
        cfg
    }

    pub fn url_for(&self, ticker: &str) -> String {
        self.url_template.replacen("{}", ticker, 1)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = non_empty(get(key))?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring invalid {}={:?}, using default", key, raw);
            None
        }
    }
}
