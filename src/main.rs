mod config;
mod db;
mod fallback;
mod fetch;
mod parser;

use std::time::{Duration, Instant};

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;

use config::Config;
use fallback::Fallback;
use parser::aggregate::{self, Collected};
use parser::classify::{Category, CategoryRegistry};

#[derive(Parser)]
#[command(
    name = "screener_scraper",
    about = "Quarterly financials scraper for screener.in company pages"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    Init,
    /// Fetch company pages and store the raw HTML
    Scrape {
        /// Tickers to fetch (default: built-in universe)
        #[arg(short, long = "ticker")]
        tickers: Vec<String>,
        /// Pause between requests in milliseconds (default: SCREENER_DELAY_MS)
        #[arg(long)]
        delay_ms: Option<u64>,
    },
    /// Extract stored pages and save the financials
    Process {
        /// Max documents to process (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Fetch + extract + save, one ticker at a time
    Load {
        /// Tickers to load (default: built-in universe)
        #[arg(short, long = "ticker")]
        tickers: Vec<String>,
        /// Pause between requests in milliseconds (default: SCREENER_DELAY_MS)
        #[arg(long)]
        delay_ms: Option<u64>,
    },
    /// Fetch and extract one ticker without saving
    Show {
        ticker: String,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Metrics and stocks per metric category
    Summary,
    /// Metric names stored under one category
    Metrics {
        /// e.g. "Income Statement"
        category: String,
    },
    /// Show database statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let cfg = Config::from_env();

    let result = match cli.command {
        Commands::Init => {
            let conn = db::connect(&cfg.db_path)?;
            db::init_schema(&conn)?;
            println!("Schema ready at {}", cfg.db_path);
            Ok(())
        }
        Commands::Scrape { tickers, delay_ms } => {
            let conn = db::connect(&cfg.db_path)?;
            db::init_schema(&conn)?;
            let tickers = resolve_tickers(tickers);
            let fetcher = fetch::Fetcher::new(&cfg)?;
            println!("Fetching {} tickers...", tickers.len());
            let stats =
                fetch::scrape_tickers(&conn, &fetcher, &tickers, pacing(&cfg, delay_ms)).await?;
            println!(
                "Done: {} fetched ({} ok, {} errors).",
                stats.total, stats.ok, stats.errors
            );
            Ok(())
        }
        Commands::Process { limit } => {
            let conn = db::connect(&cfg.db_path)?;
            db::init_schema(&conn)?;
            let docs = db::fetch_documents(&conn, limit)?;
            if docs.is_empty() {
                println!("No stored documents. Run 'scrape' first.");
                return Ok(());
            }
            println!("Processing {} documents...", docs.len());
            let registry = CategoryRegistry::new();
            let counts = process_documents(&conn, &docs, &registry)?;
            counts.print();
            print_registry(&registry);
            Ok(())
        }
        Commands::Load { tickers, delay_ms } => {
            let conn = db::connect(&cfg.db_path)?;
            db::init_schema(&conn)?;
            let tickers = resolve_tickers(tickers);
            let fetcher = fetch::Fetcher::new(&cfg)?;
            let registry = CategoryRegistry::new();
            println!("Loading {} tickers...", tickers.len());
            let counts =
                load_tickers(&conn, &fetcher, &tickers, pacing(&cfg, delay_ms), &registry).await?;
            counts.print();
            print_registry(&registry);
            Ok(())
        }
        Commands::Show { ticker, json } => {
            let fetcher = fetch::Fetcher::new(&cfg)?;
            let row = fetcher.fetch(&ticker).await;
            let registry = CategoryRegistry::new();
            let fallback = Fallback::embedded();
            let collected = aggregate::collect(row.document(), &ticker, &registry, &fallback);
            if json {
                println!("{}", serde_json::to_string_pretty(&collected)?);
            } else {
                print_collected(&collected);
                if let Collected::Unavailable(_) = collected {
                    println!("Sample data exists for: {}", fallback.tickers().join(", "));
                }
            }
            Ok(())
        }
        Commands::Summary => {
            let conn = db::connect(&cfg.db_path)?;
            db::init_schema(&conn)?;
            let rows = db::fetch_category_summary(&conn)?;
            if rows.is_empty() {
                println!("No financials stored. Run 'load' or 'process' first.");
                return Ok(());
            }
            println!("{:<24} | {:>7} | {:>6}", "Category", "Metrics", "Stocks");
            println!("{}", "-".repeat(43));
            for r in &rows {
                println!("{:<24} | {:>7} | {:>6}", r.category, r.metrics, r.stocks);
            }
            Ok(())
        }
        Commands::Metrics { category } => {
            let Some(category) = Category::parse(&category) else {
                let names: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
                bail!("Unknown category {:?}. Expected one of: {}", category, names.join(", "));
            };
            let conn = db::connect(&cfg.db_path)?;
            db::init_schema(&conn)?;
            let metrics = db::fetch_metrics_in_category(&conn, category.as_str())?;
            println!("{} ({} metrics)", category, metrics.len());
            for m in &metrics {
                println!("  {}", m);
            }
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&cfg.db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Documents:     {}", s.documents);
            println!("Fetch errors:  {}", s.fetch_errors);
            println!("Tickers:       {}", s.tickers);
            println!("Rows:          {}", s.rows);
            println!("Fallback rows: {}", s.fallback_rows);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn resolve_tickers(tickers: Vec<String>) -> Vec<String> {
    if tickers.is_empty() {
        config::default_tickers()
    } else {
        tickers.into_iter().map(|t| t.trim().to_uppercase()).collect()
    }
}

fn pacing(cfg: &Config, delay_ms: Option<u64>) -> Duration {
    delay_ms.map(Duration::from_millis).unwrap_or(cfg.delay)
}

#[derive(Default)]
struct LoadCounts {
    live: usize,
    fallback: usize,
    unavailable: usize,
    rows: usize,
}

impl LoadCounts {
    fn add(&mut self, collected: &Collected, rows: usize) {
        match collected {
            Collected::Live(_) => self.live += 1,
            Collected::Fallback(_) => self.fallback += 1,
            Collected::Unavailable(_) => self.unavailable += 1,
        }
        self.rows += rows;
    }

    fn print(&self) {
        println!(
            "Saved {} rows: {} live, {} fallback, {} unavailable.",
            self.rows, self.live, self.fallback, self.unavailable,
        );
    }
}

fn process_documents(
    conn: &rusqlite::Connection,
    docs: &[db::DocumentRow],
    registry: &CategoryRegistry,
) -> anyhow::Result<LoadCounts> {
    use rayon::prelude::*;

    let pb = fetch::progress_bar(docs.len())?;
    let fallback = Fallback::embedded();
    let mut counts = LoadCounts::default();

    for chunk in docs.chunks(500) {
        let results: Vec<Collected> = chunk
            .par_iter()
            .map(|doc| parser::process_document(doc, registry, &fallback))
            .collect();

        for collected in &results {
            let rows = db::save_collected(conn, collected)?;
            counts.add(collected, rows);
        }
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(counts)
}

async fn load_tickers(
    conn: &rusqlite::Connection,
    fetcher: &fetch::Fetcher,
    tickers: &[String],
    delay: Duration,
    registry: &CategoryRegistry,
) -> anyhow::Result<LoadCounts> {
    let pb = fetch::progress_bar(tickers.len())?;
    let fallback = Fallback::embedded();
    let mut counts = LoadCounts::default();

    for (i, ticker) in tickers.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        pb.set_message(ticker.clone());

        let row = fetcher.fetch(ticker).await;
        db::save_document(conn, &row)?;
        let collected = aggregate::collect(row.document(), ticker, registry, &fallback);
        let rows = db::save_collected(conn, &collected)?;
        info!("Saved {} rows for {}", rows, ticker);
        counts.add(&collected, rows);
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(counts)
}

fn print_registry(registry: &CategoryRegistry) {
    println!("\nDiscovered {} metrics:", registry.total());
    for (category, names) in registry.snapshot() {
        println!("  {:<24} {:>3}  {}", category.as_str(), names.len(), names.join(", "));
    }
}

fn print_collected(collected: &Collected) {
    let r = collected.result();
    let source = collected.source().map(|s| s.as_str()).unwrap_or("UNAVAILABLE");
    println!("{} [{}] {} / {}", r.ticker, source, r.profile.category, r.profile.industry);
    if r.is_empty() {
        println!("No data.");
        return;
    }

    println!("{:<32} | {:<24} | {}", "Metric", "Category", r.axis.join(" | "));
    println!("{}", "-".repeat(60 + r.axis.len() * 11));
    for (name, series) in &r.metrics {
        let values: Vec<&str> = series
            .values
            .iter()
            .map(|v| if v.is_empty() { "-" } else { v.as_str() })
            .collect();
        println!(
            "{:<32} | {:<24} | {}",
            truncate(name, 32),
            series.category.as_str(),
            values.join(" | ")
        );
    }
    println!("\n{} metrics, {} data points", r.metrics.len(), r.data_points());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max - 3).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
