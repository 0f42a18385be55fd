//! PriceDB CLI: update, maintain, and query the local price database.
//!
//! Commands:
//! - `update`: fetch and store the given symbols (or the configured list)
//! - `maintain`: refresh every symbol already in the registry
//! - `show`: print a symbol's prices or technicals over a date range
//! - `status`: list registered symbols with their last update
//! - `table` / `tables`: dump one table as a frame, list table names
//! - `export`: write a symbol's series to CSV

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use pricedb_core::config::ProviderConfig;
use pricedb_core::data::{
    CircuitBreaker, DataProvider, LogProgress, SyntheticProvider, YahooProvider,
};
use pricedb_core::domain::{Bar, TechnicalRow, DATE_FORMAT};
use pricedb_core::{PriceDbConfig, PriceStore, Reader, UpdateSummary, Updater};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(
    name = "pricedb",
    about = "PriceDB CLI: local daily price database with technical indicators"
)]
struct Cli {
    /// SQLite database file. Overrides `[database] path` from the config.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Use the deterministic synthetic provider instead of Yahoo Finance.
    #[arg(long, global = true, default_value_t = false)]
    synthetic: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and store symbols; full history for new ones, the tail for known ones.
    Update {
        /// Symbols to update (e.g., XOM TSLA). Defaults to `symbols` from the config.
        symbols: Vec<String>,
    },
    /// Refresh every symbol in the registry.
    Maintain,
    /// Print stored rows for a symbol.
    Show {
        symbol: String,

        /// Start date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        end: Option<String>,

        /// Show technicals instead of prices.
        #[arg(long, default_value_t = false)]
        technicals: bool,

        /// Emit JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List registered symbols and when they were last updated.
    Status,
    /// Print a table by name (e.g., Summary, XOM_timeseries, XOM_technicals).
    Table { name: String },
    /// List table names, including per-symbol logical tables.
    Tables,
    /// Write a symbol's series to a CSV file.
    Export {
        symbol: String,

        /// Output CSV path.
        #[arg(long)]
        out: PathBuf,

        /// Export technicals instead of prices.
        #[arg(long, default_value_t = false)]
        technicals: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut config = match &cli.config {
        Some(path) => PriceDbConfig::from_file(path)?,
        None => PriceDbConfig::default(),
    };
    if let Some(db) = cli.db {
        config.database.path = db;
    }
    tracing::debug!(db = %config.database.path.display(), "configuration loaded");

    match cli.command {
        Commands::Update { symbols } => run_update(&config, symbols, cli.synthetic),
        Commands::Maintain => run_maintain(&config, cli.synthetic),
        Commands::Show {
            symbol,
            start,
            end,
            technicals,
            json,
        } => run_show(&config, &symbol, start, end, technicals, json),
        Commands::Status => run_status(&config),
        Commands::Table { name } => run_table(&config, &name),
        Commands::Tables => run_tables(&config),
        Commands::Export {
            symbol,
            out,
            technicals,
        } => run_export(&config, &symbol, &out, technicals),
    }
}

fn open_store(config: &PriceDbConfig) -> Result<PriceStore> {
    let path = &config.database.path;
    PriceStore::open(path).with_context(|| format!("open database {}", path.display()))
}

fn build_provider(config: &ProviderConfig, synthetic: bool) -> Result<Box<dyn DataProvider>> {
    if synthetic {
        tracing::warn!("using SYNTHETIC data; stored prices will not reflect the market");
        return Ok(Box::new(SyntheticProvider::default()));
    }
    let circuit_breaker = Arc::new(CircuitBreaker::new(
        Duration::from_secs(config.cooldown_secs),
        config.failure_threshold,
    ));
    Ok(Box::new(YahooProvider::new(circuit_breaker, config)?))
}

fn parse_date(s: Option<String>) -> Result<Option<NaiveDate>> {
    s.as_deref()
        .map(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).with_context(|| format!("bad date '{s}'")))
        .transpose()
}

fn run_update(config: &PriceDbConfig, symbols: Vec<String>, synthetic: bool) -> Result<()> {
    let symbols = if symbols.is_empty() {
        config.symbols.clone()
    } else {
        symbols
    };
    if symbols.is_empty() {
        bail!("no symbols given and none configured");
    }

    let provider = build_provider(&config.provider, synthetic)?;
    let mut store = open_store(config)?;
    let sym_refs: Vec<&str> = symbols.iter().map(|s| s.as_str()).collect();

    let summary = Updater::new(&mut store, provider.as_ref())
        .with_indicator_config(config.indicators.clone())?
        .update_symbols(&sym_refs, &LogProgress);
    report(&summary)
}

fn run_maintain(config: &PriceDbConfig, synthetic: bool) -> Result<()> {
    let provider = build_provider(&config.provider, synthetic)?;
    let mut store = open_store(config)?;

    let summary = Updater::new(&mut store, provider.as_ref())
        .with_indicator_config(config.indicators.clone())?
        .maintain(&LogProgress)?;
    report(&summary)
}

fn report(summary: &UpdateSummary) -> Result<()> {
    for (symbol, err) in summary.failures() {
        let kind = if err.is_date_conflict() {
            " (date conflict)"
        } else {
            ""
        };
        eprintln!("Error for {symbol}{kind}: {err}");
    }
    if !summary.all_succeeded() {
        bail!("{} of {} symbols failed", summary.failed, summary.total);
    }
    println!("Updated {} symbol(s).", summary.succeeded);
    Ok(())
}

fn run_show(
    config: &PriceDbConfig,
    symbol: &str,
    start: Option<String>,
    end: Option<String>,
    technicals: bool,
    json: bool,
) -> Result<()> {
    let (start, end) = (parse_date(start)?, parse_date(end)?);
    let store = open_store(config)?;
    let Some(data) = Reader::new(&store).get_ticker_data(symbol, start, end)? else {
        println!("No data stored for {symbol}.");
        return Ok(());
    };

    if json {
        let out = if technicals {
            serde_json::to_string_pretty(&data.technicals)?
        } else {
            serde_json::to_string_pretty(&data.price)?
        };
        println!("{out}");
        return Ok(());
    }

    if technicals {
        print_technicals(&data.technicals);
    } else {
        print_bars(&data.price);
    }
    Ok(())
}

fn print_bars(bars: &[Bar]) {
    println!(
        "{:<12} {:>10} {:>10} {:>10} {:>10} {:>12} {:>8} {:>6}",
        "Date", "Open", "High", "Low", "Close", "Volume", "Div", "Split"
    );
    println!("{}", "-".repeat(85));
    for b in bars {
        println!(
            "{:<12} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>12} {:>8.4} {:>6}",
            b.date, b.open, b.high, b.low, b.close, b.volume, b.dividends, b.stock_splits
        );
    }
}

fn print_technicals(rows: &[TechnicalRow]) {
    let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
    println!(
        "{:<12} {:>10} {:>8} {:>8} {:>10} {:>10} {:>10} {:>10} {:>8} {:>7}",
        "Date", "Close", "Vol1M", "Vol3M", "SMA12", "SMA200", "EMA12", "EMA26", "MACD", "RSI"
    );
    println!("{}", "-".repeat(102));
    for r in rows {
        println!(
            "{:<12} {:>10.2} {:>8} {:>8} {:>10} {:>10} {:>10} {:>10} {:>8} {:>7}",
            r.date,
            r.close_price,
            fmt(r.one_m_volatility),
            fmt(r.three_m_volatility),
            fmt(r.twelve_sma),
            fmt(r.two_hundred_sma),
            fmt(r.twelve_ema),
            fmt(r.twenty_six_ema),
            fmt(r.macd),
            fmt(r.rsi),
        );
    }
}

fn run_status(config: &PriceDbConfig) -> Result<()> {
    let store = open_store(config)?;
    let entries = store.list_symbols()?;

    println!("Database: {}", config.database.path.display());
    println!("Symbols: {}", entries.len());
    println!();
    println!("{:<10} {:<14} {:<14}", "Symbol", "Last Updated", "Latest Bar");
    println!("{}", "-".repeat(40));
    for entry in &entries {
        let updated = entry
            .last_updated
            .map_or_else(|| "-".to_string(), |d| d.to_string());
        let latest = store
            .most_recent_date(&entry.symbol)?
            .map_or_else(|| "-".to_string(), |d| d.to_string());
        println!("{:<10} {:<14} {:<14}", entry.symbol, updated, latest);
    }
    Ok(())
}

fn run_table(config: &PriceDbConfig, name: &str) -> Result<()> {
    let store = open_store(config)?;
    match Reader::new(&store).get_table(name)? {
        Some(df) => {
            println!("{df}");
            Ok(())
        }
        None => bail!("table '{name}' not found"),
    }
}

fn run_tables(config: &PriceDbConfig) -> Result<()> {
    let store = open_store(config)?;
    for name in Reader::new(&store).list_tables()? {
        println!("{name}");
    }
    Ok(())
}

fn run_export(config: &PriceDbConfig, symbol: &str, out: &Path, technicals: bool) -> Result<()> {
    let store = open_store(config)?;
    let Some(data) = Reader::new(&store).get_ticker_data(symbol, None, None)? else {
        bail!("no data stored for {symbol}");
    };

    let mut wtr = csv::Writer::from_path(out)
        .with_context(|| format!("create {}", out.display()))?;
    let rows = if technicals {
        for row in &data.technicals {
            wtr.serialize(row)?;
        }
        data.technicals.len()
    } else {
        for bar in &data.price {
            wtr.serialize(bar)?;
        }
        data.price.len()
    };
    wtr.flush()?;

    println!("Wrote {rows} rows to {}", out.display());
    Ok(())
}
