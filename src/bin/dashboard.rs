//! Equity dashboard
//!
//! Runs one dashboard view and prints it as a text table.
//!
//! ```text
//! dashboard market
//! dashboard predict RELIANCE.NS --days 10 --output forecast.csv
//! dashboard --csv-dir data technical TCS.NS
//! dashboard fundamentals INFY.NS
//! ```

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use equity_forecast::analysis::{AnalysisMode, AnalysisOutput, Dashboard, SeriesSummary, TechnicalSummary};
use equity_forecast::config::AppConfig;
use equity_forecast::data::{CachedProvider, CsvProvider, Fundamentals, MarketDataProvider, YahooClient};
use equity_forecast::forecast::{ForecastReport, Forecaster};
use equity_forecast::sentiment::{GoogleNewsFeed, HeadlineFile, NewsFeed, SentimentLabel, SentimentSummary};
use equity_forecast::utils::{init_logging, save_forecast_csv, save_json};

#[derive(Parser)]
#[command(name = "dashboard")]
#[command(about = "Equity price dashboard with LSTM forecasting")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    config: String,

    /// Read <SYMBOL>.csv files from this directory instead of Yahoo Finance
    #[arg(long, global = true)]
    csv_dir: Option<PathBuf>,

    /// Log level (overrides config)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Latest session of the major indices
    Market,
    /// Current price of a symbol
    Price { symbol: String },
    /// Close prices over a date range
    Range {
        symbol: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    /// Compare several symbols over a date range
    Compare {
        #[arg(required = true)]
        symbols: Vec<String>,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    /// Five years of daily closes
    Timeseries { symbol: String },
    /// Moving averages, RSI and MACD
    Technical {
        symbol: String,
        /// Rows to print
        #[arg(long, default_value_t = 10)]
        rows: usize,
    },
    /// Train a model and forecast future closes
    Predict {
        symbol: String,
        #[arg(short, long, default_value_t = 10)]
        days: usize,
        /// Save the forecast table as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Save the full report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
        /// Seed for reproducible training
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Headline sentiment
    Sentiment {
        symbol: String,
        /// JSON file of headlines (overrides config)
        #[arg(long)]
        headlines: Option<PathBuf>,
    },
    /// Market cap, P/E, dividend yield, EPS and 52-week range
    Fundamentals { symbol: String },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = AppConfig::load_or_default(&args.config);

    init_logging(args.log_level.as_deref().unwrap_or(&config.logging.level));

    if let Some(dir) = &args.csv_dir {
        config.data.csv_dir = Some(dir.clone());
    }
    if let Command::Predict { seed: Some(seed), .. } = &args.command {
        config.model.seed = Some(*seed);
    }
    if let Command::Sentiment { headlines: Some(path), .. } = &args.command {
        config.data.headlines_file = Some(path.clone());
    }

    let provider = CachedProvider::new(build_provider(&config)?, config.data.cache_ttl());
    let forecaster = Forecaster::new(provider)
        .with_config(config.forecast.clone())
        .with_model_config(config.model.clone())
        .with_training_config(config.training.clone());

    let mut dashboard = Dashboard::new(forecaster);
    if let Some(feed) = build_news_feed(&config) {
        dashboard = dashboard.with_news_feed(feed);
    }

    let mode = analysis_mode(&args.command);
    let output = match dashboard.run(&mode) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    };

    match output {
        AnalysisOutput::MarketOverview(indices) => {
            println!("\n{:<14} {:>12} {:>10} {:>9}", "Index", "Price", "Change", "Change %");
            println!("{}", "-".repeat(48));
            for index in &indices {
                println!(
                    "{:<14} {:>12.2} {:>10.2} {:>8.2}%",
                    index.name, index.price, index.change, index.percent_change
                );
            }
            if indices.is_empty() {
                println!("No index data available.");
            }
        }
        AnalysisOutput::CurrentPrice { symbol, price } => match price {
            Some(price) => println!("Current price of {}: {:.2}", symbol, price),
            None => println!("Current price of {} is not available.", symbol),
        },
        AnalysisOutput::Series(summaries) => print_series(&summaries),
        AnalysisOutput::Technical(summary) => {
            let rows = match &args.command {
                Command::Technical { rows, .. } => *rows,
                _ => 10,
            };
            print_technical(&summary, rows);
        }
        AnalysisOutput::Prediction(report) => {
            print_forecast(&report);
            if let Command::Predict { output, json, .. } = &args.command {
                if let Some(path) = output {
                    save_forecast_csv(&report, path)?;
                    println!("Forecast saved to {}", path.display());
                }
                if let Some(path) = json {
                    save_json(report.as_ref(), path)?;
                    println!("Report saved to {}", path.display());
                }
            }
        }
        AnalysisOutput::Sentiment(summary) => print_sentiment(&summary),
        AnalysisOutput::Fundamentals(fundamentals) => print_fundamentals(&fundamentals),
    }

    if let Some(summary) = dashboard.follow_up_sentiment(&mode) {
        print_sentiment(&summary);
    }

    Ok(())
}

/// A headline file when configured, Google News otherwise
fn build_news_feed(config: &AppConfig) -> Option<Box<dyn NewsFeed>> {
    if let Some(path) = &config.data.headlines_file {
        return Some(Box::new(HeadlineFile::new(path.clone())));
    }
    match GoogleNewsFeed::with_base_url(&config.data.news_base_url) {
        Ok(feed) => Some(Box::new(feed)),
        Err(e) => {
            log::warn!("News feed unavailable: {:#}", e);
            None
        }
    }
}

fn build_provider(config: &AppConfig) -> Result<Box<dyn MarketDataProvider>> {
    Ok(match &config.data.csv_dir {
        Some(dir) => {
            log::info!("Reading market data from {}", dir.display());
            Box::new(CsvProvider::new(dir.clone()))
        }
        None => Box::new(YahooClient::with_base_url(&config.data.yahoo_base_url)?),
    })
}

fn analysis_mode(command: &Command) -> AnalysisMode {
    match command {
        Command::Market => AnalysisMode::MarketOverview,
        Command::Price { symbol } => AnalysisMode::CurrentPrice { symbol: symbol.clone() },
        Command::Range { symbol, start, end } => AnalysisMode::PriceRange {
            symbol: symbol.clone(),
            start: *start,
            end: *end,
        },
        Command::Compare { symbols, start, end } => AnalysisMode::Comparison {
            symbols: symbols.clone(),
            start: *start,
            end: *end,
        },
        Command::Timeseries { symbol } => AnalysisMode::TimeSeries { symbol: symbol.clone() },
        Command::Technical { symbol, .. } => AnalysisMode::Technical { symbol: symbol.clone() },
        Command::Predict { symbol, days, .. } => AnalysisMode::Prediction {
            symbol: symbol.clone(),
            days: *days,
        },
        Command::Sentiment { symbol, .. } => AnalysisMode::Sentiment { symbol: symbol.clone() },
        Command::Fundamentals { symbol } => AnalysisMode::Fundamentals { symbol: symbol.clone() },
    }
}

fn print_series(summaries: &[SeriesSummary]) {
    println!(
        "\n{:<14} {:>10} {:>10} {:>6} {:>10} {:>10} {:>10} {:>10} {:>9}",
        "Symbol", "Start", "End", "Days", "First", "Last", "Min", "Max", "Change %"
    );
    println!("{}", "-".repeat(98));
    for s in summaries {
        println!(
            "{:<14} {:>10} {:>10} {:>6} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>8.2}%",
            s.symbol, s.start, s.end, s.observations, s.first_close, s.last_close, s.min_close, s.max_close, s.change_pct
        );
    }
}

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

fn print_technical(summary: &TechnicalSummary, rows: usize) {
    println!("\nTechnical indicators for {}", summary.symbol);
    println!(
        "{:<10} {:>10} {:>10} {:>10} {:>8} {:>10}",
        "Date", "Close", "SMA 50", "SMA 200", "RSI 14", "MACD diff"
    );
    println!("{}", "-".repeat(63));
    for row in summary.tail(rows) {
        println!(
            "{:<10} {:>10.2} {:>10} {:>10} {:>8} {:>10}",
            row.date,
            row.close,
            cell(row.sma_50),
            cell(row.sma_200),
            cell(row.rsi_14),
            cell(row.macd_diff)
        );
    }
}

fn print_forecast(report: &ForecastReport) {
    println!("\nForecast for {} (data up to {})", report.symbol, report.as_of);
    println!("Latest close:       {:.2}", report.latest_close);
    println!(
        "Reference price:    {:.2} ({})",
        report.reference.value(),
        report.reference.describe()
    );
    println!("Calibration factor: {:.4}", report.calibration_factor);
    if !report.calibrated {
        println!("(first predicted price unusable, calibrated prices are the raw model output)");
    }
    println!(
        "Train R²: {:.4}  Test R²: {:.4}  Test RMSE: {:.6}",
        report.train_r2, report.test_r2, report.test_rmse
    );
    println!(
        "Training: {} epochs, best val_loss {:.6} at epoch {}",
        report.training.epochs_run, report.training.best_val_loss, report.training.best_epoch
    );
    println!("\n{:>5} {:>14} {:>16}", "Day", "Raw", "Calibrated");
    println!("{}", "-".repeat(37));
    for (day, raw, calibrated) in report.rows() {
        println!("{:>5} {:>14.2} {:>16.2}", day, raw, calibrated);
    }
}

fn print_sentiment(summary: &SentimentSummary) {
    println!("\nNews sentiment for {}", summary.symbol);
    for scored in &summary.headlines {
        println!("{:>7.3}  {:<8}  {}", scored.compound, scored.label, scored.headline.title);
    }
    println!(
        "\nPositive: {}  Negative: {}  Neutral: {}",
        summary.count(SentimentLabel::Positive),
        summary.count(SentimentLabel::Negative),
        summary.count(SentimentLabel::Neutral)
    );
    println!("Average compound: {:.3} ({})", summary.average, summary.overall);
}

fn print_fundamentals(f: &Fundamentals) {
    let na = |value: Option<f64>| value.map_or_else(|| "N/A".to_string(), |v| format!("{:.2}", v));
    println!("\nFundamentals for {} ({})", f.symbol, f.currency.as_deref().unwrap_or("N/A"));
    println!("Market cap:      {}", na(f.market_cap));
    println!("P/E ratio:       {}", na(f.pe_ratio));
    println!(
        "Dividend yield:  {}",
        f.dividend_yield
            .map_or_else(|| "N/A".to_string(), |v| format!("{:.2}%", v * 100.0))
    );
    println!("EPS:             {}", na(f.eps));
    println!("52-week high:    {}", na(f.fifty_two_week_high));
    println!("52-week low:     {}", na(f.fifty_two_week_low));
}
