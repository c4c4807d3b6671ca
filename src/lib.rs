//! # Equity Forecast
//!
//! Core of an equity price dashboard: daily market data, technical
//! indicators, headline sentiment and a multi-day close-price forecast from
//! a stacked LSTM calibrated against the latest known market price.
//!
//! ## Modules
//!
//! - `data` - market-data providers (Yahoo Finance, CSV) and a TTL cache
//! - `preprocessing` - features, min-max scaling and sequence windows
//! - `model` - LSTM regressor with backpropagation through time and Adam
//! - `forecast` - the forecast pipeline: rollout and calibration
//! - `sentiment` - lexicon scoring of news headlines
//! - `analysis` - the dashboard views behind one closed `AnalysisMode` enum
//! - `config` - TOML configuration
//! - `utils` - metrics, CSV/JSON I/O and logging setup
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use equity_forecast::data::{CachedProvider, YahooClient};
//! use equity_forecast::forecast::Forecaster;
//! use std::time::Duration;
//!
//! fn main() -> anyhow::Result<()> {
//!     let provider = CachedProvider::new(YahooClient::new()?, Duration::from_secs(3600));
//!     let report = Forecaster::new(provider).forecast("RELIANCE.NS", 10)?;
//!
//!     println!("calibration factor {:.4}", report.calibration_factor);
//!     for (day, _, price) in report.rows() {
//!         println!("day {:>3}: {:.2}", day, price);
//!     }
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod data;
pub mod forecast;
pub mod model;
pub mod preprocessing;
pub mod sentiment;
pub mod utils;

pub use analysis::{AnalysisMode, AnalysisOutput, Dashboard};
pub use config::AppConfig;
pub use data::{CachedProvider, Candle, CsvProvider, MarketDataProvider, PriceSeries, YahooClient};
pub use forecast::{ForecastError, ForecastReport, Forecaster};
pub use model::{ModelConfig, SequenceRegressor, TrainingConfig};
