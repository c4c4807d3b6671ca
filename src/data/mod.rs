//! # Market data
//!
//! Daily OHLCV history and live quotes:
//!
//! - `MarketDataProvider` - the collaborator the forecasting core consumes
//! - `YahooClient` - Yahoo Finance chart API
//! - `CsvProvider` - offline CSV files
//! - `CachedProvider` - TTL cache wrapping any provider

mod cache;
mod csv_provider;
mod provider;
mod types;
mod yahoo;

pub use cache::CachedProvider;
pub use csv_provider::CsvProvider;
pub use provider::MarketDataProvider;
pub use types::{Candle, DataError, Fundamentals, PriceSeries, Quote};
pub use yahoo::YahooClient;
