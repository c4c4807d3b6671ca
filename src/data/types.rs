//! Market data types shared by every provider

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while fetching market data
#[derive(Error, Debug)]
pub enum DataError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("market data API error: {code} - {message}")]
    Api { code: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed record: {0}")]
    Parse(String),

    /// The request succeeded but there is nothing for this symbol/range.
    #[error("no data for {0}")]
    NoData(String),
}

impl DataError {
    /// True when the provider answered but had no rows, as opposed to a
    /// transport or decoding failure.
    pub fn is_no_data(&self) -> bool {
        matches!(self, DataError::NoData(_))
    }
}

/// One daily OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Trading day
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Intraday change from open to close, in percent
    pub fn price_change_pct(&self) -> f64 {
        if self.open == 0.0 {
            0.0
        } else {
            (self.close - self.open) / self.open * 100.0
        }
    }

    /// High-low range
    pub fn full_range(&self) -> f64 {
        self.high - self.low
    }

    fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Daily bars for one symbol, ascending by date with no duplicate dates.
///
/// The constructor sorts the input and keeps the last record seen for any
/// repeated date, so every `PriceSeries` upholds the ordering invariant.
/// Deserialization goes through the same constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SeriesRecord")]
pub struct PriceSeries {
    symbol: String,
    candles: Vec<Candle>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, mut candles: Vec<Candle>) -> Self {
        candles.retain(Candle::is_finite);
        // stable sort keeps arrival order among equal dates
        candles.sort_by_key(|c| c.date);

        let mut deduped: Vec<Candle> = Vec::with_capacity(candles.len());
        for candle in candles {
            match deduped.last_mut() {
                Some(last) if last.date == candle.date => *last = candle,
                _ => deduped.push(candle),
            }
        }

        Self {
            symbol: symbol.into(),
            candles: deduped,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.candles.iter().map(|c| c.date).collect()
    }

    /// Bars whose date lies in `[start, end]`
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        let candles = self
            .candles
            .iter()
            .filter(|c| c.date >= start && c.date <= end)
            .cloned()
            .collect();
        Self {
            symbol: self.symbol.clone(),
            candles,
        }
    }
}

#[derive(Deserialize)]
struct SeriesRecord {
    symbol: String,
    candles: Vec<Candle>,
}

impl From<SeriesRecord> for PriceSeries {
    fn from(record: SeriesRecord) -> Self {
        PriceSeries::new(record.symbol, record.candles)
    }
}

/// Instantaneous quote for a symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    /// Last traded price, if the venue reported one
    pub price: Option<f64>,
    pub currency: Option<String>,
}

/// Valuation figures of a listed company; any of them may be unknown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub symbol: String,
    pub currency: Option<String>,
    pub market_cap: Option<f64>,
    /// Trailing price/earnings
    pub pe_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    /// Trailing earnings per share
    pub eps: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
}

impl Fundamentals {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_price_change_pct() {
        let candle = Candle::new(day(1), 100.0, 110.0, 95.0, 110.0, 1000.0);
        assert_eq!(candle.price_change_pct(), 10.0);
        assert_eq!(candle.full_range(), 15.0);
    }

    #[test]
    fn test_series_sorted_and_deduplicated() {
        let series = PriceSeries::new(
            "TEST",
            vec![
                Candle::new(day(3), 1.0, 1.0, 1.0, 3.0, 1.0),
                Candle::new(day(1), 1.0, 1.0, 1.0, 1.0, 1.0),
                Candle::new(day(2), 1.0, 1.0, 1.0, 2.0, 1.0),
                Candle::new(day(2), 1.0, 1.0, 1.0, 2.5, 1.0),
            ],
        );

        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![1.0, 2.5, 3.0]);
        assert!(series.dates().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_series_drops_non_finite_rows() {
        let series = PriceSeries::new(
            "TEST",
            vec![
                Candle::new(day(1), 1.0, 1.0, 1.0, f64::NAN, 1.0),
                Candle::new(day(2), 1.0, 1.0, 1.0, 2.0, 1.0),
            ],
        );
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_between() {
        let candles = (1..=10)
            .map(|d| Candle::new(day(d), 1.0, 1.0, 1.0, d as f64, 1.0))
            .collect();
        let series = PriceSeries::new("TEST", candles);
        let slice = series.between(day(3), day(5));
        assert_eq!(slice.closes(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_deserialize_restores_ordering() {
        let json = r#"{"symbol": "TEST", "candles": [
            {"date": "2024-01-03", "open": 1.0, "high": 1.0, "low": 1.0, "close": 3.0, "volume": 1.0},
            {"date": "2024-01-01", "open": 1.0, "high": 1.0, "low": 1.0, "close": 1.0, "volume": 1.0},
            {"date": "2024-01-03", "open": 1.0, "high": 1.0, "low": 1.0, "close": 3.5, "volume": 1.0}
        ]}"#;
        let series: PriceSeries = serde_json::from_str(json).unwrap();

        assert_eq!(series.symbol(), "TEST");
        assert_eq!(series.dates(), vec![day(1), day(3)]);
        assert_eq!(series.closes(), vec![1.0, 3.5]);

        let round_trip: PriceSeries = serde_json::from_str(&serde_json::to_string(&series).unwrap()).unwrap();
        assert_eq!(round_trip, series);
    }

    #[test]
    fn test_no_data_flag() {
        assert!(DataError::NoData("X".into()).is_no_data());
        assert!(!DataError::Parse("bad".into()).is_no_data());
    }
}
