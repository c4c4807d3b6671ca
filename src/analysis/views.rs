//! Result types of the non-forecast views

use crate::data::{Candle, PriceSeries};
use crate::preprocessing::{macd, rsi, sma};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Latest session of one market index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub name: String,
    pub symbol: String,
    pub date: NaiveDate,
    pub price: f64,
    /// Close minus open of the session
    pub change: f64,
    pub percent_change: f64,
}

impl IndexSnapshot {
    pub fn from_candle(name: &str, symbol: &str, candle: &Candle) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            date: candle.date,
            price: candle.close,
            change: candle.close - candle.open,
            percent_change: candle.price_change_pct(),
        }
    }
}

/// Close-price summary of a series over a date range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub observations: usize,
    pub first_close: f64,
    pub last_close: f64,
    pub min_close: f64,
    pub max_close: f64,
    /// First to last close, in percent
    pub change_pct: f64,
    pub series: PriceSeries,
}

impl SeriesSummary {
    /// `None` for an empty series
    pub fn from_series(series: PriceSeries) -> Option<Self> {
        let first = series.candles().first()?.clone();
        let last = series.last()?.clone();
        let closes = series.closes();
        let min_close = closes.iter().copied().fold(f64::INFINITY, f64::min);
        let max_close = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let change_pct = if first.close == 0.0 {
            0.0
        } else {
            (last.close - first.close) / first.close * 100.0
        };

        Some(Self {
            symbol: series.symbol().to_string(),
            start: first.date,
            end: last.date,
            observations: series.len(),
            first_close: first.close,
            last_close: last.close,
            min_close,
            max_close,
            change_pct,
            series,
        })
    }
}

/// Indicator columns aligned with `dates`; `None` during each warm-up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalSummary {
    pub symbol: String,
    pub dates: Vec<NaiveDate>,
    pub closes: Vec<f64>,
    pub sma_50: Vec<Option<f64>>,
    pub sma_200: Vec<Option<f64>>,
    pub rsi_14: Vec<Option<f64>>,
    pub macd_diff: Vec<Option<f64>>,
}

/// One row of a [`TechnicalSummary`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TechnicalSnapshot {
    pub date: NaiveDate,
    pub close: f64,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub rsi_14: Option<f64>,
    pub macd_diff: Option<f64>,
}

impl TechnicalSummary {
    pub fn compute(series: &PriceSeries) -> Self {
        let closes = series.closes();
        Self {
            symbol: series.symbol().to_string(),
            dates: series.dates(),
            sma_50: sma(&closes, 50),
            sma_200: sma(&closes, 200),
            rsi_14: rsi(&closes, 14),
            macd_diff: macd(&closes, 12, 26, 9).histogram,
            closes,
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn row(&self, i: usize) -> Option<TechnicalSnapshot> {
        Some(TechnicalSnapshot {
            date: *self.dates.get(i)?,
            close: self.closes[i],
            sma_50: self.sma_50[i],
            sma_200: self.sma_200[i],
            rsi_14: self.rsi_14[i],
            macd_diff: self.macd_diff[i],
        })
    }

    /// Last `n` rows, oldest first
    pub fn tail(&self, n: usize) -> Vec<TechnicalSnapshot> {
        let start = self.len().saturating_sub(n);
        (start..self.len()).filter_map(|i| self.row(i)).collect()
    }

    pub fn latest(&self) -> Option<TechnicalSnapshot> {
        self.len().checked_sub(1).and_then(|i| self.row(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn series(n: usize) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let candles = (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.1).sin() * 10.0 + i as f64 * 0.05;
                Candle::new(start + Duration::days(i as i64), close - 0.5, close + 1.0, close - 1.0, close, 1e5)
            })
            .collect();
        PriceSeries::new("TEST", candles)
    }

    #[test]
    fn test_index_snapshot() {
        let d = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let candle = Candle::new(d, 100.0, 103.0, 99.0, 102.0, 0.0);
        let snap = IndexSnapshot::from_candle("NIFTY", "^NSEI", &candle);
        assert_eq!(snap.price, 102.0);
        assert_eq!(snap.change, 2.0);
        assert!((snap.percent_change - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_series_summary() {
        let s = series(30);
        let summary = SeriesSummary::from_series(s.clone()).unwrap();
        let closes = s.closes();

        assert_eq!(summary.observations, 30);
        assert_eq!(summary.first_close, closes[0]);
        assert_eq!(summary.last_close, closes[29]);
        assert!(closes.iter().all(|&c| c >= summary.min_close && c <= summary.max_close));
        assert!(SeriesSummary::from_series(PriceSeries::new("E", vec![])).is_none());
    }

    #[test]
    fn test_technical_warm_up() {
        let summary = TechnicalSummary::compute(&series(260));
        assert_eq!(summary.len(), 260);
        assert!(summary.sma_50[48].is_none());
        assert!(summary.sma_50[49].is_some());
        assert!(summary.sma_200[198].is_none());
        assert!(summary.sma_200[199].is_some());
        assert!(summary.rsi_14[14].is_some());
        assert!(summary.macd_diff[32].is_none());
        assert!(summary.macd_diff[33].is_some());

        let latest = summary.latest().unwrap();
        assert_eq!(latest.date, *summary.dates.last().unwrap());
        assert_eq!(summary.tail(5).len(), 5);
    }
}
