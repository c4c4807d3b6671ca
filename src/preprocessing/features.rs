//! Feature engineering on daily OHLCV bars

use crate::data::PriceSeries;
use chrono::NaiveDate;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Columns of a [`FeatureFrame`], in matrix order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureColumn {
    Open,
    High,
    Low,
    Close,
    Volume,
    /// 5-day simple moving average of close
    SmaShort,
    /// 20-day simple moving average of close
    SmaLong,
    /// 1-day percentage change of close
    Change1d,
    /// 5-day percentage change of close
    ChangeMomentum,
}

impl FeatureColumn {
    pub const ALL: [FeatureColumn; 9] = [
        FeatureColumn::Open,
        FeatureColumn::High,
        FeatureColumn::Low,
        FeatureColumn::Close,
        FeatureColumn::Volume,
        FeatureColumn::SmaShort,
        FeatureColumn::SmaLong,
        FeatureColumn::Change1d,
        FeatureColumn::ChangeMomentum,
    ];

    /// Position of the column in the feature matrix
    pub fn index(self) -> usize {
        FeatureColumn::ALL
            .iter()
            .position(|&c| c == self)
            .unwrap_or_default()
    }

    pub fn name(self) -> &'static str {
        match self {
            FeatureColumn::Open => "open",
            FeatureColumn::High => "high",
            FeatureColumn::Low => "low",
            FeatureColumn::Close => "close",
            FeatureColumn::Volume => "volume",
            FeatureColumn::SmaShort => "sma_5",
            FeatureColumn::SmaLong => "sma_20",
            FeatureColumn::Change1d => "price_change",
            FeatureColumn::ChangeMomentum => "price_change_5d",
        }
    }
}

/// Derived feature table: one row per trading day that has every feature
/// defined, ascending by date.
#[derive(Debug, Clone)]
pub struct FeatureFrame {
    dates: Vec<NaiveDate>,
    values: Array2<f64>,
    dropped: usize,
}

impl FeatureFrame {
    /// Feature matrix `[rows, FeatureColumn::ALL.len()]`
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    /// Number of leading source rows removed for warm-up
    pub fn dropped_rows(&self) -> usize {
        self.dropped
    }

    pub fn column(&self, column: FeatureColumn) -> ArrayView1<'_, f64> {
        self.values.column(column.index())
    }

    /// Close prices as an owned vector
    pub fn closes(&self) -> Array1<f64> {
        self.column(FeatureColumn::Close).to_owned()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.column(FeatureColumn::Close).iter().last().copied()
    }

    /// Copy of the first `rows` rows
    pub fn head(&self, rows: usize) -> FeatureFrame {
        let rows = rows.min(self.n_rows());
        FeatureFrame {
            dates: self.dates[..rows].to_vec(),
            values: self.values.slice(ndarray::s![..rows, ..]).to_owned(),
            dropped: self.dropped,
        }
    }
}

/// Builds a [`FeatureFrame`] from a price series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureBuilder {
    /// Short moving average period
    pub sma_short: usize,
    /// Long moving average period
    pub sma_long: usize,
    /// Look-back of the multi-day percentage change
    pub momentum_period: usize,
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self {
            sma_short: 5,
            sma_long: 20,
            momentum_period: 5,
        }
    }
}

impl FeatureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leading rows that cannot have every feature defined
    pub fn warm_up(&self) -> usize {
        (self.sma_short.max(self.sma_long) - 1)
            .max(self.momentum_period)
            .max(1)
    }

    /// Longest rolling window used
    pub fn longest_window(&self) -> usize {
        self.sma_short.max(self.sma_long).max(self.momentum_period)
    }

    pub fn build(&self, series: &PriceSeries) -> FeatureFrame {
        let candles = series.candles();
        let closes = series.closes();

        let sma_short = sma(&closes, self.sma_short);
        let sma_long = sma(&closes, self.sma_long);
        let change_1d = pct_change(&closes, 1);
        let change_momentum = pct_change(&closes, self.momentum_period);

        let mut dates = Vec::with_capacity(candles.len());
        let mut rows: Vec<f64> = Vec::with_capacity(candles.len() * FeatureColumn::ALL.len());

        for (i, candle) in candles.iter().enumerate() {
            let derived = (sma_short[i], sma_long[i], change_1d[i], change_momentum[i]);
            if let (Some(s5), Some(s20), Some(c1), Some(c5)) = derived {
                dates.push(candle.date);
                rows.extend_from_slice(&[
                    candle.open,
                    candle.high,
                    candle.low,
                    candle.close,
                    candle.volume,
                    s5,
                    s20,
                    c1,
                    c5,
                ]);
            }
        }

        let n_rows = dates.len();
        let values = Array2::from_shape_vec((n_rows, FeatureColumn::ALL.len()), rows)
            .unwrap_or_else(|_| Array2::zeros((0, FeatureColumn::ALL.len())));

        FeatureFrame {
            dropped: candles.len() - n_rows,
            dates,
            values,
        }
    }
}

/// Simple moving average; `None` until `period` values are available
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let mut sum: f64 = values[..period].iter().sum();
    out[period - 1] = Some(sum / period as f64);
    for i in period..values.len() {
        sum += values[i] - values[i - period];
        out[i] = Some(sum / period as f64);
    }
    out
}

/// Percentage change over `periods` rows; `None` when undefined or when the
/// base value is zero
pub fn pct_change(values: &[f64], periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i < periods || periods == 0 {
                return None;
            }
            let base = values[i - periods];
            let change = (values[i] - base) / base;
            change.is_finite().then_some(change)
        })
        .collect()
}

/// Exponential moving average seeded with the first value
/// (`alpha = 2 / (period + 1)`)
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev = values[0];
    out.push(prev);
    for &v in &values[1..] {
        prev = (v - prev) * multiplier + prev;
        out.push(prev);
    }
    out
}

/// Relative Strength Index with Wilder smoothing; `None` for the first
/// `period` rows
pub fn rsi(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() <= period {
        return out;
    }

    let alpha = 1.0 / period as f64;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for i in 1..values.len() {
        let change = values[i] - values[i - 1];
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if i == 1 {
            avg_gain = gain;
            avg_loss = loss;
        } else {
            avg_gain = avg_gain * (1.0 - alpha) + gain * alpha;
            avg_loss = avg_loss * (1.0 - alpha) + loss * alpha;
        }

        if i >= period {
            out[i] = Some(if avg_loss == 0.0 {
                100.0
            } else {
                100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
            });
        }
    }
    out
}

/// MACD line, signal line and histogram
#[derive(Debug, Clone)]
pub struct Macd {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

/// MACD with the usual warm-up masking: the line is defined from
/// `slow_period - 1`, signal and histogram from
/// `slow_period + signal_period - 2`.
pub fn macd(values: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> Macd {
    let fast = ema(values, fast_period);
    let slow = ema(values, slow_period);
    let raw_line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();

    let line_start = slow_period.max(fast_period).saturating_sub(1);
    let signal_start = line_start + signal_period.saturating_sub(1);

    // signal EMA starts once the line itself is defined
    let tail_signal = ema(raw_line.get(line_start..).unwrap_or(&[]), signal_period);

    let mut line = vec![None; values.len()];
    let mut signal = vec![None; values.len()];
    let mut histogram = vec![None; values.len()];

    for i in line_start..values.len() {
        line[i] = Some(raw_line[i]);
        if i >= signal_start {
            let s = tail_signal[i - line_start];
            signal[i] = Some(s);
            histogram[i] = Some(raw_line[i] - s);
        }
    }

    Macd {
        line,
        signal,
        histogram,
    }
}
