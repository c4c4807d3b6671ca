//! Min-max scaling to `[0, 1]`

use super::features::{FeatureColumn, FeatureFrame};
use super::PreprocessingError;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Per-column min-max scaler.
///
/// A column whose min equals its max is mapped with unit range, so it
/// transforms to zero and inverts exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: Array1<f64>,
    max: Array1<f64>,
}

impl MinMaxScaler {
    /// Learns per-column bounds of `data` `[rows, cols]`
    pub fn fit(data: ArrayView2<'_, f64>) -> Result<Self, PreprocessingError> {
        if data.nrows() == 0 || data.ncols() == 0 {
            return Err(PreprocessingError::EmptyInput);
        }

        let min = data.fold_axis(Axis(0), f64::INFINITY, |&acc, &v| acc.min(v));
        let max = data.fold_axis(Axis(0), f64::NEG_INFINITY, |&acc, &v| acc.max(v));
        Ok(Self { min, max })
    }

    pub fn n_columns(&self) -> usize {
        self.min.len()
    }

    pub fn min_vals(&self) -> &Array1<f64> {
        &self.min
    }

    pub fn max_vals(&self) -> &Array1<f64> {
        &self.max
    }

    fn range(&self, col: usize) -> f64 {
        let range = self.max[col] - self.min[col];
        if range == 0.0 {
            1.0
        } else {
            range
        }
    }

    fn check_columns(&self, cols: usize) -> Result<(), PreprocessingError> {
        if cols != self.n_columns() {
            return Err(PreprocessingError::ColumnMismatch {
                expected: self.n_columns(),
                got: cols,
            });
        }
        Ok(())
    }

    pub fn transform(&self, data: ArrayView2<'_, f64>) -> Result<Array2<f64>, PreprocessingError> {
        self.check_columns(data.ncols())?;
        let mut out = data.to_owned();
        for (col, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (min, range) = (self.min[col], self.range(col));
            column.mapv_inplace(|v| (v - min) / range);
        }
        Ok(out)
    }

    pub fn inverse_transform(
        &self,
        data: ArrayView2<'_, f64>,
    ) -> Result<Array2<f64>, PreprocessingError> {
        self.check_columns(data.ncols())?;
        let mut out = data.to_owned();
        for (col, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (min, range) = (self.min[col], self.range(col));
            column.mapv_inplace(|v| v * range + min);
        }
        Ok(out)
    }

    /// Scales one value of column `col`
    pub fn transform_value(&self, col: usize, value: f64) -> f64 {
        (value - self.min[col]) / self.range(col)
    }

    /// Inverse of [`transform_value`](Self::transform_value)
    pub fn inverse_value(&self, col: usize, value: f64) -> f64 {
        value * self.range(col) + self.min[col]
    }
}

/// The two scaling contexts of one forecast: every feature, and close alone.
///
/// Both are fit once and reused for every inverse transform; rollout data
/// never refits them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizationState {
    pub features: MinMaxScaler,
    pub close: MinMaxScaler,
}

impl NormalizationState {
    /// Fits both scalers on `frame`
    pub fn fit(frame: &FeatureFrame) -> Result<Self, PreprocessingError> {
        let features = MinMaxScaler::fit(frame.values().view())?;
        let close_column = frame.closes().insert_axis(Axis(1));
        let close = MinMaxScaler::fit(close_column.view())?;
        Ok(Self { features, close })
    }

    /// Normalized feature matrix of `frame`
    pub fn transform(&self, frame: &FeatureFrame) -> Result<Array2<f64>, PreprocessingError> {
        self.features.transform(frame.values().view())
    }

    /// Maps normalized close values back to prices
    pub fn inverse_close(&self, normalized: &[f64]) -> Result<Vec<f64>, PreprocessingError> {
        let column = Array2::from_shape_vec((normalized.len(), 1), normalized.to_vec())
            .map_err(|e| PreprocessingError::Shape(e.to_string()))?;
        let prices = self.close.inverse_transform(column.view())?;
        Ok(prices.iter().copied().collect())
    }

    /// Normalizes a close price with the close-only scaler
    pub fn transform_close(&self, price: f64) -> f64 {
        self.close.transform_value(0, price)
    }

    pub fn close_index(&self) -> usize {
        FeatureColumn::Close.index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Candle, PriceSeries};
    use crate::preprocessing::FeatureBuilder;
    use chrono::NaiveDate;
    use ndarray::array;

    #[test]
    fn test_min_max_round_trip() {
        let data = array![[1.0, 10.0, 5.0], [2.0, 20.0, 5.0], [4.0, 15.0, 5.0]];
        let scaler = MinMaxScaler::fit(data.view()).unwrap();
        let scaled = scaler.transform(data.view()).unwrap();

        assert_eq!(scaled[[0, 0]], 0.0);
        assert_eq!(scaled[[2, 0]], 1.0);
        assert_eq!(scaled[[1, 1]], 1.0);
        // constant column maps to zero
        assert_eq!(scaled.column(2).to_vec(), vec![0.0, 0.0, 0.0]);

        let restored = scaler.inverse_transform(scaled.view()).unwrap();
        for (a, b) in restored.iter().zip(data.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_column_mismatch() {
        let scaler = MinMaxScaler::fit(array![[1.0, 2.0]].view()).unwrap();
        let err = scaler.transform(array![[1.0]].view()).unwrap_err();
        assert!(matches!(err, PreprocessingError::ColumnMismatch { expected: 2, got: 1 }));
    }

    #[test]
    fn test_empty_input() {
        let empty = Array2::<f64>::zeros((0, 3));
        assert!(matches!(
            MinMaxScaler::fit(empty.view()),
            Err(PreprocessingError::EmptyInput)
        ));
    }

    #[test]
    fn test_state_close_round_trip() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let candles = (0..60)
            .map(|i| {
                let c = 50.0 + (i as f64 * 0.2).sin() * 5.0 + i as f64 * 0.1;
                Candle::new(start + chrono::Duration::days(i), c, c + 1.0, c - 1.0, c, 500.0)
            })
            .collect();
        let frame = FeatureBuilder::default().build(&PriceSeries::new("T", candles));
        let state = NormalizationState::fit(&frame).unwrap();

        let scaled = state.transform(&frame).unwrap();
        let close_idx = state.close_index();
        let normalized: Vec<f64> = scaled.column(close_idx).to_vec();
        let prices = state.inverse_close(&normalized).unwrap();

        for (p, c) in prices.iter().zip(frame.closes().iter()) {
            assert!((p - c).abs() < 1e-9);
        }
        // both contexts agree on the close column
        assert_eq!(
            state.features.min_vals()[close_idx],
            state.close.min_vals()[0]
        );
        assert!((state.transform_close(frame.closes()[0]) - normalized[0]).abs() < 1e-12);
    }
}
