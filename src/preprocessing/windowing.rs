//! Sliding windows over a normalized feature matrix

use super::PreprocessingError;
use ndarray::{s, Array2, Array3, ArrayView2};

/// `(input_window, target)` pairs in chronological order.
///
/// `inputs[k]` covers matrix rows `target_rows[k] - sequence_length ..
/// target_rows[k]`; `targets[k]` is the target column at `target_rows[k]`.
#[derive(Debug, Clone)]
pub struct WindowedDataset {
    /// `[samples, sequence_length, features]`
    pub inputs: Array3<f64>,
    /// `[samples, 1]`
    pub targets: Array2<f64>,
    /// Matrix row of each target
    pub target_rows: Vec<usize>,
}

impl WindowedDataset {
    pub fn len(&self) -> usize {
        self.inputs.shape()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sequence_length(&self) -> usize {
        self.inputs.shape()[1]
    }

    pub fn n_features(&self) -> usize {
        self.inputs.shape()[2]
    }

    /// Chronological split: the first `floor(len * train_ratio)` windows train,
    /// the rest validate. No shuffling.
    pub fn split(&self, train_ratio: f64) -> (WindowedDataset, WindowedDataset) {
        let train_size = train_split_size(self.len(), train_ratio);
        (self.range(0, train_size), self.range(train_size, self.len()))
    }

    fn range(&self, start: usize, end: usize) -> WindowedDataset {
        WindowedDataset {
            inputs: self.inputs.slice(s![start..end, .., ..]).to_owned(),
            targets: self.targets.slice(s![start..end, ..]).to_owned(),
            target_rows: self.target_rows[start..end].to_vec(),
        }
    }
}

/// Number of training windows for `n_windows` at `train_ratio`
pub fn train_split_size(n_windows: usize, train_ratio: f64) -> usize {
    ((n_windows as f64 * train_ratio).floor() as usize).min(n_windows)
}

/// Builds one window per row `i` in `sequence_length..rows`: input rows
/// `[i - sequence_length, i)`, target `matrix[i, target_col]`.
pub fn build_windows(
    matrix: ArrayView2<'_, f64>,
    target_col: usize,
    sequence_length: usize,
) -> Result<WindowedDataset, PreprocessingError> {
    let (n_rows, n_features) = matrix.dim();

    if sequence_length == 0 {
        return Err(PreprocessingError::Shape("sequence length must be positive".into()));
    }
    if target_col >= n_features {
        return Err(PreprocessingError::ColumnMismatch {
            expected: target_col + 1,
            got: n_features,
        });
    }
    if n_rows <= sequence_length {
        return Err(PreprocessingError::InsufficientRows {
            needed: sequence_length + 1,
            got: n_rows,
        });
    }

    let n_windows = n_rows - sequence_length;
    let mut inputs = Array3::zeros((n_windows, sequence_length, n_features));
    let mut targets = Array2::zeros((n_windows, 1));
    let mut target_rows = Vec::with_capacity(n_windows);

    for (k, i) in (sequence_length..n_rows).enumerate() {
        inputs
            .slice_mut(s![k, .., ..])
            .assign(&matrix.slice(s![i - sequence_length..i, ..]));
        targets[[k, 0]] = matrix[[i, target_col]];
        target_rows.push(i);
    }

    Ok(WindowedDataset {
        inputs,
        targets,
        target_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(rows: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |(r, c)| (r * 10 + c) as f64)
    }

    #[test]
    fn test_window_count_and_alignment() {
        let matrix = ramp(100, 3);
        let dataset = build_windows(matrix.view(), 1, 60).unwrap();

        assert_eq!(dataset.len(), 40);
        assert_eq!(dataset.sequence_length(), 60);
        assert_eq!(dataset.n_features(), 3);

        for k in 0..dataset.len() {
            let target_row = dataset.target_rows[k];
            assert_eq!(target_row, k + 60);
            // last input row immediately precedes the target row
            assert_eq!(dataset.inputs[[k, 59, 0]], ((target_row - 1) * 10) as f64);
            assert_eq!(dataset.targets[[k, 0]], (target_row * 10 + 1) as f64);
        }
    }

    #[test]
    fn test_split_is_chronological() {
        let matrix = ramp(130, 2);
        let dataset = build_windows(matrix.view(), 0, 60).unwrap();
        let (train, test) = dataset.split(0.8);

        assert_eq!(train.len(), 56);
        assert_eq!(test.len(), 14);
        let last_train = *train.target_rows.last().unwrap();
        assert!(test.target_rows.iter().all(|&r| r > last_train));
        assert_eq!(test.target_rows[0], last_train + 1);
    }

    #[test]
    fn test_too_few_rows() {
        let matrix = ramp(60, 2);
        let err = build_windows(matrix.view(), 0, 60).unwrap_err();
        assert!(matches!(
            err,
            PreprocessingError::InsufficientRows { needed: 61, got: 60 }
        ));
    }

    #[test]
    fn test_bad_target_column() {
        let matrix = ramp(80, 2);
        assert!(build_windows(matrix.view(), 5, 10).is_err());
    }

    #[test]
    fn test_train_split_size() {
        assert_eq!(train_split_size(2, 0.8), 1);
        assert_eq!(train_split_size(90, 0.8), 72);
        assert_eq!(train_split_size(10, 1.5), 10);
    }
}
