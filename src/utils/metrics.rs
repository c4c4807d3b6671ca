//! Regression metrics over `[samples, outputs]` arrays

use ndarray::Array2;

/// Mean squared error
pub fn mse(y_true: &Array2<f64>, y_pred: &Array2<f64>) -> f64 {
    let diff = y_true - y_pred;
    diff.mapv(|x| x * x).mean().unwrap_or(0.0)
}

pub fn rmse(y_true: &Array2<f64>, y_pred: &Array2<f64>) -> f64 {
    mse(y_true, y_pred).sqrt()
}

/// Mean absolute error
pub fn mae(y_true: &Array2<f64>, y_pred: &Array2<f64>) -> f64 {
    let diff = y_true - y_pred;
    diff.mapv(f64::abs).mean().unwrap_or(0.0)
}

/// Coefficient of determination.
///
/// A constant target gives 0.0 rather than an undefined ratio. The score is
/// negative when the model is worse than predicting the mean.
pub fn r2_score(y_true: &Array2<f64>, y_pred: &Array2<f64>) -> f64 {
    let mean = y_true.mean().unwrap_or(0.0);

    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        0.0
    } else {
        1.0 - ss_res / ss_tot
    }
}
