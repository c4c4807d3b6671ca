//! Auto-regressive multi-step rollout
//!
//! Each step predicts the next normalized close from the buffer, then slides
//! the buffer by one row. The appended row is a copy of the previous last
//! row with only the close column replaced; the other features stay frozen
//! at their last observed values.

use crate::model::{ModelError, SequenceRegressor};
use ndarray::{s, Array2, ArrayView2};

/// Anything that maps one `[steps, features]` window to a scalar
pub trait WindowPredictor {
    fn predict_window(&self, window: ArrayView2<'_, f64>) -> Result<f64, ModelError>;
}

impl WindowPredictor for SequenceRegressor {
    fn predict_window(&self, window: ArrayView2<'_, f64>) -> Result<f64, ModelError> {
        SequenceRegressor::predict_window(self, window)
    }
}

/// Lazy rollout; yields at most `days` predictions and stops after an error
pub struct Rollout<'m, M> {
    model: &'m M,
    buffer: Array2<f64>,
    target_col: usize,
    remaining: usize,
}

impl<'m, M: WindowPredictor> Rollout<'m, M> {
    pub fn new(
        model: &'m M,
        seed_window: ArrayView2<'_, f64>,
        target_col: usize,
        days: usize,
    ) -> Result<Self, ModelError> {
        if seed_window.nrows() == 0 {
            return Err(ModelError::Shape("rollout needs a non-empty seed window".into()));
        }
        if target_col >= seed_window.ncols() {
            return Err(ModelError::Shape(format!(
                "target column {} outside window of width {}",
                target_col,
                seed_window.ncols()
            )));
        }

        Ok(Self {
            model,
            buffer: seed_window.to_owned(),
            target_col,
            remaining: days,
        })
    }

    /// Current window, oldest row first
    pub fn buffer(&self) -> ArrayView2<'_, f64> {
        self.buffer.view()
    }

    fn advance(&mut self, prediction: f64) {
        let last = self.buffer.nrows() - 1;
        let mut next_row = self.buffer.row(last).to_owned();
        next_row[self.target_col] = prediction;

        let mut shifted = Array2::zeros(self.buffer.raw_dim());
        shifted
            .slice_mut(s![..last, ..])
            .assign(&self.buffer.slice(s![1.., ..]));
        shifted.row_mut(last).assign(&next_row);
        self.buffer = shifted;
    }
}

impl<M: WindowPredictor> Iterator for Rollout<'_, M> {
    type Item = Result<f64, ModelError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        match self.model.predict_window(self.buffer.view()) {
            Ok(prediction) => {
                self.advance(prediction);
                Some(Ok(prediction))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

/// Runs the whole rollout and collects the normalized predictions
pub fn roll_out<M: WindowPredictor>(
    model: &M,
    seed_window: ArrayView2<'_, f64>,
    target_col: usize,
    days: usize,
) -> Result<Vec<f64>, ModelError> {
    Rollout::new(model, seed_window, target_col, days)?.collect()
}
