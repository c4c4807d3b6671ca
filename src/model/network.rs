//! Stacked LSTM regressor: LSTM layers with dropout, then fully-connected
//! layers down to one output.

use super::config::{ModelConfig, TrainingConfig};
use super::layers::{Activation, Dense, Dropout};
use super::lstm::LstmLayer;
use super::optimizer::Adam;
use super::ModelError;
use crate::preprocessing::WindowedDataset;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Loss history and early-stopping outcome of one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Mean training MSE per epoch
    pub train_losses: Vec<f64>,
    /// Validation MSE per epoch
    pub val_losses: Vec<f64>,
    /// 1-based epoch whose weights the model ended with
    pub best_epoch: usize,
    pub best_val_loss: f64,
    pub epochs_run: usize,
    pub stopped_early: bool,
}

impl TrainingReport {
    pub fn final_train_loss(&self) -> Option<f64> {
        self.train_losses.last().copied()
    }
}

/// Sequence-to-one regressor
///
/// Input `[batch, steps, features]`, output `[batch, 1]`.
#[derive(Debug, Clone)]
pub struct SequenceRegressor {
    config: ModelConfig,
    lstm_layers: Vec<LstmLayer>,
    dropouts: Vec<Dropout>,
    /// Hidden dense layers followed by the linear output unit
    dense_layers: Vec<Dense>,
    rng: StdRng,
}

impl SequenceRegressor {
    pub fn new(config: ModelConfig) -> Result<Self, ModelError> {
        if config.input_size == 0 {
            return Err(ModelError::InvalidConfig("input size must be positive".into()));
        }
        if config.lstm_units.is_empty() {
            return Err(ModelError::InvalidConfig("at least one LSTM layer is required".into()));
        }
        if config.lstm_units.iter().chain(&config.dense_units).any(|&u| u == 0) {
            return Err(ModelError::InvalidConfig("layer widths must be positive".into()));
        }
        if !(0.0..1.0).contains(&config.dropout) {
            return Err(ModelError::InvalidConfig(format!(
                "dropout must be in [0, 1), got {}",
                config.dropout
            )));
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut lstm_layers = Vec::with_capacity(config.lstm_units.len());
        let mut width = config.input_size;
        for &units in &config.lstm_units {
            lstm_layers.push(LstmLayer::new(width, units, &mut rng));
            width = units;
        }
        let dropouts = config.lstm_units.iter().map(|_| Dropout::new(config.dropout)).collect();

        let mut dense_layers = Vec::with_capacity(config.dense_units.len() + 1);
        for &units in &config.dense_units {
            dense_layers.push(Dense::new(width, units, config.dense_activation, &mut rng));
            width = units;
        }
        dense_layers.push(Dense::new(width, 1, Activation::Linear, &mut rng));

        Ok(Self {
            config,
            lstm_layers,
            dropouts,
            dense_layers,
            rng,
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn parameter_count(&self) -> usize {
        self.lstm_layers.iter().map(LstmLayer::parameter_count).sum::<usize>()
            + self
                .dense_layers
                .iter()
                .map(|d| d.weights.len() + d.biases.len())
                .sum::<usize>()
    }

    fn check_input(&self, x: &ArrayView3<'_, f64>) -> Result<(), ModelError> {
        if x.shape()[2] != self.config.input_size {
            return Err(ModelError::Shape(format!(
                "model expects {} features, got {}",
                self.config.input_size,
                x.shape()[2]
            )));
        }
        Ok(())
    }

    /// Inference over a batch of windows; dropout is inactive
    pub fn predict(&self, x: ArrayView3<'_, f64>) -> Result<Array2<f64>, ModelError> {
        self.check_input(&x)?;

        let mut seq = x.to_owned();
        for layer in &self.lstm_layers {
            seq = layer.forward(seq.view())?;
        }
        let last = seq.shape()[1] - 1;
        let mut out = seq.slice(s![.., last, ..]).to_owned();
        for layer in &self.dense_layers {
            out = layer.forward(&out)?;
        }
        Ok(out)
    }

    /// Prediction for a single `[steps, features]` window
    pub fn predict_window(&self, window: ArrayView2<'_, f64>) -> Result<f64, ModelError> {
        let batch = window.insert_axis(Axis(0));
        let out = self.predict(batch)?;
        Ok(out[[0, 0]])
    }

    /// Mean squared error over `inputs` / `targets`
    pub fn evaluate(&self, inputs: &Array3<f64>, targets: &Array2<f64>) -> Result<f64, ModelError> {
        let predictions = self.predict(inputs.view())?;
        Ok(mse_loss(&predictions, targets))
    }

    /// One optimisation step on a mini-batch; returns the batch loss
    fn train_batch(&mut self, x: &Array3<f64>, y: &Array2<f64>, adam: &mut Adam) -> Result<f64, ModelError> {
        let mut seq = x.clone();
        for (layer, dropout) in self.lstm_layers.iter_mut().zip(self.dropouts.iter_mut()) {
            seq = layer.forward_train(&seq)?;
            seq = dropout.forward_train(seq, &mut self.rng);
        }

        let (batch, steps, width) = seq.dim();
        let mut out = seq.slice(s![.., steps - 1, ..]).to_owned();
        for layer in self.dense_layers.iter_mut() {
            out = layer.forward_train(&out)?;
        }

        let loss = mse_loss(&out, y);
        let mut grad = (&out - y) * (2.0 / batch as f64);

        for layer in self.dense_layers.iter_mut().rev() {
            grad = layer.backward(&grad)?;
        }

        let mut d_seq = Array3::zeros((batch, steps, width));
        d_seq.slice_mut(s![.., steps - 1, ..]).assign(&grad);
        for (layer, dropout) in self.lstm_layers.iter_mut().zip(self.dropouts.iter_mut()).rev() {
            d_seq = dropout.backward(d_seq);
            d_seq = layer.backward(&d_seq)?;
        }

        adam.step();
        for layer in self.lstm_layers.iter_mut() {
            layer.apply_gradients(adam);
        }
        for layer in self.dense_layers.iter_mut() {
            layer.apply_gradients(adam);
        }

        Ok(loss)
    }

    /// Trains with mini-batch Adam and early stopping on validation loss.
    ///
    /// The split between `train` and `validation` is the caller's; only the
    /// order of training samples inside an epoch is shuffled. The model ends
    /// with the weights of the best validation epoch.
    pub fn train(
        &mut self,
        train: &WindowedDataset,
        validation: &WindowedDataset,
        config: &TrainingConfig,
    ) -> Result<TrainingReport, ModelError> {
        if train.is_empty() {
            return Err(ModelError::EmptyDataset("training"));
        }
        if validation.is_empty() {
            return Err(ModelError::EmptyDataset("validation"));
        }
        if config.epochs == 0 || config.batch_size == 0 {
            return Err(ModelError::InvalidConfig(
                "epochs and batch size must be positive".into(),
            ));
        }

        info!(
            "Training {} parameters on {} windows, validating on {}",
            self.parameter_count(),
            train.len(),
            validation.len()
        );

        let mut adam = Adam::from_config(config);
        for layer in self.lstm_layers.iter_mut() {
            layer.reset_optimizer();
        }
        for layer in self.dense_layers.iter_mut() {
            layer.reset_optimizer();
        }

        let progress = if config.show_progress {
            let pb = ProgressBar::new(config.epochs as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut report = TrainingReport {
            train_losses: Vec::new(),
            val_losses: Vec::new(),
            best_epoch: 0,
            best_val_loss: f64::INFINITY,
            epochs_run: 0,
            stopped_early: false,
        };
        let mut best: Option<(Vec<LstmLayer>, Vec<Dense>)> = None;
        let mut wait = 0;
        let mut order: Vec<usize> = (0..train.len()).collect();

        for epoch in 1..=config.epochs {
            if config.shuffle {
                order.shuffle(&mut self.rng);
            }

            let mut loss_sum = 0.0;
            for chunk in order.chunks(config.batch_size) {
                let x = train.inputs.select(Axis(0), chunk);
                let y = train.targets.select(Axis(0), chunk);
                loss_sum += self.train_batch(&x, &y, &mut adam)? * chunk.len() as f64;
            }
            let train_loss = loss_sum / train.len() as f64;
            let val_loss = self.evaluate(&validation.inputs, &validation.targets)?;

            if !train_loss.is_finite() || !val_loss.is_finite() {
                progress.abandon();
                return Err(ModelError::NonFiniteLoss { epoch });
            }

            report.train_losses.push(train_loss);
            report.val_losses.push(val_loss);
            report.epochs_run = epoch;

            debug!(
                "Epoch {}/{}: loss={:.6}, val_loss={:.6}",
                epoch, config.epochs, train_loss, val_loss
            );
            progress.set_message(format!("loss {:.6} val {:.6}", train_loss, val_loss));
            progress.inc(1);

            if val_loss < report.best_val_loss - config.min_delta {
                report.best_val_loss = val_loss;
                report.best_epoch = epoch;
                best = Some((self.lstm_layers.clone(), self.dense_layers.clone()));
                wait = 0;
            } else {
                wait += 1;
                if wait >= config.patience {
                    info!("Early stopping at epoch {}", epoch);
                    report.stopped_early = true;
                    break;
                }
            }
        }

        progress.finish_and_clear();

        if let Some((lstm_layers, dense_layers)) = best {
            self.lstm_layers = lstm_layers;
            self.dense_layers = dense_layers;
        }

        info!(
            "Training finished after {} epochs; best val_loss={:.6} at epoch {}",
            report.epochs_run, report.best_val_loss, report.best_epoch
        );

        Ok(report)
    }
}

fn mse_loss(predictions: &Array2<f64>, targets: &Array2<f64>) -> f64 {
    let diff = predictions - targets;
    diff.mapv(|v| v * v).mean().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::build_windows;

    fn sine_dataset(rows: usize, seq_len: usize) -> WindowedDataset {
        let matrix = Array2::from_shape_fn((rows, 2), |(r, c)| {
            let t = r as f64 * 0.2;
            if c == 0 {
                0.5 + 0.4 * t.sin()
            } else {
                0.5 + 0.4 * t.cos()
            }
        });
        build_windows(matrix.view(), 0, seq_len).unwrap()
    }

    fn tiny_config() -> ModelConfig {
        ModelConfig::small(2).with_seed(3)
    }

    #[test]
    fn test_output_shape() {
        let model = SequenceRegressor::new(tiny_config()).unwrap();
        let out = model.predict(Array3::zeros((5, 10, 2)).view()).unwrap();
        assert_eq!(out.shape(), &[5, 1]);

        let single = model.predict_window(Array2::zeros((10, 2)).view()).unwrap();
        assert!((single - out[[0, 0]]).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_config() {
        assert!(SequenceRegressor::new(ModelConfig::new(0)).is_err());
        assert!(SequenceRegressor::new(ModelConfig::new(3).with_lstm_units(vec![])).is_err());
        assert!(SequenceRegressor::new(ModelConfig::new(3).with_dropout(1.0)).is_err());
    }

    #[test]
    fn test_wrong_feature_count() {
        let model = SequenceRegressor::new(tiny_config()).unwrap();
        assert!(matches!(
            model.predict(Array3::zeros((1, 10, 3)).view()),
            Err(ModelError::Shape(_))
        ));
    }

    #[test]
    fn test_same_seed_same_weights() {
        let a = SequenceRegressor::new(tiny_config()).unwrap();
        let b = SequenceRegressor::new(tiny_config()).unwrap();
        let x = Array3::from_elem((2, 6, 2), 0.3);
        assert_eq!(a.predict(x.view()).unwrap(), b.predict(x.view()).unwrap());
    }

    #[test]
    fn test_training_reduces_loss() {
        let (train, val) = sine_dataset(160, 12).split(0.8);
        let mut model = SequenceRegressor::new(tiny_config().with_dropout(0.0)).unwrap();
        let before = model.evaluate(&val.inputs, &val.targets).unwrap();

        let config = TrainingConfig::default()
            .with_epochs(25)
            .with_batch_size(16)
            .with_learning_rate(0.01)
            .with_patience(25);
        let report = model.train(&train, &val, &config).unwrap();

        assert_eq!(report.train_losses.len(), report.epochs_run);
        assert!(report.final_train_loss().unwrap() < report.train_losses[0]);
        assert!(report.best_val_loss < before);

        // best weights are restored
        let after = model.evaluate(&val.inputs, &val.targets).unwrap();
        assert!((after - report.best_val_loss).abs() < 1e-12);
    }

    #[test]
    fn test_early_stopping_restores_best_epoch() {
        let (train, val) = sine_dataset(100, 8).split(0.8);
        let mut model = SequenceRegressor::new(tiny_config()).unwrap();
        // nothing after the first epoch can beat the best loss by min_delta
        let config = TrainingConfig {
            epochs: 50,
            patience: 2,
            min_delta: 1e9,
            ..TrainingConfig::default()
        };
        let report = model.train(&train, &val, &config).unwrap();

        assert!(report.stopped_early);
        assert_eq!(report.epochs_run, 3);
        assert_eq!(report.best_epoch, 1);
        assert_eq!(report.best_val_loss, report.val_losses[0]);

        let restored = model.evaluate(&val.inputs, &val.targets).unwrap();
        assert!((restored - report.val_losses[0]).abs() < 1e-12);
    }

    #[test]
    fn test_empty_validation_rejected() {
        let dataset = sine_dataset(40, 8);
        let (train, val) = dataset.split(1.0);
        let mut model = SequenceRegressor::new(tiny_config()).unwrap();
        let err = model
            .train(&train, &val, &TrainingConfig::default().with_epochs(1))
            .unwrap_err();
        assert!(matches!(err, ModelError::EmptyDataset("validation")));
    }
}
