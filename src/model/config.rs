//! Architecture and training hyper-parameters of the sequence regressor

use super::layers::Activation;
use serde::{Deserialize, Serialize};

/// Architecture of the stacked LSTM regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Number of input features per time step
    pub input_size: usize,
    /// Hidden width of each LSTM layer, bottom to top
    pub lstm_units: Vec<usize>,
    /// Dropout rate applied after every LSTM layer
    pub dropout: f64,
    /// Widths of the fully-connected layers between the last LSTM layer and
    /// the scalar output
    pub dense_units: Vec<usize>,
    /// Activation of the hidden dense layers
    pub dense_activation: Activation,
    /// Seed for weights, dropout masks and batch order
    pub seed: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            input_size: 9,
            lstm_units: vec![100, 50],
            dropout: 0.3,
            dense_units: vec![25],
            dense_activation: Activation::Linear,
            seed: None,
        }
    }
}

impl ModelConfig {
    pub fn new(input_size: usize) -> Self {
        Self {
            input_size,
            ..Self::default()
        }
    }

    pub fn with_lstm_units(mut self, units: Vec<usize>) -> Self {
        self.lstm_units = units;
        self
    }

    pub fn with_dense_units(mut self, units: Vec<usize>) -> Self {
        self.dense_units = units;
        self
    }

    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn with_dense_activation(mut self, activation: Activation) -> Self {
        self.dense_activation = activation;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// A tiny network for tests and smoke runs
    pub fn small(input_size: usize) -> Self {
        Self::new(input_size)
            .with_lstm_units(vec![8, 4])
            .with_dense_units(vec![4])
    }
}

/// Optimisation and early-stopping settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Maximum passes over the training set
    pub epochs: usize,
    pub batch_size: usize,
    /// Adam step size
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    /// Epochs without validation improvement before stopping
    pub patience: usize,
    /// Minimum decrease of validation loss that counts as improvement
    pub min_delta: f64,
    /// Reshuffle training samples between epochs
    pub shuffle: bool,
    /// Element-wise gradient clipping
    pub gradient_clip: Option<f64>,
    /// Draw an epoch progress bar on stderr
    pub show_progress: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 30,
            batch_size: 32,
            learning_rate: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            patience: 10,
            min_delta: 0.0,
            shuffle: true,
            gradient_clip: None,
            show_progress: false,
        }
    }
}

impl TrainingConfig {
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }

    pub fn with_gradient_clip(mut self, clip: f64) -> Self {
        self.gradient_clip = Some(clip);
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }
}
