//! # Sequence model
//!
//! A stacked LSTM regressor with hand-written backpropagation through time,
//! trained with Adam and early stopping.
//!
//! ```rust,no_run
//! use equity_forecast::model::{ModelConfig, SequenceRegressor, TrainingConfig};
//! # use equity_forecast::preprocessing::WindowedDataset;
//!
//! # fn run(train: WindowedDataset, val: WindowedDataset) -> Result<(), Box<dyn std::error::Error>> {
//! let mut model = SequenceRegressor::new(ModelConfig::new(9).with_seed(42))?;
//! let report = model.train(&train, &val, &TrainingConfig::default())?;
//! println!("best val_loss {:.6} at epoch {}", report.best_val_loss, report.best_epoch);
//! # Ok(())
//! # }
//! ```

mod config;
mod layers;
mod lstm;
mod network;
mod optimizer;

use thiserror::Error;

pub use config::{ModelConfig, TrainingConfig};
pub use layers::{Activation, Dense, Dropout};
pub use lstm::LstmLayer;
pub use network::{SequenceRegressor, TrainingReport};
pub use optimizer::{Adam, AdamState};

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("invalid model configuration: {0}")]
    InvalidConfig(String),

    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("{0} set is empty")]
    EmptyDataset(&'static str),

    #[error("loss became non-finite at epoch {epoch}")]
    NonFiniteLoss { epoch: usize },

    #[error("backward pass without a preceding training forward pass")]
    MissingForwardPass,
}
