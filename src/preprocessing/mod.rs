//! # Preprocessing
//!
//! From a price series to model-ready windows:
//! - feature engineering (moving averages, percentage changes)
//! - min-max normalization
//! - sequence windowing and the chronological train/test split
//!
//! ## Example
//!
//! ```rust,no_run
//! use equity_forecast::data::PriceSeries;
//! use equity_forecast::preprocessing::{build_windows, FeatureBuilder, NormalizationState};
//!
//! # fn run(series: PriceSeries) -> Result<(), Box<dyn std::error::Error>> {
//! let frame = FeatureBuilder::default().build(&series);
//! let state = NormalizationState::fit(&frame)?;
//! let matrix = state.transform(&frame)?;
//!
//! // 60 steps back, close price as the target
//! let dataset = build_windows(matrix.view(), state.close_index(), 60)?;
//! let (train, test) = dataset.split(0.8);
//! # Ok(())
//! # }
//! ```

mod features;
mod normalizer;
mod windowing;

use thiserror::Error;

pub use features::{ema, macd, pct_change, rsi, sma, FeatureBuilder, FeatureColumn, FeatureFrame, Macd};
pub use normalizer::{MinMaxScaler, NormalizationState};
pub use windowing::{build_windows, train_split_size, WindowedDataset};

/// Shape and content errors raised while preparing data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreprocessingError {
    #[error("empty input")]
    EmptyInput,

    #[error("column mismatch: expected {expected}, got {got}")]
    ColumnMismatch { expected: usize, got: usize },

    #[error("insufficient rows: need {needed}, got {got}")]
    InsufficientRows { needed: usize, got: usize },

    #[error("shape error: {0}")]
    Shape(String),
}
