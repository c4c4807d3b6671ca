//! Failures of a forecast request

use crate::data::DataError;
use crate::model::ModelError;
use crate::preprocessing::PreprocessingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("no price history for {symbol}")]
    DataUnavailable { symbol: String },

    #[error("insufficient history: {available} observations, {required} required")]
    InsufficientHistory { available: usize, required: usize },

    #[error("forecast horizon must be between 1 and {max} days, got {days}")]
    InvalidHorizon { days: usize, max: usize },

    #[error("training failed: {0}")]
    TrainingFailure(#[from] ModelError),

    #[error("calibration failed: {0}")]
    Calibration(String),

    #[error("market data error: {0}")]
    Provider(DataError),
}

impl From<PreprocessingError> for ForecastError {
    fn from(err: PreprocessingError) -> Self {
        ForecastError::TrainingFailure(ModelError::Shape(err.to_string()))
    }
}

impl ForecastError {
    /// Single message shown to the user when a forecast fails
    pub fn user_message(&self) -> String {
        match self {
            ForecastError::DataUnavailable { symbol } => {
                format!("No data found for {}. Please check the symbol and try again.", symbol)
            }
            ForecastError::InsufficientHistory { available, required } => format!(
                "Not enough historical data to predict: {} trading days available, {} needed.",
                available, required
            ),
            ForecastError::InvalidHorizon { max, .. } => {
                format!("Please choose between 1 and {} days to predict.", max)
            }
            other => format!("Error in prediction: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        let err = ForecastError::DataUnavailable {
            symbol: "NOPE".into(),
        };
        assert!(err.user_message().contains("NOPE"));

        let err = ForecastError::InsufficientHistory {
            available: 80,
            required: 81,
        };
        assert!(err.user_message().contains("80"));

        let err = ForecastError::InvalidHorizon { days: 0, max: 120 };
        assert!(err.user_message().contains("120"));

        let err: ForecastError = ModelError::EmptyDataset("validation").into();
        assert!(err.user_message().starts_with("Error in prediction"));
    }

    #[test]
    fn test_preprocessing_maps_to_training_failure() {
        let err: ForecastError = PreprocessingError::EmptyInput.into();
        assert!(matches!(err, ForecastError::TrainingFailure(_)));
    }
}
