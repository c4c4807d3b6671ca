//! Forecast entry point: history → features → windows → model → rollout →
//! calibrated prices.

use super::calibration::{calibrate, resolve_reference, ReferencePrice};
use super::error::ForecastError;
use super::rollout::roll_out;
use crate::data::{DataError, MarketDataProvider, PriceSeries};
use crate::model::{ModelConfig, SequenceRegressor, TrainingConfig, TrainingReport};
use crate::preprocessing::{
    build_windows, train_split_size, FeatureBuilder, FeatureFrame, NormalizationState,
};
use crate::utils::metrics::{mse, r2_score};
use chrono::{Duration, Local, NaiveDate};
use log::{debug, info};
use ndarray::s;
use serde::{Deserialize, Serialize};

/// Rows the normalization bounds are learned from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerFit {
    /// Every row, test period included
    #[default]
    FullHistory,
    /// Only rows covered by training windows (inputs and targets)
    TrainOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Steps per input window
    pub sequence_length: usize,
    /// Fraction of windows used for training, the rest validates
    pub train_ratio: f64,
    /// Largest accepted horizon in days
    pub max_horizon: usize,
    /// Calendar days of history requested from the provider
    pub history_days: i64,
    pub scaler_fit: ScalerFit,
    pub features: FeatureBuilder,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            sequence_length: 60,
            train_ratio: 0.8,
            max_horizon: 120,
            history_days: 730,
            scaler_fit: ScalerFit::FullHistory,
            features: FeatureBuilder::default(),
        }
    }
}

impl ForecastConfig {
    /// Minimum number of raw observations: one window, the feature warm-up
    /// and a target row.
    pub fn required_history(&self) -> usize {
        self.sequence_length + self.features.longest_window() + 1
    }
}

/// Result of one forecast call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastReport {
    pub symbol: String,
    /// Date of the last observation used
    pub as_of: NaiveDate,
    pub latest_close: f64,
    /// Model output mapped back to prices, one per future day
    pub raw_prices: Vec<f64>,
    pub calibrated_prices: Vec<f64>,
    pub calibration_factor: f64,
    pub reference: ReferencePrice,
    /// False when `calibrated_prices` are the raw prices unscaled
    pub calibrated: bool,
    /// R² on the normalized training targets
    pub train_r2: f64,
    /// R² on the normalized test targets
    pub test_r2: f64,
    pub test_mse: f64,
    pub test_rmse: f64,
    pub train_windows: usize,
    pub test_windows: usize,
    pub training: TrainingReport,
}

impl ForecastReport {
    pub fn days(&self) -> usize {
        self.calibrated_prices.len()
    }

    /// `(day, raw, calibrated)` rows, days counted from 1
    pub fn rows(&self) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        self.raw_prices
            .iter()
            .zip(&self.calibrated_prices)
            .enumerate()
            .map(|(i, (&raw, &cal))| (i + 1, raw, cal))
    }
}

/// Builds, trains and rolls out a fresh model for every request
pub struct Forecaster<P> {
    provider: P,
    config: ForecastConfig,
    model: ModelConfig,
    training: TrainingConfig,
    as_of: Option<NaiveDate>,
}

impl<P: MarketDataProvider> Forecaster<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            config: ForecastConfig::default(),
            model: ModelConfig::default(),
            training: TrainingConfig::default(),
            as_of: None,
        }
    }

    pub fn with_config(mut self, config: ForecastConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_model_config(mut self, model: ModelConfig) -> Self {
        self.model = model;
        self
    }

    pub fn with_training_config(mut self, training: TrainingConfig) -> Self {
        self.training = training;
        self
    }

    /// Fixes the end of the history range instead of using today's date
    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    fn fetch_history(&self, symbol: &str) -> Result<PriceSeries, ForecastError> {
        let end = self.as_of.unwrap_or_else(|| Local::now().date_naive());
        let start = end - Duration::days(self.config.history_days);

        match self.provider.history(symbol, start, end) {
            Ok(series) if series.is_empty() => Err(ForecastError::DataUnavailable {
                symbol: symbol.to_string(),
            }),
            Ok(series) => Ok(series),
            Err(DataError::NoData(_)) => Err(ForecastError::DataUnavailable {
                symbol: symbol.to_string(),
            }),
            Err(e) => Err(ForecastError::Provider(e)),
        }
    }

    fn fit_normalization(&self, frame: &FeatureFrame) -> Result<NormalizationState, ForecastError> {
        let state = match self.config.scaler_fit {
            ScalerFit::FullHistory => NormalizationState::fit(frame)?,
            ScalerFit::TrainOnly => {
                let seq_len = self.config.sequence_length;
                let n_windows = frame.n_rows().saturating_sub(seq_len);
                let n_train = train_split_size(n_windows, self.config.train_ratio);
                NormalizationState::fit(&frame.head(n_train + seq_len))?
            }
        };
        Ok(state)
    }

    /// Forecasts `days` future closes of `symbol`, calibrated to the latest
    /// known price.
    pub fn forecast(&self, symbol: &str, days: usize) -> Result<ForecastReport, ForecastError> {
        let max = self.config.max_horizon;
        if days == 0 || days > max {
            return Err(ForecastError::InvalidHorizon { days, max });
        }

        let series = self.fetch_history(symbol)?;
        let required = self.config.required_history();
        if series.len() < required {
            return Err(ForecastError::InsufficientHistory {
                available: series.len(),
                required,
            });
        }

        let frame = self.config.features.build(&series);
        let seq_len = self.config.sequence_length;
        if frame.n_rows() <= seq_len {
            return Err(ForecastError::InsufficientHistory {
                available: series.len(),
                required: series.len() - frame.n_rows() + seq_len + 1,
            });
        }
        debug!(
            "{}: {} observations, {} feature rows after warm-up",
            symbol,
            series.len(),
            frame.n_rows()
        );

        let state = self.fit_normalization(&frame)?;
        let matrix = state.transform(&frame)?;
        let close_col = state.close_index();

        let dataset = build_windows(matrix.view(), close_col, seq_len)?;
        let (train, test) = dataset.split(self.config.train_ratio);
        info!(
            "{}: {} training windows, {} test windows",
            symbol,
            train.len(),
            test.len()
        );

        let model_config = ModelConfig {
            input_size: frame.n_features(),
            ..self.model.clone()
        };
        let mut model = SequenceRegressor::new(model_config)?;
        let training = model.train(&train, &test, &self.training)?;

        let train_pred = model.predict(train.inputs.view())?;
        let test_pred = model.predict(test.inputs.view())?;
        let train_r2 = r2_score(&train.targets, &train_pred);
        let test_r2 = r2_score(&test.targets, &test_pred);
        let test_mse = mse(&test.targets, &test_pred);
        info!(
            "{}: train R² {:.4}, test R² {:.4}, test MSE {:.6}",
            symbol, train_r2, test_r2, test_mse
        );

        let n_rows = matrix.nrows();
        let seed_window = matrix.slice(s![n_rows - seq_len.., ..]);
        let normalized = roll_out(&model, seed_window, close_col, days)?;
        let raw_prices = state
            .inverse_close(&normalized)
            .map_err(|e| ForecastError::Calibration(e.to_string()))?;

        let latest_close = frame
            .last_close()
            .ok_or_else(|| ForecastError::Calibration("no closing price".into()))?;
        let reference = resolve_reference(&self.provider, symbol, latest_close);
        let calibration = calibrate(raw_prices, reference)?;
        if calibration.calibrated {
            info!(
                "{}: calibration factor {:.4} against {} {:.2}",
                symbol,
                calibration.factor,
                reference.describe(),
                reference.value()
            );
        }

        let as_of = frame.dates().last().copied().ok_or_else(|| {
            ForecastError::DataUnavailable {
                symbol: symbol.to_string(),
            }
        })?;

        Ok(ForecastReport {
            symbol: symbol.to_string(),
            as_of,
            latest_close,
            raw_prices: calibration.raw_prices,
            calibrated_prices: calibration.calibrated_prices,
            calibration_factor: calibration.factor,
            reference: calibration.reference,
            calibrated: calibration.calibrated,
            train_r2,
            test_r2,
            test_mse,
            test_rmse: test_mse.sqrt(),
            train_windows: train.len(),
            test_windows: test.len(),
            training,
        })
    }
}
