//! # Dashboard views
//!
//! Every view the dashboard offers is one [`AnalysisMode`] variant; the
//! caller picks a mode and [`Dashboard::run`] returns the matching
//! [`AnalysisOutput`].

mod dashboard;
mod views;

use crate::data::{DataError, Fundamentals};
use crate::forecast::ForecastError;
use chrono::NaiveDate;
use thiserror::Error;

pub use dashboard::{Dashboard, MARKET_INDICES};
pub use views::{IndexSnapshot, SeriesSummary, TechnicalSnapshot, TechnicalSummary};

use crate::forecast::ForecastReport;
use crate::sentiment::SentimentSummary;

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisMode {
    /// Latest session of the major indices
    MarketOverview,
    CurrentPrice { symbol: String },
    PriceRange { symbol: String, start: NaiveDate, end: NaiveDate },
    Comparison { symbols: Vec<String>, start: NaiveDate, end: NaiveDate },
    /// Five years of daily closes
    TimeSeries { symbol: String },
    /// SMA 50/200, RSI 14 and MACD histogram over three years
    Technical { symbol: String },
    Prediction { symbol: String, days: usize },
    Sentiment { symbol: String },
    /// Market cap, P/E, dividend yield, EPS and the 52-week range
    Fundamentals { symbol: String },
}

#[derive(Debug, Clone)]
pub enum AnalysisOutput {
    MarketOverview(Vec<IndexSnapshot>),
    CurrentPrice { symbol: String, price: Option<f64> },
    Series(Vec<SeriesSummary>),
    Technical(TechnicalSummary),
    Prediction(Box<ForecastReport>),
    Sentiment(SentimentSummary),
    Fundamentals(Fundamentals),
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error(transparent)]
    News(#[from] anyhow::Error),

    #[error("no news feed configured")]
    NoNewsFeed,

    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("no symbols selected")]
    NoSymbols,
}

impl AnalysisError {
    /// Text shown to the user
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::Forecast(e) => e.user_message(),
            AnalysisError::Data(DataError::NoData(symbol)) => {
                format!("No data available for {}.", symbol)
            }
            other => other.to_string(),
        }
    }
}
