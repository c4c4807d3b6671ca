//! # Forecasting
//!
//! One call trains a fresh model on the symbol's recent history, rolls it
//! forward day by day and anchors the result to the latest known price.
//!
//! ```rust,no_run
//! use equity_forecast::data::YahooClient;
//! use equity_forecast::forecast::Forecaster;
//!
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let forecaster = Forecaster::new(YahooClient::new()?);
//! match forecaster.forecast("AAPL", 10) {
//!     Ok(report) => {
//!         for (day, raw, calibrated) in report.rows() {
//!             println!("{:>3} {:>10.2} {:>10.2}", day, raw, calibrated);
//!         }
//!     }
//!     Err(e) => eprintln!("{}", e.user_message()),
//! }
//! # Ok(())
//! # }
//! ```

mod calibration;
mod error;
mod pipeline;
mod rollout;

pub use calibration::{calibrate, choose_reference, resolve_reference, Calibration, ReferencePrice};
pub use error::ForecastError;
pub use pipeline::{ForecastConfig, ForecastReport, Forecaster, ScalerFit};
pub use rollout::{roll_out, Rollout, WindowPredictor};
