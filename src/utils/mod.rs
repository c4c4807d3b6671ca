//! Metrics, file I/O and logging helpers

pub mod io;
pub mod logging;
pub mod metrics;

pub use io::{load_candles_csv, load_json, save_candles_csv, save_forecast_csv, save_json};
pub use logging::init_logging;
pub use metrics::{mae, mse, r2_score, rmse};
