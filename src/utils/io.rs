//! CSV and JSON persistence of price series and forecasts

use crate::data::{Candle, CsvProvider, PriceSeries};
use crate::forecast::ForecastReport;
use anyhow::Result;
use csv::Writer;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Writes `date,open,high,low,close,volume` rows, the format
/// [`CsvProvider`] reads
pub fn save_candles_csv<P: AsRef<Path>>(candles: &[Candle], path: P) -> Result<()> {
    let mut writer = Writer::from_path(path)?;
    for candle in candles {
        writer.serialize(candle)?;
    }
    writer.flush()?;
    Ok(())
}

/// Loads a CSV written by [`save_candles_csv`] into a cleaned series
pub fn load_candles_csv<P: AsRef<Path>>(symbol: &str, path: P) -> Result<PriceSeries> {
    let candles = CsvProvider::read_file(path)?;
    Ok(PriceSeries::new(symbol, candles))
}

/// Writes one `day,raw_price,calibrated_price` row per forecast day
pub fn save_forecast_csv<P: AsRef<Path>>(report: &ForecastReport, path: P) -> Result<()> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(["day", "raw_price", "calibrated_price"])?;
    for (day, raw, calibrated) in report.rows() {
        writer.write_record(&[
            day.to_string(),
            format!("{:.4}", raw),
            format!("{:.4}", calibrated),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_json<T: Serialize, P: AsRef<Path>>(data: &T, path: P) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, data)?;
    Ok(())
}

pub fn load_json<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> Result<T> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(file)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::ReferencePrice;
    use crate::model::TrainingReport;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn report() -> ForecastReport {
        ForecastReport {
            symbol: "TEST".into(),
            as_of: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            latest_close: 10.0,
            raw_prices: vec![9.0, 9.5],
            calibrated_prices: vec![10.0, 10.5556],
            calibration_factor: 10.0 / 9.0,
            reference: ReferencePrice::LatestClose(10.0),
            calibrated: true,
            train_r2: 0.9,
            test_r2: 0.5,
            test_mse: 0.01,
            test_rmse: 0.1,
            train_windows: 8,
            test_windows: 2,
            training: TrainingReport {
                train_losses: vec![0.2, 0.1],
                val_losses: vec![0.3, 0.2],
                best_epoch: 2,
                best_val_loss: 0.2,
                epochs_run: 2,
                stopped_early: false,
            },
        }
    }

    #[test]
    fn test_candles_csv_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("TEST.csv");
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let candles = vec![
            Candle::new(d, 1.0, 2.0, 0.5, 1.5, 100.0),
            Candle::new(d.succ_opt().unwrap(), 1.5, 2.5, 1.0, 2.0, 120.0),
        ];

        save_candles_csv(&candles, &path).unwrap();
        let series = load_candles_csv("TEST", &path).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.candles(), &candles[..]);
        assert_eq!(series.symbol(), "TEST");
    }

    #[test]
    fn test_forecast_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("forecast.csv");
        save_forecast_csv(&report(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "day,raw_price,calibrated_price");
        assert_eq!(lines[1], "1,9.0000,10.0000");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        save_json(&report(), &path).unwrap();

        let loaded: ForecastReport = load_json(&path).unwrap();
        assert_eq!(loaded.symbol, "TEST");
        assert_eq!(loaded.reference, ReferencePrice::LatestClose(10.0));
        assert_eq!(loaded.training.best_epoch, 2);
    }
}
