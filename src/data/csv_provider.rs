//! Offline provider backed by per-symbol CSV files

use super::provider::MarketDataProvider;
use super::types::{Candle, DataError, PriceSeries};
use chrono::NaiveDate;
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Reads `<dir>/<SYMBOL>.csv` files with a `date,open,high,low,close,volume`
/// header. Live prices come from an optional fixed table; symbols missing from
/// it report no live price.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
    live_prices: HashMap<String, f64>,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            live_prices: HashMap::new(),
        }
    }

    /// Registers a fixed live price for `symbol`
    pub fn with_live_price(mut self, symbol: &str, price: f64) -> Self {
        self.live_prices.insert(symbol.to_string(), price);
        self
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol))
    }

    /// Parses one CSV file into bars, in file order
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<Candle>, DataError> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut candles = Vec::new();
        for record in reader.deserialize() {
            let candle: Candle = record?;
            candles.push(candle);
        }
        Ok(candles)
    }
}

impl MarketDataProvider for CsvProvider {
    fn history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::NoData(symbol.to_string()));
        }
        debug!("Reading {}", path.display());

        let series = PriceSeries::new(symbol, Self::read_file(&path)?).between(start, end);
        if series.is_empty() {
            return Err(DataError::NoData(symbol.to_string()));
        }
        Ok(series)
    }

    fn current_price(&self, symbol: &str) -> Result<Option<f64>, DataError> {
        Ok(self.live_prices.get(symbol).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_fixture(dir: &TempDir) {
        let mut file = std::fs::File::create(dir.path().join("ACME.csv")).unwrap();
        writeln!(file, "date,open,high,low,close,volume").unwrap();
        writeln!(file, "2024-01-03,11,12,10,11.5,1000").unwrap();
        writeln!(file, "2024-01-02,10,11,9,10.5,1200").unwrap();
        writeln!(file, "2024-01-04,12,13,11,12.5,900").unwrap();
    }

    #[test]
    fn test_history_sorted_and_bounded() {
        let dir = TempDir::new().unwrap();
        write_fixture(&dir);
        let provider = CsvProvider::new(dir.path());

        let series = provider
            .history(
                "ACME",
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            )
            .unwrap();

        assert_eq!(series.closes(), vec![10.5, 11.5]);
    }

    #[test]
    fn test_missing_symbol_is_no_data() {
        let dir = TempDir::new().unwrap();
        let provider = CsvProvider::new(dir.path());
        let err = provider
            .history(
                "NONE",
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            )
            .unwrap_err();
        assert!(err.is_no_data());
    }

    #[test]
    fn test_live_price_table() {
        let provider = CsvProvider::new("unused").with_live_price("ACME", 42.0);
        assert_eq!(provider.current_price("ACME").unwrap(), Some(42.0));
        assert_eq!(provider.current_price("OTHER").unwrap(), None);
    }
}
