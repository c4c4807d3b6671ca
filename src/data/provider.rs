//! Market data provider abstraction

use super::types::{DataError, Fundamentals, PriceSeries};
use chrono::NaiveDate;

/// Source of daily history and live quotes.
///
/// Implementations must return `DataError::NoData` when the request succeeded
/// but produced no rows, so callers can tell "nothing there" from a broken
/// transport.
pub trait MarketDataProvider {
    /// Daily bars for `symbol` with dates in `[start, end]`, ascending.
    fn history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError>;

    /// Last traded price, `None` when the venue does not report one.
    fn current_price(&self, symbol: &str) -> Result<Option<f64>, DataError>;

    /// Valuation figures; `None` for sources that carry none.
    fn fundamentals(&self, _symbol: &str) -> Result<Option<Fundamentals>, DataError> {
        Ok(None)
    }
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for &P {
    fn history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        (**self).history(symbol, start, end)
    }

    fn current_price(&self, symbol: &str) -> Result<Option<f64>, DataError> {
        (**self).current_price(symbol)
    }

    fn fundamentals(&self, symbol: &str) -> Result<Option<Fundamentals>, DataError> {
        (**self).fundamentals(symbol)
    }
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for Box<P> {
    fn history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        (**self).history(symbol, start, end)
    }

    fn current_price(&self, symbol: &str) -> Result<Option<f64>, DataError> {
        (**self).current_price(symbol)
    }

    fn fundamentals(&self, symbol: &str) -> Result<Option<Fundamentals>, DataError> {
        (**self).fundamentals(symbol)
    }
}
