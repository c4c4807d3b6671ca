//! Rescaling of raw forecasts to the latest known market price

use super::error::ForecastError;
use crate::data::MarketDataProvider;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Price the forecast is anchored to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", content = "price", rename_all = "snake_case")]
pub enum ReferencePrice {
    /// Live quote from the market-data provider
    Live(f64),
    /// Last historical close, used when no usable live quote exists
    LatestClose(f64),
}

impl ReferencePrice {
    pub fn value(&self) -> f64 {
        match *self {
            ReferencePrice::Live(p) | ReferencePrice::LatestClose(p) => p,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, ReferencePrice::Live(_))
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ReferencePrice::Live(_) => "current market price",
            ReferencePrice::LatestClose(_) => "latest closing price",
        }
    }
}

fn usable(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Picks the live quote when it is a usable price, the latest close otherwise
pub fn choose_reference(live: Option<f64>, latest_close: f64) -> ReferencePrice {
    match live {
        Some(price) if usable(price) => ReferencePrice::Live(price),
        _ => ReferencePrice::LatestClose(latest_close),
    }
}

/// Looks up the live price for `symbol`. A failed lookup is logged and
/// recovered with the latest close; it never aborts the forecast.
pub fn resolve_reference<P: MarketDataProvider + ?Sized>(
    provider: &P,
    symbol: &str,
    latest_close: f64,
) -> ReferencePrice {
    let live = match provider.current_price(symbol) {
        Ok(price) => price,
        Err(e) => {
            warn!("Live price lookup for {} failed: {}", symbol, e);
            None
        }
    };

    let reference = choose_reference(live, latest_close);
    if reference.is_live() {
        info!("Calibrating {} with current market price {:.2}", symbol, reference.value());
    } else {
        warn!(
            "No usable live price for {} ({:?}); calibrating with latest close {:.2}",
            symbol, live, latest_close
        );
    }
    reference
}

/// Raw and calibrated forecast prices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub raw_prices: Vec<f64>,
    pub calibrated_prices: Vec<f64>,
    /// `reference / raw_prices[0]`, 1 when uncalibrated
    pub factor: f64,
    pub reference: ReferencePrice,
    /// False when the raw prices are passed through unscaled
    pub calibrated: bool,
}

/// Scales every raw price by `reference / raw_prices[0]`, so the first
/// calibrated price equals the reference.
///
/// A zero or non-finite first prediction, or an unusable reference, leaves
/// the raw prices unscaled with `calibrated == false`. Only an empty forecast
/// is an error.
pub fn calibrate(raw_prices: Vec<f64>, reference: ReferencePrice) -> Result<Calibration, ForecastError> {
    let first = *raw_prices
        .first()
        .ok_or_else(|| ForecastError::Calibration("no predicted prices".into()))?;

    if !first.is_finite() || first == 0.0 || !usable(reference.value()) {
        warn!(
            "Cannot calibrate (first prediction {}, reference {}); returning uncalibrated prices",
            first,
            reference.value()
        );
        return Ok(Calibration {
            calibrated_prices: raw_prices.clone(),
            raw_prices,
            factor: 1.0,
            reference,
            calibrated: false,
        });
    }

    let factor = reference.value() / first;
    let calibrated_prices = raw_prices.iter().map(|p| p * factor).collect();

    Ok(Calibration {
        raw_prices,
        calibrated_prices,
        factor,
        reference,
        calibrated: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataError, PriceSeries};
    use chrono::NaiveDate;

    struct LivePrice(Result<Option<f64>, ()>);

    impl MarketDataProvider for LivePrice {
        fn history(&self, symbol: &str, _: NaiveDate, _: NaiveDate) -> Result<PriceSeries, DataError> {
            Err(DataError::NoData(symbol.to_string()))
        }

        fn current_price(&self, _symbol: &str) -> Result<Option<f64>, DataError> {
            self.0
                .map_err(|_| DataError::Parse("quote unavailable".into()))
        }
    }

    #[test]
    fn test_first_calibrated_equals_reference() {
        let raw = vec![95.0, 97.0, 99.5];
        let result = calibrate(raw.clone(), ReferencePrice::Live(100.0)).unwrap();

        assert!((result.calibrated_prices[0] - 100.0).abs() < 1e-12);
        assert!((result.factor - 100.0 / 95.0).abs() < 1e-12);
        for (c, r) in result.calibrated_prices.iter().zip(raw.iter()) {
            assert!((c - r * result.factor).abs() < 1e-12);
        }
        assert_eq!(result.raw_prices, raw);
        assert!(result.calibrated);
    }

    #[test]
    fn test_nan_live_price_falls_back() {
        assert_eq!(choose_reference(Some(f64::NAN), 42.0), ReferencePrice::LatestClose(42.0));
        assert_eq!(choose_reference(None, 42.0), ReferencePrice::LatestClose(42.0));
        assert_eq!(choose_reference(Some(0.0), 42.0), ReferencePrice::LatestClose(42.0));
        assert_eq!(choose_reference(Some(43.5), 42.0), ReferencePrice::Live(43.5));
    }

    #[test]
    fn test_lookup_failure_falls_back() {
        let reference = resolve_reference(&LivePrice(Err(())), "X", 10.0);
        assert_eq!(reference, ReferencePrice::LatestClose(10.0));

        let reference = resolve_reference(&LivePrice(Ok(Some(f64::NAN))), "X", 10.0);
        assert_eq!(reference, ReferencePrice::LatestClose(10.0));

        let reference = resolve_reference(&LivePrice(Ok(Some(11.0))), "X", 10.0);
        assert_eq!(reference, ReferencePrice::Live(11.0));

        let result = calibrate(vec![5.0, 6.0], resolve_reference(&LivePrice(Err(())), "X", 10.0)).unwrap();
        assert_eq!(result.calibrated_prices, vec![10.0, 12.0]);
    }

    #[test]
    fn test_degenerate_first_prediction_passes_raw_through() {
        let result = calibrate(vec![0.0, 1.0], ReferencePrice::Live(10.0)).unwrap();
        assert!(!result.calibrated);
        assert_eq!(result.factor, 1.0);
        assert_eq!(result.calibrated_prices, vec![0.0, 1.0]);
        assert_eq!(result.raw_prices, vec![0.0, 1.0]);

        let result = calibrate(vec![f64::NAN, 2.0], ReferencePrice::Live(10.0)).unwrap();
        assert!(!result.calibrated);
        assert_eq!(result.calibrated_prices[1], 2.0);

        let result = calibrate(vec![4.0, 5.0], ReferencePrice::LatestClose(-1.0)).unwrap();
        assert!(!result.calibrated);
        assert_eq!(result.calibrated_prices, vec![4.0, 5.0]);

        assert!(matches!(
            calibrate(vec![], ReferencePrice::Live(10.0)),
            Err(ForecastError::Calibration(_))
        ));
    }
}
