//! Blocking client for the Yahoo Finance chart API
//!
//! Daily bars come from `/v8/finance/chart/{symbol}` with a
//! `period1`/`period2` range; the live price is the chart's
//! `meta.regularMarketPrice`. Fundamentals come from
//! `/v10/finance/quoteSummary/{symbol}`, falling back to the 52-week range
//! in the chart metadata when that endpoint refuses the request.

use super::provider::MarketDataProvider;
use super::types::{Candle, DataError, Fundamentals, PriceSeries, Quote};
use chrono::{DateTime, Duration, NaiveDate};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Base URL of the Yahoo Finance API
const YAHOO_API_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    currency: Option<String>,
    regular_market_price: Option<f64>,
    fifty_two_week_high: Option<f64>,
    fifty_two_week_low: Option<f64>,
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryBody {
    result: Option<Vec<QuoteSummaryData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryData {
    #[serde(default)]
    summary_detail: SummaryDetail,
    #[serde(default)]
    default_key_statistics: KeyStatistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    currency: Option<String>,
    #[serde(default)]
    market_cap: RawValue,
    #[serde(default, rename = "trailingPE")]
    trailing_pe: RawValue,
    #[serde(default)]
    dividend_yield: RawValue,
    #[serde(default)]
    fifty_two_week_high: RawValue,
    #[serde(default)]
    fifty_two_week_low: RawValue,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    #[serde(default)]
    trailing_eps: RawValue,
}

/// `{"raw": 1.5, "fmt": "1.50"}`; an empty object when Yahoo has no figure
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

/// Yahoo Finance client
#[derive(Debug, Clone)]
pub struct YahooClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooClient {
    /// Creates a client against the public endpoint
    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url(YAHOO_API_URL)
    }

    /// Creates a client against a custom endpoint, e.g. a local mock
    pub fn with_base_url(base_url: &str) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0")
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let period1 = start.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp()).unwrap_or(0);
        // period2 is exclusive
        let period2 = (end + Duration::days(1))
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(period1);
        format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d",
            self.base_url, symbol, period1, period2
        )
    }

    /// Error bodies are JSON too, so the status only matters when the body
    /// does not parse.
    fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, DataError> {
        debug!("Yahoo request: {}", url);

        let response = self.client.get(url).send()?;
        let status = response.status();
        let body = response.text()?;

        match serde_json::from_str(&body) {
            Ok(parsed) => Ok(parsed),
            Err(e) if status.is_success() => Err(e.into()),
            Err(_) => Err(DataError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }),
        }
    }

    fn fetch_chart(&self, url: &str, symbol: &str) -> Result<ChartData, DataError> {
        parse_chart(self.fetch_json(url)?, symbol)
    }

    /// Daily bars for `symbol` between `start` and `end` inclusive
    pub fn get_daily(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        let url = self.chart_url(symbol, start, end);
        let chart = self.fetch_chart(&url, symbol)?;
        let series = PriceSeries::new(symbol, chart_candles(&chart)).between(start, end);

        if series.is_empty() {
            return Err(DataError::NoData(symbol.to_string()));
        }

        info!(
            "Fetched {} daily bars for {} ({} .. {})",
            series.len(),
            symbol,
            start,
            end
        );
        Ok(series)
    }

    /// Latest quote from the chart metadata
    pub fn get_quote(&self, symbol: &str) -> Result<Quote, DataError> {
        let url = format!("{}/v8/finance/chart/{}?range=1d&interval=1d", self.base_url, symbol);
        let chart = self.fetch_chart(&url, symbol)?;
        Ok(Quote {
            symbol: symbol.to_string(),
            price: chart.meta.regular_market_price,
            currency: chart.meta.currency,
        })
    }

    /// Valuation figures from `quoteSummary`. When that endpoint fails for any
    /// reason other than an unknown symbol, only the currency and the 52-week
    /// range from the chart metadata are returned.
    pub fn get_fundamentals(&self, symbol: &str) -> Result<Fundamentals, DataError> {
        let url = format!(
            "{}/v10/finance/quoteSummary/{}?modules=summaryDetail,defaultKeyStatistics",
            self.base_url, symbol
        );
        match self
            .fetch_json(&url)
            .and_then(|response: QuoteSummaryResponse| parse_quote_summary(response, symbol))
        {
            Ok(fundamentals) => Ok(fundamentals),
            Err(e) if e.is_no_data() => Err(e),
            Err(e) => {
                warn!("quoteSummary unavailable for {} ({}), using chart metadata", symbol, e);
                let url = format!("{}/v8/finance/chart/{}?range=1d&interval=1d", self.base_url, symbol);
                let chart = self.fetch_chart(&url, symbol)?;
                Ok(Fundamentals {
                    currency: chart.meta.currency,
                    fifty_two_week_high: chart.meta.fifty_two_week_high,
                    fifty_two_week_low: chart.meta.fifty_two_week_low,
                    ..Fundamentals::new(symbol)
                })
            }
        }
    }
}

impl MarketDataProvider for YahooClient {
    fn history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        self.get_daily(symbol, start, end)
    }

    fn current_price(&self, symbol: &str) -> Result<Option<f64>, DataError> {
        Ok(self.get_quote(symbol)?.price)
    }

    fn fundamentals(&self, symbol: &str) -> Result<Option<Fundamentals>, DataError> {
        self.get_fundamentals(symbol).map(Some)
    }
}

fn parse_chart(response: ChartResponse, symbol: &str) -> Result<ChartData, DataError> {
    if let Some(error) = response.chart.error {
        if error.code.eq_ignore_ascii_case("Not Found") {
            return Err(DataError::NoData(symbol.to_string()));
        }
        return Err(DataError::Api {
            code: error.code,
            message: error.description,
        });
    }

    response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| DataError::NoData(symbol.to_string()))
}

fn parse_quote_summary(response: QuoteSummaryResponse, symbol: &str) -> Result<Fundamentals, DataError> {
    if let Some(error) = response.quote_summary.error {
        if error.code.eq_ignore_ascii_case("Not Found") {
            return Err(DataError::NoData(symbol.to_string()));
        }
        return Err(DataError::Api {
            code: error.code,
            message: error.description,
        });
    }

    let data = response
        .quote_summary
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| DataError::NoData(symbol.to_string()))?;
    let detail = data.summary_detail;

    Ok(Fundamentals {
        symbol: symbol.to_string(),
        currency: detail.currency,
        market_cap: detail.market_cap.raw,
        pe_ratio: detail.trailing_pe.raw,
        dividend_yield: detail.dividend_yield.raw,
        eps: data.default_key_statistics.trailing_eps.raw,
        fifty_two_week_high: detail.fifty_two_week_high.raw,
        fifty_two_week_low: detail.fifty_two_week_low.raw,
    })
}

/// Converts the column-oriented quote block into bars, skipping any row with a
/// missing field. Dates are taken in the exchange's local time.
fn chart_candles(chart: &ChartData) -> Vec<Candle> {
    let empty = QuoteData::default();
    let quote = chart.indicators.quote.first().unwrap_or(&empty);
    fn field(column: &[Option<f64>], i: usize) -> Option<f64> {
        column.get(i).copied().flatten()
    }

    chart
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let date = DateTime::from_timestamp(ts + chart.meta.gmtoffset, 0)?.date_naive();
            Some(Candle::new(
                date,
                field(&quote.open, i)?,
                field(&quote.high, i)?,
                field(&quote.low, i)?,
                field(&quote.close, i)?,
                field(&quote.volume, i)?,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"currency": "USD", "regularMarketPrice": 187.5, "gmtoffset": -14400},
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {"quote": [{
                    "open":   [185.0, 184.2, null],
                    "high":   [188.4, 185.9, 183.1],
                    "low":    [183.9, 183.4, 180.9],
                    "close":  [185.6, 184.3, 181.9],
                    "volume": [82488700, 58414500, 71983600]
                }]}
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_chart_skips_incomplete_rows() {
        let response: ChartResponse = serde_json::from_str(SAMPLE).unwrap();
        let chart = parse_chart(response, "AAPL").unwrap();
        let candles = chart_candles(&chart);

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(candles[1].close, 184.3);
        assert_eq!(chart.meta.regular_market_price, Some(187.5));
    }

    #[test]
    fn test_not_found_is_no_data() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        let response: ChartResponse = serde_json::from_str(body).unwrap();
        let err = parse_chart(response, "NOPE").unwrap_err();
        assert!(err.is_no_data());
    }

    #[test]
    fn test_other_api_error() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Bad Request", "description": "Invalid input"}}}"#;
        let response: ChartResponse = serde_json::from_str(body).unwrap();
        let err = parse_chart(response, "X").unwrap_err();
        assert!(matches!(err, DataError::Api { .. }));
    }

    #[test]
    fn test_parse_quote_summary() {
        let body = r#"{
            "quoteSummary": {
                "result": [{
                    "summaryDetail": {
                        "currency": "INR",
                        "marketCap": {"raw": 13850000000000, "fmt": "13.85T"},
                        "trailingPE": {"raw": 30.4, "fmt": "30.40"},
                        "dividendYield": {},
                        "fiftyTwoWeekHigh": {"raw": 4254.45, "fmt": "4,254.45"},
                        "fiftyTwoWeekLow": {"raw": 3311.0, "fmt": "3,311.00"}
                    },
                    "defaultKeyStatistics": {"trailingEps": {"raw": 125.9, "fmt": "125.90"}}
                }],
                "error": null
            }
        }"#;
        let response: QuoteSummaryResponse = serde_json::from_str(body).unwrap();
        let fundamentals = parse_quote_summary(response, "TCS.NS").unwrap();

        assert_eq!(fundamentals.symbol, "TCS.NS");
        assert_eq!(fundamentals.currency.as_deref(), Some("INR"));
        assert_eq!(fundamentals.market_cap, Some(13_850_000_000_000.0));
        assert_eq!(fundamentals.pe_ratio, Some(30.4));
        assert_eq!(fundamentals.dividend_yield, None);
        assert_eq!(fundamentals.eps, Some(125.9));
        assert_eq!(fundamentals.fifty_two_week_high, Some(4254.45));
        assert_eq!(fundamentals.fifty_two_week_low, Some(3311.0));
    }

    #[test]
    fn test_quote_summary_errors() {
        let body = r#"{"quoteSummary": {"result": null, "error": {"code": "Not Found", "description": "Quote not found for ticker symbol: NOPE"}}}"#;
        let response: QuoteSummaryResponse = serde_json::from_str(body).unwrap();
        assert!(parse_quote_summary(response, "NOPE").unwrap_err().is_no_data());

        let body = r#"{"quoteSummary": {"result": null, "error": {"code": "Unauthorized", "description": "Invalid Crumb"}}}"#;
        let response: QuoteSummaryResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(
            parse_quote_summary(response, "TCS.NS"),
            Err(DataError::Api { .. })
        ));
    }

    #[test]
    fn test_chart_meta_week_range() {
        let body = r#"{"chart": {"result": [{
            "meta": {"currency": "INR", "regularMarketPrice": 3900.0, "fiftyTwoWeekHigh": 4254.45, "fiftyTwoWeekLow": 3311.0},
            "indicators": {"quote": [{}]}
        }], "error": null}}"#;
        let response: ChartResponse = serde_json::from_str(body).unwrap();
        let chart = parse_chart(response, "TCS.NS").unwrap();
        assert_eq!(chart.meta.fifty_two_week_high, Some(4254.45));
        assert_eq!(chart.meta.fifty_two_week_low, Some(3311.0));
        assert!(chart_candles(&chart).is_empty());
    }

    #[test]
    fn test_chart_url_range() {
        let client = YahooClient::with_base_url("http://localhost:9999/").unwrap();
        let url = client.chart_url(
            "TCS.NS",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        );
        assert_eq!(
            url,
            "http://localhost:9999/v8/finance/chart/TCS.NS?period1=1704067200&period2=1704240000&interval=1d"
        );
    }

    #[test]
    #[ignore] // requires network access
    fn test_fetch_live() {
        let client = YahooClient::new().unwrap();
        let end = chrono::Utc::now().date_naive();
        let series = client.get_daily("AAPL", end - Duration::days(30), end).unwrap();
        assert!(!series.is_empty());
    }
}
