//! Dispatch of [`AnalysisMode`] onto data, forecasting and sentiment

use super::views::{IndexSnapshot, SeriesSummary, TechnicalSummary};
use super::{AnalysisError, AnalysisMode, AnalysisOutput};
use crate::data::{DataError, Fundamentals, MarketDataProvider, PriceSeries};
use crate::forecast::Forecaster;
use crate::sentiment::{summarize, FinancialLexicon, NewsFeed, SentimentSummary};
use chrono::{Duration, Local, Months, NaiveDate};
use log::{info, warn};

/// Display name and ticker of the indices on the market overview
pub const MARKET_INDICES: [(&str, &str); 5] = [
    ("NIFTY", "^NSEI"),
    ("SENSEX", "^BSESN"),
    ("NIFTY BANK", "^NSEBANK"),
    ("Nikkei 225", "^N225"),
    ("Dow Jones", "^DJI"),
];

const TIME_SERIES_YEARS: u32 = 5;
const TECHNICAL_YEARS: u32 = 3;
const FIFTY_TWO_WEEKS_YEARS: u32 = 1;
/// Look-back that surely contains the latest session
const OVERVIEW_LOOKBACK_DAYS: i64 = 7;
const MAX_HEADLINES: usize = 10;

pub struct Dashboard<P> {
    forecaster: Forecaster<P>,
    news: Option<Box<dyn NewsFeed>>,
    lexicon: FinancialLexicon,
    today: Option<NaiveDate>,
}

impl<P: MarketDataProvider> Dashboard<P> {
    /// The forecaster's provider serves every view
    pub fn new(forecaster: Forecaster<P>) -> Self {
        Self {
            forecaster,
            news: None,
            lexicon: FinancialLexicon::new(),
            today: None,
        }
    }

    pub fn with_news_feed(mut self, feed: Box<dyn NewsFeed>) -> Self {
        self.news = Some(feed);
        self
    }

    /// Pins "today"; the forecaster keeps its own date setting
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn provider(&self) -> &P {
        self.forecaster.provider()
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    fn years_back(&self, years: u32) -> NaiveDate {
        let today = self.today();
        today
            .checked_sub_months(Months::new(12 * years))
            .unwrap_or(today)
    }

    pub fn run(&self, mode: &AnalysisMode) -> Result<AnalysisOutput, AnalysisError> {
        info!("Running {:?}", mode);
        match mode {
            AnalysisMode::MarketOverview => Ok(AnalysisOutput::MarketOverview(self.market_overview())),
            AnalysisMode::CurrentPrice { symbol } => Ok(AnalysisOutput::CurrentPrice {
                symbol: symbol.clone(),
                price: self.provider().current_price(symbol)?,
            }),
            AnalysisMode::PriceRange { symbol, start, end } => {
                let summary = self.summary(symbol, *start, *end)?;
                Ok(AnalysisOutput::Series(vec![summary]))
            }
            AnalysisMode::Comparison { symbols, start, end } => {
                if symbols.is_empty() {
                    return Err(AnalysisError::NoSymbols);
                }
                let summaries = symbols
                    .iter()
                    .map(|s| self.summary(s, *start, *end))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(AnalysisOutput::Series(summaries))
            }
            AnalysisMode::TimeSeries { symbol } => {
                let summary = self.summary(symbol, self.years_back(TIME_SERIES_YEARS), self.today())?;
                Ok(AnalysisOutput::Series(vec![summary]))
            }
            AnalysisMode::Technical { symbol } => {
                let series = self.history(symbol, self.years_back(TECHNICAL_YEARS), self.today())?;
                Ok(AnalysisOutput::Technical(TechnicalSummary::compute(&series)))
            }
            AnalysisMode::Prediction { symbol, days } => {
                let report = self.forecaster.forecast(symbol, *days)?;
                Ok(AnalysisOutput::Prediction(Box::new(report)))
            }
            AnalysisMode::Sentiment { symbol } => Ok(AnalysisOutput::Sentiment(self.sentiment(symbol)?)),
            AnalysisMode::Fundamentals { symbol } => Ok(AnalysisOutput::Fundamentals(self.fundamentals(symbol)?)),
        }
    }

    /// Headline sentiment shown under the price and prediction views. `None`
    /// for other views, without a news feed, or when the feed fails.
    pub fn follow_up_sentiment(&self, mode: &AnalysisMode) -> Option<SentimentSummary> {
        let symbol = match mode {
            AnalysisMode::CurrentPrice { symbol } | AnalysisMode::Prediction { symbol, .. } => symbol,
            _ => return None,
        };
        self.news.as_ref()?;
        match self.sentiment(symbol) {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!("News sentiment for {} unavailable: {}", symbol, e);
                None
            }
        }
    }

    /// Provider figures, with a missing 52-week range taken from one year of
    /// daily bars
    pub fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, AnalysisError> {
        let mut fundamentals = self
            .provider()
            .fundamentals(symbol)?
            .unwrap_or_else(|| Fundamentals::new(symbol));

        if fundamentals.fifty_two_week_high.is_none() || fundamentals.fifty_two_week_low.is_none() {
            let series = self.history(symbol, self.years_back(FIFTY_TWO_WEEKS_YEARS), self.today())?;
            let high = series.candles().iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
            let low = series.candles().iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
            fundamentals.fifty_two_week_high.get_or_insert(high);
            fundamentals.fifty_two_week_low.get_or_insert(low);
        }
        Ok(fundamentals)
    }

    /// Indices whose data could not be fetched are logged and left out
    pub fn market_overview(&self) -> Vec<IndexSnapshot> {
        let end = self.today();
        let start = end - Duration::days(OVERVIEW_LOOKBACK_DAYS);

        MARKET_INDICES
            .iter()
            .filter_map(|&(name, symbol)| match self.provider().history(symbol, start, end) {
                Ok(series) => series
                    .last()
                    .map(|candle| IndexSnapshot::from_candle(name, symbol, candle)),
                Err(e) => {
                    warn!("Error fetching data for {}: {}", name, e);
                    None
                }
            })
            .collect()
    }

    pub fn sentiment(&self, symbol: &str) -> Result<SentimentSummary, AnalysisError> {
        let feed = self.news.as_ref().ok_or(AnalysisError::NoNewsFeed)?;
        let headlines = feed.headlines(symbol, MAX_HEADLINES)?;
        Ok(summarize(symbol, headlines, &self.lexicon))
    }

    fn history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries, AnalysisError> {
        if start > end {
            return Err(AnalysisError::InvalidRange { start, end });
        }
        let series = self.provider().history(symbol, start, end)?;
        if series.is_empty() {
            return Err(DataError::NoData(symbol.to_string()).into());
        }
        Ok(series)
    }

    fn summary(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<SeriesSummary, AnalysisError> {
        let series = self.history(symbol, start, end)?;
        SeriesSummary::from_series(series).ok_or_else(|| DataError::NoData(symbol.to_string()).into())
    }
}
