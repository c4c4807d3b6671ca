//! Time-boxed cache in front of a market data provider

use super::provider::MarketDataProvider;
use super::types::{DataError, Fundamentals, PriceSeries};
use chrono::NaiveDate;
use log::debug;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    symbol: String,
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Debug)]
struct CacheEntry {
    fetched_at: Instant,
    series: PriceSeries,
}

/// Caches `history` results per `(symbol, start, end)` for `ttl`.
///
/// Live prices always go to the inner provider. Failed fetches are not cached.
#[derive(Debug)]
pub struct CachedProvider<P> {
    inner: P,
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl<P: MarketDataProvider> CachedProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of live (unexpired) entries
    pub fn len(&self) -> usize {
        let ttl = self.ttl;
        self.entries()
            .values()
            .filter(|e| e.fetched_at.elapsed() < ttl)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached range for `symbol`
    pub fn invalidate(&self, symbol: &str) {
        self.entries().retain(|key, _| key.symbol != symbol);
    }

    pub fn clear(&self) {
        self.entries().clear();
    }
}

impl<P: MarketDataProvider> MarketDataProvider for CachedProvider<P> {
    fn history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        let key = CacheKey {
            symbol: symbol.to_string(),
            start,
            end,
        };

        {
            let mut entries = self.entries();
            match entries.get(&key) {
                Some(entry) if entry.fetched_at.elapsed() < self.ttl => {
                    debug!("Cache hit for {} ({} .. {})", symbol, start, end);
                    return Ok(entry.series.clone());
                }
                Some(_) => {
                    entries.remove(&key);
                }
                None => {}
            }
        }

        // lock is released while the inner provider does I/O
        let series = self.inner.history(symbol, start, end)?;
        let ttl = self.ttl;
        let mut entries = self.entries();
        // every expired range goes, not only this key
        entries.retain(|_, e| e.fetched_at.elapsed() < ttl);
        entries.insert(
            key,
            CacheEntry {
                fetched_at: Instant::now(),
                series: series.clone(),
            },
        );
        Ok(series)
    }

    fn current_price(&self, symbol: &str) -> Result<Option<f64>, DataError> {
        self.inner.current_price(symbol)
    }

    fn fundamentals(&self, symbol: &str) -> Result<Option<Fundamentals>, DataError> {
        self.inner.fundamentals(symbol)
    }
}
