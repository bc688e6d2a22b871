//! Exchange rate sourcing: cache-aside over the quote provider.
//!
//! The cached entry records where the rate came from. Manual overrides
//! never expire; rates fetched from the quote source are refetched once
//! they are older than the configured TTL. When nothing usable is cached
//! and the fetch fails, the caller's fallback rate is returned.

use crate::core::cache::Cache;
use crate::core::currency::CurrencyRateProvider;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const RATE_CACHE_KEY: &str = "exchange_rate";
pub const DEFAULT_RATE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    Api,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedRate {
    pub rate: Decimal,
    pub timestamp: DateTime<Utc>,
    pub source: RateSource,
}

impl CachedRate {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match self.source {
            RateSource::Manual => true,
            RateSource::Api => match (now - self.timestamp).to_std() {
                Ok(age) => age < ttl,
                // timestamp ahead of the local clock
                Err(_) => true,
            },
        }
    }
}

pub struct ExchangeRateService {
    provider: Arc<dyn CurrencyRateProvider>,
    cache: Arc<dyn Cache<CachedRate>>,
    ttl: Duration,
}

impl ExchangeRateService {
    pub fn new(provider: Arc<dyn CurrencyRateProvider>, cache: Arc<dyn Cache<CachedRate>>) -> Self {
        Self {
            provider,
            cache,
            ttl: DEFAULT_RATE_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// The entry currently held in the cache, fresh or not.
    pub async fn cached(&self) -> Option<CachedRate> {
        self.cache.get(RATE_CACHE_KEY).await
    }

    /// Returns the rate to convert with, never failing.
    pub async fn get_rate(&self, fallback: Decimal) -> Decimal {
        if let Some(entry) = self.cache.get(RATE_CACHE_KEY).await {
            if entry.rate > Decimal::ZERO && entry.is_fresh(Utc::now(), self.ttl) {
                debug!(rate = %entry.rate, source = ?entry.source, "Using cached exchange rate");
                return entry.rate;
            }
            debug!(source = ?entry.source, "Cached exchange rate is stale");
        }

        match self.provider.fetch_quote().await {
            Ok(quote) if quote.sell > Decimal::ZERO => {
                let entry = CachedRate {
                    rate: quote.sell,
                    timestamp: Utc::now(),
                    source: RateSource::Api,
                };
                self.cache.put(RATE_CACHE_KEY, entry, Some(self.ttl)).await;
                info!(rate = %quote.sell, as_of = %quote.as_of, "Fetched exchange rate");
                quote.sell
            }
            Ok(quote) => {
                warn!(sell = %quote.sell, %fallback, "Quote has no usable sell price, using fallback");
                fallback
            }
            Err(e) => {
                warn!(error = %e, %fallback, "Exchange rate fetch failed, using fallback");
                fallback
            }
        }
    }

    /// Pins the rate until cleared. Returns false for a non-positive rate.
    pub async fn set_manual_rate(&self, rate: Decimal) -> bool {
        if rate <= Decimal::ZERO {
            warn!(%rate, "Refusing non-positive manual exchange rate");
            return false;
        }
        let entry = CachedRate {
            rate,
            timestamp: Utc::now(),
            source: RateSource::Manual,
        };
        self.cache.put(RATE_CACHE_KEY, entry, None).await;
        info!(%rate, "Manual exchange rate set");
        true
    }

    /// Drops whatever is cached so the next read goes to the quote source.
    pub async fn clear_rate(&self) {
        self.cache.remove(RATE_CACHE_KEY).await;
        info!("Exchange rate cache cleared");
    }
}
