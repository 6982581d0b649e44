//! Freshness cache for fetched series.
//!
//! Entries are keyed by (symbol, start, end, interval) and expire after the
//! configured TTL; the store is bounded by `max_entries`. Errors are never
//! cached, and a hit never reaches the layers below (quota included).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use btcm7_core::connector::{Btcm7Connector, SeriesProvider};
use btcm7_core::{Btcm7Error, Middleware, RawSeries, SeriesRequest, Ticker};
use btcm7_types::CacheConfig;
use moka::future::Cache;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SeriesKey {
    symbol: String,
    req: SeriesRequest,
}

impl SeriesKey {
    fn new(ticker: &Ticker, req: &SeriesRequest) -> Self {
        Self {
            symbol: ticker.symbol().to_string(),
            req: *req,
        }
    }
}

/// Connector wrapper that serves repeated fetches from memory.
pub struct CachingConnector {
    inner: Arc<dyn Btcm7Connector>,
    store: Option<Cache<SeriesKey, Arc<RawSeries>>>,
}

impl CachingConnector {
    /// Wrap `inner`; a zero TTL or zero capacity disables caching.
    pub fn new(inner: Arc<dyn Btcm7Connector>, cfg: &CacheConfig) -> Self {
        let store = (cfg.ttl_ms > 0 && cfg.max_entries > 0).then(|| {
            Cache::builder()
                .max_capacity(cfg.max_entries)
                .time_to_live(Duration::from_millis(cfg.ttl_ms))
                .build()
        });
        Self { inner, store }
    }

    /// Access the inner connector.
    pub fn inner(&self) -> &Arc<dyn Btcm7Connector> {
        &self.inner
    }

    /// Drop every cached series.
    pub fn invalidate_all(&self) {
        if let Some(store) = &self.store {
            store.invalidate_all();
        }
    }
}

#[async_trait]
impl Btcm7Connector for CachingConnector {
    btcm7_core::btcm7_connector_delegate!(inner);
}

#[async_trait]
impl SeriesProvider for CachingConnector {
    async fn series(&self, ticker: &Ticker, req: &SeriesRequest) -> Result<RawSeries, Btcm7Error> {
        let inner = self
            .inner
            .as_series_provider()
            .ok_or_else(|| Btcm7Error::unavailable(self.inner.name(), "series not supported"))?;
        let Some(store) = &self.store else {
            return inner.series(ticker, req).await;
        };

        let key = SeriesKey::new(ticker, req);
        if let Some(hit) = store.get(&key).await {
            #[cfg(feature = "tracing")]
            tracing::debug!(symbol = ticker.symbol(), "series cache hit");
            return Ok(RawSeries::clone(&hit));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(symbol = ticker.symbol(), "series cache miss");
        let fresh = inner.series(ticker, req).await?;
        store.insert(key, Arc::new(fresh.clone())).await;
        Ok(fresh)
    }
}

/// Middleware config for constructing a [`CachingConnector`].
pub struct CacheMiddleware {
    /// Freshness window and capacity.
    pub config: CacheConfig,
}

impl CacheMiddleware {
    /// Create a middleware from a cache configuration.
    #[must_use]
    pub const fn new(config: CacheConfig) -> Self {
        Self { config }
    }
}

impl Middleware for CacheMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn Btcm7Connector>) -> Arc<dyn Btcm7Connector> {
        Arc::new(CachingConnector::new(inner, &self.config))
    }

    fn name(&self) -> &'static str {
        "CachingConnector"
    }

    fn config_json(&self) -> serde_json::Value {
        serde_json::json!({
            "ttl_ms": self.config.ttl_ms,
            "max_entries": self.config.max_entries,
        })
    }
}
