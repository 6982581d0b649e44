//! Quota-aware connector wrapper.
//!
//! Keeps calls under the provider's requests-per-window budget. A call that
//! would exceed the budget is refused locally with
//! [`Btcm7Error::ProviderRateLimited`] carrying the time until the budget
//! frees up, so the retry layer can wait instead of burning a provider call.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use btcm7_core::connector::{Btcm7Connector, SeriesProvider};
use btcm7_core::{Btcm7Error, Middleware, RawSeries, SeriesRequest, Ticker};
use btcm7_types::{QuotaConfig, QuotaConsumptionStrategy};
use tokio::time::Instant;

/// Wrapper that enforces a request budget.
pub struct QuotaAwareConnector {
    inner: Arc<dyn Btcm7Connector>,
    config: QuotaConfig,
    runtime: Mutex<QuotaRuntime>,
}

struct QuotaRuntime {
    calls_made_in_window: u64,
    window_start: Instant,
    // EvenSpread only: earliest instant the next call may start.
    next_slot: Option<Instant>,
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl QuotaAwareConnector {
    /// Create a new quota-aware wrapper around an existing connector.
    pub fn new(inner: Arc<dyn Btcm7Connector>, config: QuotaConfig) -> Self {
        Self {
            inner,
            config,
            runtime: Mutex::new(QuotaRuntime {
                calls_made_in_window: 0,
                window_start: Instant::now(),
                next_slot: None,
            }),
        }
    }

    /// Access the inner connector.
    pub fn inner(&self) -> &Arc<dyn Btcm7Connector> {
        &self.inner
    }

    /// Minimum spacing between calls under [`QuotaConsumptionStrategy::EvenSpread`].
    fn spacing(&self) -> Duration {
        let limit = u32::try_from(self.config.limit.max(1)).unwrap_or(u32::MAX);
        self.config.window / limit
    }

    /// Consume one unit of budget if available.
    ///
    /// # Errors
    /// Returns `Btcm7Error::ProviderRateLimited` with `retry_after_ms` set to
    /// the time until the window resets (or, for `EvenSpread`, until the next
    /// slot opens).
    pub fn should_allow_call(&self) -> Result<(), Btcm7Error> {
        let mut rt = self
            .runtime
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let window = self.config.window;

        let elapsed = now.duration_since(rt.window_start);
        if !window.is_zero() && elapsed >= window {
            rt.calls_made_in_window = 0;
            // Keep windows aligned to regular boundaries across idle gaps.
            let windows_passed = elapsed.as_nanos() / window.as_nanos();
            let offset = Duration::from_nanos(
                (windows_passed * window.as_nanos())
                    .try_into()
                    .unwrap_or(u64::MAX),
            );
            rt.window_start += offset;
        }

        if rt.calls_made_in_window >= self.config.limit {
            let reset_in = window.saturating_sub(now.duration_since(rt.window_start));
            drop(rt);
            return Err(Btcm7Error::rate_limited(
                self.inner.name(),
                Some(millis(reset_in)),
            ));
        }

        if matches!(self.config.strategy, QuotaConsumptionStrategy::EvenSpread) {
            if let Some(slot) = rt.next_slot {
                if now < slot {
                    let wait = slot - now;
                    drop(rt);
                    return Err(Btcm7Error::rate_limited(self.inner.name(), Some(millis(wait))));
                }
            }
            rt.next_slot = Some(now + self.spacing());
        }

        rt.calls_made_in_window += 1;
        Ok(())
    }
}

#[async_trait]
impl Btcm7Connector for QuotaAwareConnector {
    btcm7_core::btcm7_connector_delegate!(inner);
}

#[async_trait]
impl SeriesProvider for QuotaAwareConnector {
    async fn series(&self, ticker: &Ticker, req: &SeriesRequest) -> Result<RawSeries, Btcm7Error> {
        let inner = self
            .inner
            .as_series_provider()
            .ok_or_else(|| Btcm7Error::unavailable(self.inner.name(), "series not supported"))?;
        if let Err(e) = self.should_allow_call() {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                connector = self.inner.name(),
                symbol = ticker.symbol(),
                retry_after_ms = ?e.retry_after_ms(),
                "local quota exhausted"
            );
            return Err(e);
        }
        inner.series(ticker, req).await
    }
}

/// Middleware config for constructing a [`QuotaAwareConnector`].
pub struct QuotaMiddleware {
    /// Budget applied by the wrapper.
    pub config: QuotaConfig,
}

impl QuotaMiddleware {
    /// Create a middleware from a quota configuration.
    #[must_use]
    pub const fn new(config: QuotaConfig) -> Self {
        Self { config }
    }
}

impl Middleware for QuotaMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn Btcm7Connector>) -> Arc<dyn Btcm7Connector> {
        Arc::new(QuotaAwareConnector::new(inner, self.config))
    }

    fn name(&self) -> &'static str {
        "QuotaAwareConnector"
    }

    fn config_json(&self) -> serde_json::Value {
        let strategy = match self.config.strategy {
            QuotaConsumptionStrategy::EvenSpread => "EvenSpread",
            _ => "Burst",
        };
        serde_json::json!({
            "limit": self.config.limit,
            "window_ms": millis(self.config.window),
            "strategy": strategy,
        })
    }
}
