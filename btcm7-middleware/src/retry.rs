//! Bounded retry with exponential backoff for transient provider failures.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use btcm7_core::connector::{Btcm7Connector, SeriesProvider};
use btcm7_core::{Btcm7Error, Middleware, RawSeries, SeriesRequest, Ticker};
use btcm7_types::RetryConfig;
use rand::Rng;
use tokio::time::Instant;

/// Delay before retry number `retry` (1-based), before monotonic clamping.
///
/// `min_backoff_ms * factor^(retry-1)` capped at `max_backoff_ms`, plus up to
/// `jitter_percent` of random jitter, raised to at least `hint_ms` when the
/// provider supplied one.
#[must_use]
pub fn backoff_delay(cfg: &RetryConfig, retry: u32, hint_ms: Option<u64>) -> Duration {
    let exp = retry.saturating_sub(1);
    let base = u64::from(cfg.factor)
        .checked_pow(exp)
        .and_then(|m| cfg.min_backoff_ms.checked_mul(m))
        .unwrap_or(u64::MAX)
        .min(cfg.max_backoff_ms);
    let jitter_range = base.saturating_mul(u64::from(cfg.jitter_percent)) / 100;
    let jitter = if jitter_range == 0 {
        0
    } else {
        rand::rng().random_range(0..=jitter_range)
    };
    let ms = base.saturating_add(jitter).max(hint_ms.unwrap_or(0));
    Duration::from_millis(ms)
}

/// Connector wrapper that retries rate-limited and unavailable responses.
///
/// Non-retryable errors (unknown ticker, bad credentials, invalid data) are
/// returned on the first occurrence. Each attempt runs under
/// `attempt_timeout`; a timed-out attempt counts as `ProviderUnavailable`.
/// Delays inside one sequence never decrease.
pub struct RetryingConnector {
    inner: Arc<dyn Btcm7Connector>,
    config: RetryConfig,
}

impl RetryingConnector {
    /// Wrap `inner` with the given retry policy.
    pub const fn new(inner: Arc<dyn Btcm7Connector>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// Access the inner connector.
    pub fn inner(&self) -> &Arc<dyn Btcm7Connector> {
        &self.inner
    }

    async fn attempt(
        &self,
        inner: &dyn SeriesProvider,
        ticker: &Ticker,
        req: &SeriesRequest,
    ) -> Result<RawSeries, Btcm7Error> {
        match tokio::time::timeout(self.config.attempt_timeout, inner.series(ticker, req)).await {
            Ok(res) => res,
            Err(_) => Err(Btcm7Error::unavailable(
                self.inner.name(),
                format!(
                    "attempt timed out after {} ms",
                    self.config.attempt_timeout.as_millis()
                ),
            )),
        }
    }
}

#[async_trait]
impl Btcm7Connector for RetryingConnector {
    btcm7_core::btcm7_connector_delegate!(inner);
}

#[async_trait]
impl SeriesProvider for RetryingConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "btcm7::middleware::retry",
            skip_all,
            fields(symbol = %ticker),
        )
    )]
    async fn series(&self, ticker: &Ticker, req: &SeriesRequest) -> Result<RawSeries, Btcm7Error> {
        let inner = self
            .inner
            .as_series_provider()
            .ok_or_else(|| Btcm7Error::unavailable(self.inner.name(), "series not supported"))?;
        let started = Instant::now();
        let mut prev_delay = Duration::ZERO;
        let mut attempt = 1u32;
        loop {
            let err = match self.attempt(inner, ticker, req).await {
                Ok(series) => return Ok(series),
                Err(e) => e,
            };
            if !err.is_retryable() || attempt >= self.config.max_attempts {
                return Err(err);
            }
            let delay = backoff_delay(&self.config, attempt, err.retry_after_ms()).max(prev_delay);
            if started.elapsed() + delay > self.config.max_elapsed {
                #[cfg(feature = "tracing")]
                tracing::warn!(attempt, "retry budget exhausted");
                return Err(err);
            }
            #[cfg(feature = "tracing")]
            tracing::warn!(
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "retrying after transient failure"
            );
            tokio::time::sleep(delay).await;
            prev_delay = delay;
            attempt += 1;
        }
    }
}

/// Middleware config for constructing a [`RetryingConnector`].
pub struct RetryMiddleware {
    /// Retry policy.
    pub config: RetryConfig,
}

impl RetryMiddleware {
    /// Create a middleware from a retry configuration.
    #[must_use]
    pub const fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

impl Middleware for RetryMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn Btcm7Connector>) -> Arc<dyn Btcm7Connector> {
        Arc::new(RetryingConnector::new(inner, self.config))
    }

    fn name(&self) -> &'static str {
        "RetryingConnector"
    }

    fn config_json(&self) -> serde_json::Value {
        serde_json::json!({
            "max_attempts": self.config.max_attempts,
            "min_backoff_ms": self.config.min_backoff_ms,
            "max_backoff_ms": self.config.max_backoff_ms,
            "factor": self.config.factor,
            "jitter_percent": self.config.jitter_percent,
            "attempt_timeout_ms": u64::try_from(self.config.attempt_timeout.as_millis()).unwrap_or(u64::MAX),
            "max_elapsed_ms": u64::try_from(self.config.max_elapsed.as_millis()).unwrap_or(u64::MAX),
        })
    }
}
