//! Per-ticker fetches against the configured connector stack.

use std::sync::Arc;
use std::time::Duration;

use btcm7_core::connector::Btcm7Connector;
use btcm7_core::{Btcm7Error, Interval, RawSeries, SeriesRequest, Ticker};
use chrono::NaiveDate;

/// Fetches raw close series for one ticker at a time.
///
/// Throttling, retry and caching live in the connector's middleware stack;
/// this type validates the request and attributes failures to the ticker.
#[derive(Clone)]
pub struct MarketDataClient {
    connector: Arc<dyn Btcm7Connector>,
    interval: Interval,
}

impl MarketDataClient {
    /// Wrap a connector, requesting bars at `interval`.
    #[must_use]
    pub fn new(connector: Arc<dyn Btcm7Connector>, interval: Interval) -> Self {
        Self {
            connector,
            interval,
        }
    }

    /// The wrapped connector.
    #[must_use]
    pub fn connector(&self) -> &Arc<dyn Btcm7Connector> {
        &self.connector
    }

    /// Bar interval sent with every request.
    #[must_use]
    pub const fn interval(&self) -> Interval {
        self.interval
    }

    /// Fetch closes for `ticker` over the inclusive range `[start, end]`.
    ///
    /// # Errors
    /// `InvalidArg` when `start > end` (no request is issued); otherwise the
    /// connector's error after its retries are exhausted.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "btcm7::client::fetch",
            skip(self),
            fields(symbol = %ticker, start = %start, end = %end),
        )
    )]
    pub async fn fetch(
        &self,
        ticker: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawSeries, Btcm7Error> {
        let req = SeriesRequest::try_new(start, end, self.interval)?;
        self.fetch_request(ticker, &req).await
    }

    pub(crate) async fn fetch_request(
        &self,
        ticker: &Ticker,
        req: &SeriesRequest,
    ) -> Result<RawSeries, Btcm7Error> {
        if !self.connector.supports_class(ticker.class()) {
            return Err(Btcm7Error::InvalidConfig(format!(
                "connector {} does not serve {:?} tickers",
                self.connector.name(),
                ticker.class()
            )));
        }
        let provider = self.connector.as_series_provider().ok_or_else(|| {
            Btcm7Error::InvalidConfig(format!(
                "connector {} does not provide series",
                self.connector.name()
            ))
        })?;
        let series = provider.series(ticker, req).await?;
        if series.ticker().symbol() != ticker.symbol() {
            return Err(Btcm7Error::Data(format!(
                "requested {ticker} but {} returned {}",
                self.connector.name(),
                series.ticker()
            )));
        }
        Ok(series)
    }

    /// [`MarketDataClient::fetch_request`] bounded by `timeout`; expiry is
    /// reported as the connector being unavailable.
    pub(crate) async fn fetch_with_timeout(
        &self,
        ticker: &Ticker,
        req: &SeriesRequest,
        timeout: Duration,
    ) -> Result<RawSeries, Btcm7Error> {
        tokio::time::timeout(timeout, self.fetch_request(ticker, req))
            .await
            .unwrap_or_else(|_| {
                Err(Btcm7Error::unavailable(
                    self.connector.name(),
                    format!(
                        "no response for {ticker} within {} ms",
                        timeout.as_millis()
                    ),
                ))
            })
    }
}
