//! Mock connectors for CI-safe tests and demos.
//!
//! - [`MockConnector`]: deterministic synthetic series for any symbol and range.
//! - [`DynamicMockConnector`]: behavior driven per symbol from a controller,
//!   with scripted call sequences and a call log.
#![warn(missing_docs)]

use std::time::Duration;

use async_trait::async_trait;
use btcm7_core::connector::{Btcm7Connector, SeriesProvider};
use btcm7_core::{AssetClass, Btcm7Error, RawSeries, SeriesRequest, Ticker};

mod dynamic;
pub mod fixtures;

pub use dynamic::{DynamicMockConnector, DynamicMockController, MockBehavior};

/// Connector name reported by [`MockConnector`].
pub const MOCK_NAME: &str = "btcm7-mock";

/// Mock connector providing deterministic data from [`fixtures`].
///
/// A few symbols trigger canned failures:
/// `FAIL` (unavailable), `RATELIMIT` (rate limited), `UNKNOWN` (unknown
/// ticker), `TIMEOUT` (200 ms delay, then data), `EMPTY` (no observations).
pub struct MockConnector;

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnector {
    /// Create the mock.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    async fn maybe_fail_or_timeout(symbol: &str) -> Result<(), Btcm7Error> {
        match symbol {
            "FAIL" => Err(Btcm7Error::unavailable(MOCK_NAME, "forced failure")),
            "RATELIMIT" => Err(Btcm7Error::rate_limited(MOCK_NAME, Some(1_000))),
            "UNKNOWN" => Err(Btcm7Error::unknown_ticker(symbol)),
            "TIMEOUT" => {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Btcm7Connector for MockConnector {
    fn name(&self) -> &'static str {
        MOCK_NAME
    }

    fn vendor(&self) -> &'static str {
        "Mock"
    }

    fn supports_class(&self, _class: AssetClass) -> bool {
        true
    }

    fn as_series_provider(&self) -> Option<&dyn SeriesProvider> {
        Some(self as &dyn SeriesProvider)
    }
}

#[async_trait]
impl SeriesProvider for MockConnector {
    async fn series(&self, ticker: &Ticker, req: &SeriesRequest) -> Result<RawSeries, Btcm7Error> {
        Self::maybe_fail_or_timeout(ticker.symbol()).await?;
        let points = if ticker.symbol() == "EMPTY" {
            Vec::new()
        } else {
            fixtures::series_points(ticker.symbol(), ticker.class(), req)
        };
        RawSeries::new(ticker.clone(), points)
    }
}
