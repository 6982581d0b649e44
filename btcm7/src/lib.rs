//! btcm7 computes a relative-strength indicator of Bitcoin against the
//! "Magnificent Seven" equity basket.
//!
//! Overview
//! - Fetches daily (or weekly/monthly) closes for every ticker through one
//!   connector stack, concurrently and bounded by `max_concurrency`.
//! - Aligns the series onto a common day index (forward fill across weekends
//!   and holidays by default, or strict intersection).
//! - Computes the weighted basket, the ratio index (100 = parity), momentum
//!   spreads, the rolling Z-score of the ratio and a summary signal.
//! - Publishes each successful refresh as an immutable [`Snapshot`]; the
//!   [`Monitor`] keeps the current one, a bounded history and the last error.
//!
//! Key behaviors and trade-offs
//! - A refresh is all-or-nothing: any ticker failing after retries fails the
//!   refresh, and a monitor keeps showing the previous snapshot.
//! - Throttling, retry and caching belong to the connector stack
//!   (`btcm7_middleware::ConnectorBuilder`), so the orchestrator works the
//!   same against the HTTP connector and the mocks.
//! - Forward fill keeps BTC's weekend observations usable at the cost of
//!   repeating the last equity close; `GapPolicy::Intersection` avoids filled
//!   cells but discards weekends entirely.
//!
//! Examples
//! ```rust,ignore
//! use std::sync::Arc;
//! use btcm7::{Btcm7, Btcm7Settings, Monitor};
//! use btcm7_middleware::ConnectorBuilder;
//! use btcm7_twelvedata::TwelveDataConnector;
//!
//! let mut settings = Btcm7Settings::from_env()?;
//! let raw = Arc::new(TwelveDataConnector::new_raw(settings.take_api_key()?)?);
//! let connector = ConnectorBuilder::standard(
//!     raw,
//!     &settings.cache_config(),
//!     &settings.retry_config(),
//!     &settings.quota_config(),
//! )
//! .build();
//!
//! let monitor = Monitor::new(
//!     Btcm7::builder()
//!         .with_connector(connector)
//!         .tickers(settings.ticker_set()?)
//!         .config(settings.btcm7_config())
//!         .build()?,
//! );
//! let snapshot = monitor.refresh().await?;
//! println!("{} ratio={:.2}", snapshot.signal(), snapshot.latest().ratio);
//! ```
#![warn(missing_docs)]

mod client;
pub(crate) mod core;
mod monitor;
mod router;
mod settings;
mod snapshot;

pub use client::MarketDataClient;
pub use core::{Btcm7, Btcm7Builder};
pub use monitor::{Monitor, RefreshFailure};
pub use router::util::{collapse_errors, join_with_deadline};
pub use settings::{Btcm7Settings, Weighting};
pub use snapshot::Snapshot;

// Re-export core types for convenience
pub use btcm7_core::{
    AlignConfig, AlignedTable, AssetClass, BasketWeights, Btcm7Config, Btcm7Connector,
    Btcm7Error, CacheConfig, ConstituentChange, DEFAULT_BTC_SYMBOL, GapPolicy, IndicatorConfig,
    IndicatorRow, Indicators, Interval, LatestMetrics, M7_CONSTITUENTS, Period, QuotaConfig,
    RawSeries, RetryConfig, Signal, SignalConfig, Ticker, TickerSet,
};
pub use btcm7_middleware::{CacheMiddleware, ConnectorBuilder, QuotaMiddleware, RetryMiddleware};
